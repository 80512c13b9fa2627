pub mod naming;
pub mod service;
pub mod sniff;

pub use service::{
    MediaUploader, StoredUpload, UploadError, UploadFile, UploadService, DEFAULT_MAX_UPLOAD_BYTES,
};
pub use sniff::{sniff, MediaCategory, Signature};
