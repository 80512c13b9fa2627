use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::io::AsyncWriteExt;

use super::naming::stored_name;
use super::sniff::{sniff, MediaCategory, Signature};
use crate::clock::{Clock, SystemClock};

/// 100 MiB, enough for short clinic videos.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("unsupported media: {0}")]
    UnsupportedMedia(String),

    #[error("file too large: {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },

    #[error("upload storage failed: {0}")]
    Persistence(String),
}

/// A file as received from a form field.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredUpload {
    /// Public URL path, e.g. `/uploads/scan_1700000000000.webp`.
    pub url: String,
    pub file_name: String,
    pub size: u64,
    pub content_type: &'static str,
}

/// Anything that can turn an uploaded file into a durable URL.
#[async_trait]
pub trait MediaUploader: Send + Sync {
    async fn upload_file(&self, file: &UploadFile) -> Result<StoredUpload, UploadError>;
}

/// Stores uploaded images and videos in a directory served statically.
pub struct UploadService {
    dir: PathBuf,
    url_prefix: String,
    max_bytes: u64,
    clock: Arc<dyn Clock>,
}

impl UploadService {
    pub fn new(dir: impl Into<PathBuf>, url_prefix: &str, max_bytes: u64) -> Self {
        Self {
            dir: dir.into(),
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
            max_bytes,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Apply the size and media-type policy without storing anything.
    ///
    /// The declared type must be `image/*` or `video/*` and the bytes must
    /// carry a signature of the same category.
    pub fn check(&self, bytes: &[u8], declared_mime: &str) -> Result<Signature, UploadError> {
        let size = bytes.len() as u64;
        if size > self.max_bytes {
            return Err(UploadError::TooLarge {
                size,
                limit: self.max_bytes,
            });
        }
        let declared = MediaCategory::of_declared(declared_mime).ok_or_else(|| {
            UploadError::UnsupportedMedia(format!(
                "only image or video uploads are allowed, got {declared_mime:?}"
            ))
        })?;
        let signature = sniff(bytes).ok_or_else(|| {
            UploadError::UnsupportedMedia("file content is not a recognized image or video".into())
        })?;
        if signature.category != declared {
            return Err(UploadError::UnsupportedMedia(format!(
                "declared {declared_mime} but content is {}",
                signature.mime
            )));
        }
        Ok(signature)
    }

    pub async fn upload(
        &self,
        bytes: &[u8],
        original_filename: &str,
        declared_mime: &str,
    ) -> Result<StoredUpload, UploadError> {
        let signature = match self.check(bytes, declared_mime) {
            Ok(signature) => signature,
            Err(e) => {
                tracing::warn!(file = original_filename, error = %e, "upload rejected");
                return Err(e);
            }
        };

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| UploadError::Persistence(format!("mkdir {}: {e}", self.dir.display())))?;

        let file_name = stored_name(original_filename, self.clock.now_millis());
        let path = self.dir.join(&file_name);
        write_new(&path, bytes).await?;

        tracing::info!(
            file = %file_name,
            size = bytes.len(),
            content_type = signature.mime,
            "upload stored"
        );
        Ok(StoredUpload {
            url: format!("{}/{}", self.url_prefix, file_name),
            file_name,
            size: bytes.len() as u64,
            content_type: signature.mime,
        })
    }
}

#[async_trait]
impl MediaUploader for UploadService {
    async fn upload_file(&self, file: &UploadFile) -> Result<StoredUpload, UploadError> {
        self.upload(&file.bytes, &file.file_name, &file.content_type)
            .await
    }
}

/// Create `path` (never overwriting) and write `bytes`; a partial file is
/// removed on failure.
async fn write_new(path: &Path, bytes: &[u8]) -> Result<(), UploadError> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
        .map_err(|e| UploadError::Persistence(format!("create {}: {e}", path.display())))?;
    let written = async {
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await
    }
    .await;
    if let Err(e) = written {
        drop(file);
        let _ = tokio::fs::remove_file(path).await;
        return Err(UploadError::Persistence(format!(
            "write {}: {e}",
            path.display()
        )));
    }
    Ok(())
}
