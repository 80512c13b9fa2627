pub mod backends;
pub mod defaults;
pub mod icon;
pub mod listing;
pub mod model;
pub mod store;

pub use backends::{BlobBackend, FallbackBackend, LocalFileBackend, MemoryBackend};
pub use icon::Icon;
pub use model::{Article, ArticleCategory, ContentDocument, MediaItem, MediaKind, MediaType};
pub use store::{ArticleSource, ContentBackend, ContentStore, StoreError};
