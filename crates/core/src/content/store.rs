use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::defaults::merge_with_defaults;
use super::model::{Article, ContentDocument};

/// Errors raised by content backends and the store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No document has ever been saved (or no source could provide one).
    #[error("content not found: {0}")]
    NotFound(String),

    /// The backing location could not be read or written.
    #[error("persistence failed: {0}")]
    Persistence(String),

    /// A document was found but is not valid content JSON.
    #[error("malformed content document: {0}")]
    Malformed(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// A place where the serialized content document lives.
#[async_trait]
pub trait ContentBackend: Send + Sync + 'static {
    fn backend_tag(&self) -> &'static str {
        "unknown"
    }

    /// Read the stored bytes. `StoreError::NotFound` when nothing was saved.
    async fn get(&self) -> Result<Vec<u8>, StoreError>;

    /// Replace the stored bytes entirely.
    async fn put(&self, bytes: Vec<u8>) -> Result<(), StoreError>;
}

/// Reads and writes the whole content document.
///
/// Saving is a full overwrite with no read-modify-write and no retry. Two
/// concurrent saves are not ordered: whichever write finishes last is what
/// the next `load` sees.
#[derive(Clone)]
pub struct ContentStore {
    backend: Arc<dyn ContentBackend>,
}

impl ContentStore {
    pub fn new(backend: Arc<dyn ContentBackend>) -> Self {
        Self { backend }
    }

    pub fn backend_tag(&self) -> &'static str {
        self.backend.backend_tag()
    }

    /// Load the document, filling every absent section from its default.
    pub async fn load(&self) -> Result<ContentDocument, StoreError> {
        let raw = self.load_raw().await?;
        merge_with_defaults(raw).map_err(|e| StoreError::Malformed(e.to_string()))
    }

    /// Load the stored JSON without merging defaults.
    pub async fn load_raw(&self) -> Result<Value, StoreError> {
        let bytes = self.backend.get().await?;
        serde_json::from_slice(&bytes).map_err(|e| StoreError::Malformed(e.to_string()))
    }

    pub async fn save(&self, doc: &ContentDocument) -> Result<(), StoreError> {
        let bytes = to_pretty_json(doc)?;
        self.backend.put(bytes).await?;
        tracing::info!(
            backend = self.backend_tag(),
            articles = doc.articles.len(),
            media = doc.media.len(),
            "content document saved"
        );
        Ok(())
    }

    /// The `articles` array of the current document, or empty when nothing
    /// has been saved yet.
    pub async fn articles(&self) -> Result<Vec<Article>, StoreError> {
        match self.load().await {
            Ok(doc) => Ok(doc.articles),
            Err(StoreError::NotFound(_)) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    /// Store the checked-in default document if nothing was saved yet.
    /// Returns whether the seed was written.
    pub async fn seed_from(&self, path: &Path) -> Result<bool, StoreError> {
        match self.backend.get().await {
            Ok(_) => return Ok(false),
            Err(StoreError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| StoreError::NotFound(format!("seed {}: {e}", path.display())))?;
        let raw: Value =
            serde_json::from_slice(&bytes).map_err(|e| StoreError::Malformed(e.to_string()))?;
        let doc = merge_with_defaults(raw).map_err(|e| StoreError::Malformed(e.to_string()))?;
        self.save(&doc).await?;
        tracing::info!(seed = %path.display(), "content store seeded");
        Ok(true)
    }
}

/// The source of the live article list, used by the analytics summary.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    async fn current_articles(&self) -> Vec<Article>;
}

#[async_trait]
impl ArticleSource for ContentStore {
    async fn current_articles(&self) -> Vec<Article> {
        match self.articles().await {
            Ok(articles) => articles,
            Err(e) => {
                tracing::warn!(error = %e, "could not read articles for analytics");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl ArticleSource for Vec<Article> {
    async fn current_articles(&self) -> Vec<Article> {
        self.clone()
    }
}

/// Serialize a document the way it is written to disk: pretty JSON.
pub fn to_pretty_json(doc: &ContentDocument) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec_pretty(doc).map_err(|e| StoreError::Persistence(e.to_string()))
}
