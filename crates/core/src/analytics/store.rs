use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::counters::AnalyticsCounters;

#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error("analytics storage failed: {0}")]
    Storage(String),

    #[error("analytics data is corrupt: {0}")]
    Corrupt(String),
}

/// Where the aggregator keeps its counters between calls.
///
/// `load` returns `None` until something has been stored, which is the
/// "uninitialized" state.
#[async_trait]
pub trait AnalyticsStore: Send + Sync {
    async fn load(&self) -> Result<Option<AnalyticsCounters>, AnalyticsError>;
    async fn save(&self, counters: &AnalyticsCounters) -> Result<(), AnalyticsError>;
    async fn clear(&self) -> Result<(), AnalyticsError>;
}

/// Counters held in process memory; one isolated instance per test.
#[derive(Debug, Default)]
pub struct MemoryAnalyticsStore {
    counters: Mutex<Option<AnalyticsCounters>>,
}

impl MemoryAnalyticsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AnalyticsStore for MemoryAnalyticsStore {
    async fn load(&self) -> Result<Option<AnalyticsCounters>, AnalyticsError> {
        Ok(self.counters.lock().await.clone())
    }

    async fn save(&self, counters: &AnalyticsCounters) -> Result<(), AnalyticsError> {
        *self.counters.lock().await = Some(counters.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), AnalyticsError> {
        *self.counters.lock().await = None;
        Ok(())
    }
}

/// Counters persisted as a small JSON file.
#[derive(Debug)]
pub struct JsonFileAnalyticsStore {
    path: PathBuf,
}

impl JsonFileAnalyticsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl AnalyticsStore for JsonFileAnalyticsStore {
    async fn load(&self) -> Result<Option<AnalyticsCounters>, AnalyticsError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AnalyticsError::Storage(format!(
                    "read {}: {e}",
                    self.path.display()
                )))
            }
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| AnalyticsError::Corrupt(format!("{}: {e}", self.path.display())))
    }

    async fn save(&self, counters: &AnalyticsCounters) -> Result<(), AnalyticsError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| AnalyticsError::Storage(format!("mkdir {}: {e}", dir.display())))?;
        }
        let bytes =
            serde_json::to_vec(counters).map_err(|e| AnalyticsError::Storage(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        let written = match tokio::fs::write(&tmp, bytes).await {
            Ok(()) => tokio::fs::rename(&tmp, &self.path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(AnalyticsError::Storage(format!(
                "write {}: {e}",
                self.path.display()
            )));
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), AnalyticsError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AnalyticsError::Storage(format!(
                "remove {}: {e}",
                self.path.display()
            ))),
        }
    }
}
