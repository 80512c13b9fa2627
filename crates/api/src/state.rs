use std::sync::Arc;

use clinic_site_core::analytics::{AnalyticsAggregator, JsonFileAnalyticsStore};
use clinic_site_core::content::{
    BlobBackend, ContentBackend, ContentStore, FallbackBackend, LocalFileBackend,
};
use clinic_site_core::events::EventBus;
use clinic_site_core::upload::UploadService;

use crate::config::AppConfig;

/// Shared application state, passed to all handlers via Axum's `State` extractor.
/// Wrapped in `Arc` so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    config: AppConfig,
    content: ContentStore,
    uploads: UploadService,
    analytics: Arc<AnalyticsAggregator>,
    event_bus: EventBus,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        content: ContentStore,
        uploads: UploadService,
        analytics: Arc<AnalyticsAggregator>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            inner: Arc::new(InnerState {
                config,
                content,
                uploads,
                analytics,
                event_bus,
            }),
        }
    }

    /// Wire the stores described by `config`: the local content file, or a
    /// blob store that falls back to it.
    pub fn from_config(config: AppConfig, event_bus: EventBus) -> Self {
        let local: Arc<dyn ContentBackend> = Arc::new(LocalFileBackend::new(&config.content_file));
        let backend: Arc<dyn ContentBackend> = match &config.blob {
            Some(blob) => Arc::new(FallbackBackend::new(
                Arc::new(BlobBackend::new(&blob.url, &blob.content_key, blob.token.clone())),
                local,
            )),
            None => local,
        };
        let uploads = UploadService::new(
            &config.upload_dir,
            &config.upload_url_prefix,
            config.max_upload_bytes,
        );
        let analytics = Arc::new(AnalyticsAggregator::new(Arc::new(
            JsonFileAnalyticsStore::new(&config.analytics_file),
        )));
        Self::new(
            config,
            ContentStore::new(backend),
            uploads,
            analytics,
            event_bus,
        )
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn content(&self) -> &ContentStore {
        &self.inner.content
    }

    pub fn uploads(&self) -> &UploadService {
        &self.inner.uploads
    }

    pub fn analytics(&self) -> &Arc<AnalyticsAggregator> {
        &self.inner.analytics
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.inner.event_bus
    }
}
