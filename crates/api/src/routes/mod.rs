pub mod analytics;
pub mod content;
pub mod events;
pub mod health;
pub mod upload;

use axum::Router;
use tower_http::services::ServeDir;

use crate::state::AppState;

/// Assemble the full router with all route groups. Uploaded files are served
/// statically under the configured prefix.
pub fn build_router(state: AppState) -> Router {
    let config = state.config().clone();
    Router::new()
        .merge(health::routes())
        .merge(content::routes())
        .merge(upload::routes(config.max_upload_bytes))
        .merge(analytics::routes())
        .merge(events::routes())
        .nest_service(&config.upload_url_prefix, ServeDir::new(&config.upload_dir))
        .with_state(state)
}
