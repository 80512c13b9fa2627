use axum::{
    extract::{DefaultBodyLimit, State},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use clinic_site_core::content::listing::{featured_articles, ordered_media};
use clinic_site_core::content::{Article, ContentDocument, MediaItem};
use clinic_site_core::events::{ContentSavedEvent, SiteEvent};
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::state::AppState;

/// Saved documents may carry inline previews, so allow more than the
/// default body size.
const CONTENT_BODY_LIMIT: usize = 16 * 1024 * 1024;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/content",
            get(get_content)
                .post(save_content)
                .layer(DefaultBodyLimit::max(CONTENT_BODY_LIMIT)),
        )
        .route("/api/articles", get(list_articles))
        .route("/api/articles/featured", get(list_featured_articles))
        .route("/api/media", get(list_media))
}

/// The whole document, every missing section filled from defaults.
async fn get_content(State(state): State<AppState>) -> ApiResult<Json<ContentDocument>> {
    Ok(Json(state.content().load().await?))
}

/// Replace the whole document.
async fn save_content(
    State(state): State<AppState>,
    Json(doc): Json<ContentDocument>,
) -> ApiResult<Json<Value>> {
    state.content().save(&doc).await?;
    state
        .event_bus()
        .publish(SiteEvent::ContentSaved(ContentSavedEvent {
            backend: state.content().backend_tag().to_string(),
            articles: doc.articles.len(),
            media: doc.media.len(),
            timestamp: Utc::now(),
        }));
    Ok(Json(json!({
        "success": true,
        "message": "Content saved successfully",
    })))
}

/// All articles, or `[]` when nothing was saved yet.
async fn list_articles(State(state): State<AppState>) -> ApiResult<Json<Vec<Article>>> {
    Ok(Json(state.content().articles().await?))
}

async fn list_featured_articles(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Article>>> {
    let articles = state.content().articles().await?;
    Ok(Json(
        featured_articles(&articles).into_iter().cloned().collect(),
    ))
}

/// Media appearances in display order.
async fn list_media(State(state): State<AppState>) -> ApiResult<Json<Vec<MediaItem>>> {
    let media = match state.content().load().await {
        Ok(doc) => doc.media,
        Err(e) if e.is_not_found() => Vec::new(),
        Err(e) => return Err(e.into()),
    };
    Ok(Json(ordered_media(&media).into_iter().cloned().collect()))
}
