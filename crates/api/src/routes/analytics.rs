use axum::{extract::State, routing::get, routing::post, Json, Router};
use clinic_site_core::analytics::AnalyticsSummary;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/analytics", get(summary).delete(reset))
        .route("/api/analytics/events", post(track))
        .route("/api/analytics/sample", post(seed_sample))
}

/// A site interaction reported by the front end.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum TrackEvent {
    PageView { path: String },
    Visitor,
    ArticleView { article_id: String },
    MediaView { media_id: String, title: String },
    ContactForm { name: String, email: String },
    NewArticle { title: String },
    MediaUpload { file_name: String },
}

async fn summary(State(state): State<AppState>) -> ApiResult<Json<AnalyticsSummary>> {
    Ok(Json(state.analytics().summary(state.content()).await?))
}

async fn track(
    State(state): State<AppState>,
    Json(event): Json<TrackEvent>,
) -> ApiResult<Json<Value>> {
    let analytics = state.analytics();
    match &event {
        TrackEvent::PageView { path } => analytics.track_page_view(path).await?,
        TrackEvent::Visitor => analytics.track_visitor().await?,
        TrackEvent::ArticleView { article_id } => {
            analytics.track_article_view(article_id).await?
        }
        TrackEvent::MediaView { media_id, title } => {
            analytics.track_media_view(media_id, title).await?
        }
        TrackEvent::ContactForm { name, email } => {
            analytics.track_contact_form(name, email).await?
        }
        TrackEvent::NewArticle { title } => analytics.track_new_article(title).await?,
        TrackEvent::MediaUpload { file_name } => analytics.track_media_upload(file_name).await?,
    }
    tracing::debug!(?event, "analytics event recorded");
    Ok(Json(json!({ "success": true })))
}

async fn reset(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    state.analytics().reset().await?;
    Ok(Json(json!({ "success": true })))
}

async fn seed_sample(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    state.analytics().seed_sample_data().await?;
    Ok(Json(json!({ "success": true })))
}
