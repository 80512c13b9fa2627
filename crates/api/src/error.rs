use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use clinic_site_core::analytics::AnalyticsError;
use clinic_site_core::content::StoreError;
use clinic_site_core::upload::UploadError;
use serde_json::json;

/// API error type rendered as a JSON error envelope.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("unsupported media type: {0}")]
    UnsupportedMedia(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("upload error: {0}")]
    Upload(#[from] UploadError),

    #[error("analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
}

fn internal(what: &str, err: &dyn std::fmt::Display) -> (StatusCode, &'static str, String) {
    tracing::error!("{what}: {err}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "internalError",
        "An internal error occurred".to_string(),
    )
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "notFound", msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "badRequest", msg.clone()),
            ApiError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "payloadTooLarge", msg.clone())
            }
            ApiError::UnsupportedMedia(msg) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "unsupportedMediaType",
                msg.clone(),
            ),
            ApiError::Internal(msg) => internal("Internal error", msg),
            ApiError::Store(StoreError::NotFound(_)) => (
                StatusCode::NOT_FOUND,
                "notFound",
                "Content file not found".to_string(),
            ),
            ApiError::Store(err) => internal("Content store error", err),
            ApiError::Upload(UploadError::TooLarge { .. }) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "payloadTooLarge",
                self.to_string(),
            ),
            ApiError::Upload(UploadError::UnsupportedMedia(msg)) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "unsupportedMediaType",
                msg.clone(),
            ),
            ApiError::Upload(err) => internal("Upload storage error", err),
            ApiError::Analytics(err) => internal("Analytics error", err),
        };

        let body = json!({
            "error": {
                "type": error_type,
                "message": message,
                "statusCode": status.as_u16(),
            }
        });

        (status, Json(body)).into_response()
    }
}

/// Convenience type alias for route handlers.
pub type ApiResult<T> = Result<T, ApiError>;
