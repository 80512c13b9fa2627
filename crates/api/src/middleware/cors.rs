use axum::http::{header, HeaderName, Method};
use tower_http::cors::{Any, CorsLayer};

/// Any origin, the methods the admin panel uses and its request headers.
/// Credentials are not allowed; browsers reject them with a wildcard origin.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::OPTIONS,
            Method::PATCH,
            Method::DELETE,
            Method::POST,
            Method::PUT,
        ])
        .allow_headers([
            HeaderName::from_static("x-csrf-token"),
            HeaderName::from_static("x-requested-with"),
            header::ACCEPT,
            HeaderName::from_static("accept-version"),
            header::CONTENT_LENGTH,
            HeaderName::from_static("content-md5"),
            header::CONTENT_TYPE,
            header::DATE,
            HeaderName::from_static("x-api-version"),
        ])
}
