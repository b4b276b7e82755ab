use axum::http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};

/// CORS layer from a comma-separated origin list.
///
/// `None`, or a list with no parsable origin, allows any origin.
pub fn cors_layer(allowed_origins: Option<&str>) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .unwrap_or_default()
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .filter(|v: &HeaderValue| !v.is_empty())
        .collect();

    let cors = CorsLayer::new().allow_headers(Any).allow_methods(Any);
    if origins.is_empty() {
        // Wildcard; set KIRA_CORS_ORIGINS in production.
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(origins)
    }
}
