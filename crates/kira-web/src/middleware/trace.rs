use std::time::Instant;

use axum::body::{Body, HttpBody};
use axum::extract::Request;
use axum::http::{header, HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use http_body_util::BodyExt;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

pub static X_TRACE_ID: &str = "x-trace-id";

/// JSON bodies up to this size are logged in full.
const MAX_LOGGED_BODY: u64 = 1024;

/// Per-request span with a trace id.
///
/// Reuses an incoming `x-trace-id` when it is a UUID, otherwise generates
/// one; the id is forwarded to the handler and echoed on the response.
/// Uploads and audio payloads stream through untouched.
pub async fn trace_middleware(req: Request, next: Next) -> Response {
    let start_time = Instant::now();

    let trace_id = req
        .headers()
        .get(X_TRACE_ID)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);
    let trace_header = HeaderValue::from_str(&trace_id.to_string()).ok();

    let span = info_span!(
        "http_request",
        trace_id = %trace_id,
        method = %req.method(),
        path = %req.uri().path(),
    );

    async move {
        info!("→ request started");

        let (mut parts, body) = req.into_parts();
        let body = log_body("request", &parts.headers, body).await;
        if let Some(value) = &trace_header {
            parts.headers.insert(X_TRACE_ID, value.clone());
        }

        let response = next.run(Request::from_parts(parts, body)).await;

        let (mut parts, body) = response.into_parts();
        let body = log_body("response", &parts.headers, body).await;
        if let Some(value) = trace_header {
            parts.headers.insert(X_TRACE_ID, value);
        }
        let response = Response::from_parts(parts, body);

        info!(
            status = response.status().as_u16(),
            latency_ms = start_time.elapsed().as_millis(),
            "← response finished"
        );
        response
    }
    .instrument(span)
    .await
}

/// Log a small JSON body in full; describe anything else by type and size.
async fn log_body(direction: &str, headers: &HeaderMap, body: Body) -> Body {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let size = body.size_hint().exact();

    match size {
        Some(0) => body,
        Some(len) if content_type.contains("application/json") && len <= MAX_LOGGED_BODY => {
            match body.collect().await {
                Ok(collected) => {
                    let bytes = collected.to_bytes();
                    if let Ok(text) = std::str::from_utf8(&bytes) {
                        info!("{direction} body: {text}");
                    }
                    Body::from(bytes)
                }
                Err(e) => {
                    warn!(error = %e, "failed to buffer {direction} body");
                    Body::empty()
                }
            }
        }
        _ => {
            let size = size.map_or_else(|| "unknown".to_owned(), |n| n.to_string());
            info!("{direction} body: [skipped: type={content_type}, size={size}]");
            body
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
