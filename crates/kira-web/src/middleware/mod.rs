//! HTTP middleware stack: request tracing and CORS.

pub mod cors;
pub mod trace;

pub use cors::cors_layer;
pub use trace::{trace_middleware, X_TRACE_ID};
