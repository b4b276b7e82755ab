//! Axum router construction.
//!
//! [`build`] assembles the health route, `POST /kira`, the optional Swagger
//! UI (disable with `KIRA_ENABLE_SWAGGER=false`) and the CORS and trace
//! layers.

pub mod doc;
pub mod kira;

use std::sync::Arc;

use axum::{middleware, Router};
use kira_web::middleware::{cors_layer, trace_middleware};
use utoipa_swagger_ui::SwaggerUi;

use crate::state::AppState;

/// Build the complete Axum [`Router`] for the chat-reply service.
pub fn build(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .merge(kira_web::health::router::<Arc<AppState>>())
        .merge(kira::router());

    if state.config.enable_swagger {
        app = app.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", doc::get_docs()));
    }

    app.layer(cors_layer(state.config.cors_allowed_origins.as_deref()))
        .layer(middleware::from_fn(trace_middleware))
        .with_state(state)
}
