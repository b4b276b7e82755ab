//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use kira_core::ChatReplyPipeline;

use crate::config::Config;

#[derive(Debug, Clone)]
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    pub pipeline: Arc<ChatReplyPipeline>,
}
