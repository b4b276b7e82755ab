//! kira-server – chat-reply service entry point.
//!
//! Startup order:
//! 1. Parse configuration from environment variables.
//! 2. Initialise structured tracing.
//! 3. Build the translator and chat model clients and the reply pipeline.
//! 4. Build the Axum router and serve with graceful shutdown.

mod config;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use kira_core::services::{LingoTranslator, OpenAiChat};
use kira_core::{ChatReplyPipeline, ExchangeLog};
use kira_web::telemetry::{self, LogSettings};
use tracing::{info, warn};

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Configuration ───────────────────────────────────────────────────────
    let cfg = Config::from_env();

    // ── 2. Tracing ─────────────────────────────────────────────────────────────
    let _log_guard = telemetry::init(&LogSettings {
        service: "kira-server",
        level: cfg.log_level.clone(),
        json: cfg.log_json,
        dir: cfg.log_dir.clone(),
    });
    info!(version = env!("CARGO_PKG_VERSION"), "kira-server starting");

    // ── 3. Collaborators ───────────────────────────────────────────────────────
    if cfg.lingo_api_key.is_empty() {
        warn!("LINGODOTDEV_API_KEY is not set; translation requests will be rejected upstream");
    }
    let translator = LingoTranslator::new(cfg.lingo_api_key.clone()).with_base_url(&cfg.lingo_base_url);
    let chat = OpenAiChat::new()
        .with_base_url(&cfg.chat_base_url)
        .with_api_key(cfg.chat_api_key.clone())
        .with_model(&cfg.chat_model)
        .with_temperature(cfg.chat_temperature)
        .with_max_tokens(cfg.chat_max_tokens);
    info!(
        model = chat.model(),
        pivot = %cfg.pivot_locale,
        exchange_log = %cfg.exchange_log.display(),
        "reply pipeline ready"
    );

    let pipeline = ChatReplyPipeline::new(
        Arc::new(translator),
        Arc::new(chat),
        ExchangeLog::new(&cfg.exchange_log),
    )
    .with_pivot_locale(&cfg.pivot_locale);

    let state = Arc::new(AppState {
        config: Arc::new(cfg.clone()),
        pipeline: Arc::new(pipeline),
    });

    // ── 4. HTTP server with graceful shutdown ──────────────────────────────────
    let app = routes::build(Arc::clone(&state));
    let addr: SocketAddr = cfg.bind_address.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(kira_web::shutdown_signal())
        .await?;

    info!("kira-server stopped");
    Ok(())
}
