//! kira-speech – speech service entry point.
//!
//! Startup order:
//! 1. Parse configuration from environment variables.
//! 2. Initialise structured tracing.
//! 3. Prepare the scratch directory and the ffmpeg, Whisper and TTS clients.
//! 4. Build the Axum router and serve with graceful shutdown.

mod config;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use kira_core::services::{FfmpegTranscoder, GoogleTts, HttpTranscriber};
use kira_web::telemetry::{self, LogSettings};
use tracing::info;

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Configuration ───────────────────────────────────────────────────────
    let cfg = Config::from_env();

    // ── 2. Tracing ─────────────────────────────────────────────────────────────
    let _log_guard = telemetry::init(&LogSettings {
        service: "kira-speech",
        level: cfg.log_level.clone(),
        json: cfg.log_json,
        dir: cfg.log_dir.clone(),
    });
    info!(version = env!("CARGO_PKG_VERSION"), "kira-speech starting");

    // ── 3. Scratch directory and collaborators ─────────────────────────────────
    tokio::fs::create_dir_all(&cfg.scratch_dir)
        .await
        .with_context(|| format!("failed to create scratch directory {}", cfg.scratch_dir.display()))?;

    let transcoder = FfmpegTranscoder::new()
        .with_program(&cfg.ffmpeg_bin)
        .with_timeout(cfg.transcode_timeout);
    let transcriber = HttpTranscriber::new()
        .with_base_url(&cfg.stt_base_url)
        .with_api_key(cfg.stt_api_key.clone())
        .with_model(&cfg.stt_model);
    let synthesizer = GoogleTts::new().with_base_url(&cfg.tts_base_url);
    info!(
        scratch_dir = %cfg.scratch_dir.display(),
        ffmpeg = %cfg.ffmpeg_bin,
        stt = %cfg.stt_base_url,
        stt_model = %cfg.stt_model,
        max_upload_mb = cfg.max_upload_size_mb,
        "speech collaborators ready"
    );

    let state = Arc::new(AppState {
        config: Arc::new(cfg.clone()),
        transcoder: Arc::new(transcoder),
        transcriber: Arc::new(transcriber),
        synthesizer: Arc::new(synthesizer),
    });

    // ── 4. HTTP server with graceful shutdown ──────────────────────────────────
    let app = routes::build(Arc::clone(&state));
    let addr: SocketAddr = cfg.bind_address.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(kira_web::shutdown_signal())
        .await?;

    info!("kira-speech stopped");
    Ok(())
}
