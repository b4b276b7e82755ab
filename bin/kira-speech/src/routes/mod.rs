//! Axum router construction for the speech service.

pub mod doc;
pub mod transcribe;
pub mod tts;

use std::sync::Arc;

use axum::{middleware, Router};
use kira_web::middleware::{cors_layer, trace_middleware};
use utoipa_swagger_ui::SwaggerUi;

use crate::state::AppState;

/// Build the complete Axum [`Router`] for the speech service.
pub fn build(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .merge(kira_web::health::router::<Arc<AppState>>())
        .merge(transcribe::router(state.config.max_upload_bytes()))
        .merge(tts::router());

    if state.config.enable_swagger {
        app = app.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", doc::get_docs()));
    }

    app.layer(cors_layer(state.config.cors_allowed_origins.as_deref()))
        .layer(middleware::from_fn(trace_middleware))
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    use kira_core::services::{Synthesizer, Transcoder, Transcriber};

    use crate::config::Config;
    use crate::state::AppState;

    pub fn config(scratch_dir: &Path) -> Config {
        Config {
            bind_address: "127.0.0.1:0".into(),
            log_level: "info".into(),
            log_json: false,
            log_dir: None,
            cors_allowed_origins: None,
            enable_swagger: false,
            scratch_dir: scratch_dir.to_path_buf(),
            max_upload_size_mb: 1,
            ffmpeg_bin: "ffmpeg".into(),
            transcode_timeout: Duration::from_secs(5),
            stt_base_url: "http://127.0.0.1:9".into(),
            stt_api_key: None,
            stt_model: "base".into(),
            tts_base_url: "http://127.0.0.1:9".into(),
        }
    }

    pub fn state(
        scratch_dir: &Path,
        transcoder: Arc<dyn Transcoder>,
        transcriber: Arc<dyn Transcriber>,
        synthesizer: Arc<dyn Synthesizer>,
    ) -> Arc<AppState> {
        Arc::new(AppState {
            config: Arc::new(config(scratch_dir)),
            transcoder,
            transcriber,
            synthesizer,
        })
    }
}
