//! Speech service configuration, loaded from environment variables at startup.

use std::path::PathBuf;
use std::time::Duration;

use kira_core::services::{ffmpeg, tts, whisper};
use kira_web::env::{env_flag, env_opt, env_or, parse_env};

/// Runtime configuration for kira-speech.
///
/// Every field has a default so the service starts without any environment
/// variables set, expecting ffmpeg on `PATH` and a Whisper server on
/// `127.0.0.1:8000`.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:5002"`).
    pub bind_address: String,

    pub log_level: String,
    pub log_json: bool,
    pub log_dir: Option<PathBuf>,

    pub cors_allowed_origins: Option<String>,
    pub enable_swagger: bool,

    /// Parent of every per-request upload directory (default: OS temp dir).
    pub scratch_dir: PathBuf,
    /// Largest accepted `/transcribe` body, in MiB.
    pub max_upload_size_mb: usize,

    pub ffmpeg_bin: String,
    pub transcode_timeout: Duration,

    pub stt_base_url: String,
    pub stt_api_key: Option<String>,
    pub stt_model: String,

    pub tts_base_url: String,
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            bind_address: env_or("KIRA_BIND", "0.0.0.0:5002"),
            log_level: env_or("KIRA_LOG", "info"),
            log_json: env_flag("KIRA_LOG_JSON", false),
            log_dir: env_opt("KIRA_LOG_DIR").map(PathBuf::from),
            cors_allowed_origins: env_opt("KIRA_CORS_ORIGINS"),
            enable_swagger: env_flag("KIRA_ENABLE_SWAGGER", true),
            scratch_dir: env_opt("KIRA_SCRATCH_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(std::env::temp_dir),
            max_upload_size_mb: parse_env("KIRA_MAX_UPLOAD_SIZE_MB", 100),
            ffmpeg_bin: env_or("KIRA_FFMPEG_BIN", ffmpeg::DEFAULT_PROGRAM),
            transcode_timeout: Duration::from_secs(parse_env(
                "KIRA_TRANSCODE_TIMEOUT_SECS",
                ffmpeg::DEFAULT_TIMEOUT.as_secs(),
            )),
            stt_base_url: env_or("KIRA_STT_BASE_URL", whisper::DEFAULT_BASE_URL),
            stt_api_key: env_opt("KIRA_STT_API_KEY"),
            stt_model: env_or("KIRA_STT_MODEL", whisper::DEFAULT_MODEL),
            tts_base_url: env_or("KIRA_TTS_BASE_URL", tts::DEFAULT_BASE_URL),
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_size_mb.saturating_mul(1024 * 1024)
    }
}
