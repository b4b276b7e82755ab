//! Chat-reply service configuration, loaded from environment variables at
//! startup.

use std::path::PathBuf;

use kira_core::pipeline::DEFAULT_PIVOT_LOCALE;
use kira_core::services::{chat, lingo};
use kira_web::env::{env_flag, env_opt, env_or, parse_env};

#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:5005"`).
    pub bind_address: String,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,
    pub log_json: bool,
    /// Directory for the daily-rotated log file; console only when unset.
    pub log_dir: Option<PathBuf>,

    /// Comma-separated list of allowed CORS origins; wildcard when unset.
    pub cors_allowed_origins: Option<String>,
    pub enable_swagger: bool,

    /// Append-only NDJSON file receiving one line per exchange.
    pub exchange_log: PathBuf,
    pub pivot_locale: String,

    pub lingo_api_key: String,
    pub lingo_base_url: String,

    pub chat_api_key: String,
    pub chat_base_url: String,
    pub chat_model: String,
    pub chat_temperature: f32,
    pub chat_max_tokens: u32,
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            bind_address: env_or("KIRA_BIND", "0.0.0.0:5005"),
            log_level: env_or("KIRA_LOG", "info"),
            log_json: env_flag("KIRA_LOG_JSON", false),
            log_dir: env_opt("KIRA_LOG_DIR").map(PathBuf::from),
            cors_allowed_origins: env_opt("KIRA_CORS_ORIGINS"),
            enable_swagger: env_flag("KIRA_ENABLE_SWAGGER", true),
            exchange_log: PathBuf::from(env_or(
                "KIRA_EXCHANGE_LOG",
                kira_core::exchange_log::DEFAULT_PATH,
            )),
            pivot_locale: env_or("KIRA_PIVOT_LOCALE", DEFAULT_PIVOT_LOCALE),
            lingo_api_key: env_or("LINGODOTDEV_API_KEY", ""),
            lingo_base_url: env_or("KIRA_LINGO_BASE_URL", lingo::DEFAULT_BASE_URL),
            chat_api_key: env_or("OPENAI_API_KEY", ""),
            chat_base_url: env_or("KIRA_CHAT_BASE_URL", chat::DEFAULT_BASE_URL),
            chat_model: env_or("KIRA_CHAT_MODEL", chat::DEFAULT_MODEL),
            chat_temperature: parse_env("KIRA_CHAT_TEMPERATURE", chat::DEFAULT_TEMPERATURE),
            chat_max_tokens: parse_env("KIRA_CHAT_MAX_TOKENS", chat::DEFAULT_MAX_TOKENS),
        }
    }
}
