//! Subscriber setup shared by the HTTP services.

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Logging settings read from each binary's `Config`.
#[derive(Debug, Clone)]
pub struct LogSettings {
    /// Used as the rolling file prefix, e.g. `kira-server.log.2026-10-16`.
    pub service: &'static str,
    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub level: String,
    /// Emit records as newline-delimited JSON.
    pub json: bool,
    /// Also write a daily-rotated plain-text log under this directory.
    pub dir: Option<PathBuf>,
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `settings.level`; an invalid level falls back to
/// `info` with a warning on stderr. The returned guard flushes the file sink
/// and must be held until the process exits.
pub fn init(settings: &LogSettings) -> Option<WorkerGuard> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => match settings.level.parse::<EnvFilter>() {
            Ok(f) => f,
            Err(e) => {
                eprintln!(
                    "WARN: KIRA_LOG='{}' is not a valid tracing filter ({}); \
                     falling back to 'info'",
                    settings.level, e
                );
                EnvFilter::new("info")
            }
        },
    };

    let (file_layer, guard) = match &settings.dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, format!("{}.log", settings.service));
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false).with_target(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let registry = tracing_subscriber::registry().with(env_filter).with(file_layer);

    if settings.json {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(true))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .init();
    }

    guard
}
