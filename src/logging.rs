use crate::config::Config;
use std::fs::{self, File, OpenOptions};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber. Logging is file-only: the board owns the
/// terminal, so nothing may be written to stdout or stderr while it runs.
pub fn init(config: &Config) -> Option<WorkerGuard> {
    if !config.log_enabled {
        return None;
    }

    let file = match open_log_file(config.log_file.trim()) {
        Some(file) => file,
        None => return None,
    };
    let (writer, guard) = tracing_appender::non_blocking(file);

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(resolve_filter(&config.log_level))
        .with_writer(writer)
        .with_ansi(false)
        .with_level(true)
        .with_target(true)
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S%.3f".to_string()))
        .compact()
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
    Some(guard)
}

/// `RUST_LOG` wins, then the configured level, then `info`.
fn resolve_filter(level: &str) -> EnvFilter {
    let level = if level.trim().is_empty() {
        "info"
    } else {
        level.trim()
    };
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

fn open_log_file(path: &str) -> Option<File> {
    if path.is_empty() {
        return None;
    }
    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            let _ = fs::create_dir_all(parent);
        }
    }
    OpenOptions::new().create(true).append(true).open(path).ok()
}
