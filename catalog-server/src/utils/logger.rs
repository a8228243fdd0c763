//! Logging Infrastructure
//!
//! Console output (text or JSON) plus optional daily rolling files.
//! `RUST_LOG` overrides the configured level.

use std::path::Path;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

pub const LOG_FILE_PREFIX: &str = "catalog-server";

/// Initialize the logger with defaults
pub fn init_logger() {
    init_logger_with_file(None, false, None);
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize the logger with optional file output
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logger_with_file(log_level: Option<&str>, json: bool, log_dir: Option<&str>) {
    let level = log_level.unwrap_or("info");

    let console_json = json.then(|| fmt::layer().json().with_target(false));
    let console_text = (!json).then(|| fmt::layer().with_target(false));

    let file_layer = log_dir.and_then(|dir| {
        let path = Path::new(dir);
        if let Err(e) = std::fs::create_dir_all(path) {
            eprintln!("Failed to create log directory {dir}: {e}");
            return None;
        }
        let appender = tracing_appender::rolling::daily(path, LOG_FILE_PREFIX);
        Some(fmt::layer().with_ansi(false).with_writer(appender))
    });

    let _ = tracing_subscriber::registry()
        .with(env_filter(level))
        .with(console_json)
        .with(console_text)
        .with(file_layer)
        .try_init();
}
