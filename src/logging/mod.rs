/*!
 * Logging Module
 * Console plus daily rolling files, JSON in production
 */
pub mod middleware;

use std::io;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

use crate::config::AppConfig;

const LOG_DIR: &str = "logs";

/// Flushes buffered log lines when dropped; hold it for the life of the process.
#[must_use = "dropping the guards stops the background log writers"]
pub struct LogGuards(#[allow(dead_code)] Vec<WorkerGuard>);

fn default_filter(level: &str) -> EnvFilter {
    EnvFilter::new(format!(
        "portfolio_cms={level},tower_http=info,axum=info,sqlx=warn"
    ))
}

/// Initialize the logging system. `RUST_LOG` overrides `LOG_LEVEL`.
pub fn init(config: &AppConfig) -> LogGuards {
    let is_production = config.is_production();

    if let Err(e) = std::fs::create_dir_all(LOG_DIR) {
        eprintln!("Failed to create log directory '{}': {}", LOG_DIR, e);
    }

    let (file_writer, file_guard) = non_blocking(rolling::daily(LOG_DIR, "app.log"));
    let (error_writer, error_guard) = non_blocking(rolling::daily(LOG_DIR, "error.log"));
    let (console_writer, console_guard) = non_blocking(io::stdout());

    let log_level = std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| if is_production { "info" } else { "debug" }.to_string());
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(&log_level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    let result = if is_production {
        let file_layer = fmt::layer()
            .json()
            .with_writer(file_writer)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);

        let error_layer = fmt::layer()
            .json()
            .with_writer(error_writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_filter(LevelFilter::ERROR);

        let console_layer = fmt::layer()
            .json()
            .with_writer(console_writer)
            .with_target(false);

        subscriber
            .with(file_layer)
            .with(error_layer)
            .with(console_layer)
            .try_init()
    } else {
        let file_layer = fmt::layer()
            .with_writer(file_writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false);

        let error_layer = fmt::layer()
            .with_writer(error_writer)
            .with_ansi(false)
            .with_filter(LevelFilter::ERROR);

        let console_layer = fmt::layer()
            .with_writer(console_writer)
            .with_target(true)
            .pretty();

        subscriber
            .with(file_layer)
            .with(error_layer)
            .with(console_layer)
            .try_init()
    };

    match result {
        Ok(()) => tracing::info!("Logging initialized for {} environment", config.environment),
        Err(e) => eprintln!("Logging was already initialized: {}", e),
    }

    LogGuards(vec![file_guard, error_guard, console_guard])
}
