//! Tracing setup for the command line tool
//!
//! - Human-readable console output on stderr (stdout carries command results)
//! - Optional JSON log file with size-based and daily rotation

use anyhow::Result;
use rolling_file::{RollingConditionBasic, RollingFileAppender};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "esclient=info,esclient_rs=info,esclient_core=info";

/// Initialize tracing, writing JSON logs under `log_dir` when given.
///
/// Returns a guard that must be kept alive to ensure file logs are flushed
pub fn init_telemetry(log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;

            // Rotates when the file reaches 10MB or daily, whichever comes first
            let file_appender = RollingFileAppender::new(
                dir.join("esclient.log"),
                RollingConditionBasic::new()
                    .daily()
                    .max_size(10 * 1024 * 1024),
                9,
            )?;
            let (writer, guard) = tracing_appender::non_blocking(file_appender);

            let layer = fmt::layer()
                .json()
                .with_writer(writer)
                .with_current_span(true)
                .with_target(true)
                .with_thread_ids(true);

            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    if let Some(dir) = log_dir {
        tracing::debug!("File logging to {:?}", dir);
    }

    Ok(guard)
}
