// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide tracing setup

use crate::config::Config;
use crate::lifecycle::LifecycleError;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber, writing to the state directory's log file
///
/// `RUST_LOG` overrides the configured filter. Keep the returned guard alive
/// for as long as logs should be flushed.
pub fn setup_logging(config: &Config) -> Result<WorkerGuard, LifecycleError> {
    let paths = config.paths()?;

    // Create log directory if needed
    std::fs::create_dir_all(&paths.state_dir)?;

    let file_name = paths
        .log_path
        .file_name()
        .ok_or_else(|| LifecycleError::Logging("log path has no file name".to_string()))?;
    let file_appender = tracing_appender::rolling::never(&paths.state_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(config.log_filter())
            .map_err(|e| LifecycleError::Logging(format!("invalid log filter: {}", e)))?,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .try_init()
        .map_err(|e| LifecycleError::Logging(e.to_string()))?;

    Ok(guard)
}
