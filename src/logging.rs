//! `env_logger` setup.
//!
//! The filter comes from `RISK_LOG` (default `warn`). Line-oriented commands log
//! to stderr; the TUI owns the terminal, so it logs to a file or nowhere.

use std::fs::OpenOptions;
use std::path::Path;

use crate::config::LOG_ENV;
use crate::error::AppError;

#[derive(Debug, Clone, Copy)]
pub enum LogTarget<'a> {
    Stderr,
    File(&'a Path),
    Discard,
}

pub fn init(target: LogTarget<'_>) -> Result<(), AppError> {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().filter_or(LOG_ENV, "warn"));

    match target {
        LogTarget::Stderr => {}
        LogTarget::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| AppError::config(format!("Failed to open log file '{}': {e}", path.display())))?;
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        LogTarget::Discard => {
            builder.target(env_logger::Target::Pipe(Box::new(std::io::sink())));
        }
    }

    // A second init (e.g. from tests) keeps the first logger.
    if builder.try_init().is_err() {
        log::debug!("logger already initialized");
    }
    Ok(())
}
