//! Error types for the worker harness.

use thiserror::Error;

use crate::config::ConfigError;

/// Result type alias for harness operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while configuring or running a scenario.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration could not be loaded or failed validation.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Output sink I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A primitive rejected its construction parameters.
    #[error(transparent)]
    Core(#[from] velesync_core::Error),

    /// The requested workload cannot be run.
    #[error("Invalid workload: {0}")]
    InvalidWorkload(String),

    /// A worker thread panicked.
    #[error("Worker {0} panicked")]
    WorkerPanicked(usize),
}
