//! Harness Configuration Module
//!
//! Provides configuration file support via `velesync.toml`, environment
//! variables, and command-line overrides.
//!
//! # Priority (highest to lowest)
//!
//! 1. Command-line flags
//! 2. Environment variables (`VELESYNC_SECTION__KEY`)
//! 3. Configuration file (`velesync.toml` or `--config FILE`)
//! 4. Default values

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use velesync_core::Priority;

use crate::search::{Date, DEFAULT_FROM, DEFAULT_TO};
use crate::workload::{alternating_roles, Role};

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "velesync.toml";

/// Upper bound on worker threads per scenario.
pub const MAX_THREADS: usize = 4096;

/// Upper bound on payload length per line.
pub const MAX_SYMBOLS: usize = 1_048_576;

/// Upper bound on generated dates for the range search.
pub const MAX_RECORDS: usize = 50_000_000;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to parse configuration.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue {
        /// Configuration key that failed validation.
        key: String,
        /// Validation error message.
        message: String,
    },
}

/// Shared workload section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadConfig {
    /// Number of worker threads.
    pub threads: usize,
    /// Length of the random payload each worker writes.
    pub symbols: usize,
    /// Output file the workers write to.
    pub output: PathBuf,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            threads: 8,
            symbols: 32,
            output: PathBuf::from("output.txt"),
        }
    }
}

/// Semaphore scenario section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SemaphoreConfig {
    /// Initial permit count.
    pub permits: usize,
}

impl Default for SemaphoreConfig {
    fn default() -> Self {
        Self { permits: 1 }
    }
}

/// Barrier scenario section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BarrierConfig {
    /// Break the barrier on arrival number `n` (zero-based) instead of
    /// letting that worker wait. Unset means the rendezvous completes.
    pub break_after: Option<usize>,
}

/// Readers-writer scenario section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RwLockConfig {
    /// Admission policy.
    pub priority: Priority,
    /// Role of each worker; empty means alternate over `workload.threads`.
    pub roles: Vec<Role>,
    /// Minimum time a worker holds the lock, in milliseconds.
    pub min_hold_ms: u64,
    /// Maximum time a worker holds the lock, in milliseconds.
    pub max_hold_ms: u64,
}

impl Default for RwLockConfig {
    fn default() -> Self {
        Self {
            priority: Priority::ReaderPriority,
            roles: Vec::new(),
            min_hold_ms: 10,
            max_hold_ms: 100,
        }
    }
}

/// Date-range search section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Number of random dates to generate.
    pub records: usize,
    /// Inclusive lower bound, `YYYY-MM-DD`.
    pub from: Date,
    /// Inclusive upper bound, `YYYY-MM-DD`.
    pub to: Date,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            records: 1_000_000,
            from: DEFAULT_FROM,
            to: DEFAULT_TO,
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Main harness configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HarnessConfig {
    /// Shared workload parameters.
    pub workload: WorkloadConfig,
    /// Semaphore scenario parameters.
    pub semaphore: SemaphoreConfig,
    /// Barrier scenario parameters.
    pub barrier: BarrierConfig,
    /// Readers-writer scenario parameters.
    pub rwlock: RwLockConfig,
    /// Date-range search parameters.
    pub search: SearchConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl HarnessConfig {
    /// Loads configuration from default sources.
    ///
    /// Priority: defaults < `velesync.toml` < environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path(DEFAULT_CONFIG_FILE)
    }

    /// Loads configuration from a specific file path.
    ///
    /// A missing file is not an error; defaults and environment still apply.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("VELESYNC_").split("__"))
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Creates a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::string(toml_str))
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Renders the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workload.threads == 0 || self.workload.threads > MAX_THREADS {
            return Err(ConfigError::InvalidValue {
                key: "workload.threads".to_string(),
                message: format!(
                    "value {} is out of range [1, {MAX_THREADS}]",
                    self.workload.threads
                ),
            });
        }

        if self.workload.symbols > MAX_SYMBOLS {
            return Err(ConfigError::InvalidValue {
                key: "workload.symbols".to_string(),
                message: format!(
                    "value {} is out of range [0, {MAX_SYMBOLS}]",
                    self.workload.symbols
                ),
            });
        }

        if self.workload.output.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "workload.output".to_string(),
                message: "path must not be empty".to_string(),
            });
        }

        if self.semaphore.permits == 0 {
            return Err(ConfigError::InvalidValue {
                key: "semaphore.permits".to_string(),
                message: "at least one permit is required".to_string(),
            });
        }

        if let Some(break_after) = self.barrier.break_after {
            if break_after >= self.workload.threads {
                return Err(ConfigError::InvalidValue {
                    key: "barrier.break_after".to_string(),
                    message: format!(
                        "value {break_after} must be below workload.threads {}",
                        self.workload.threads
                    ),
                });
            }
        }

        if self.rwlock.min_hold_ms > self.rwlock.max_hold_ms {
            return Err(ConfigError::InvalidValue {
                key: "rwlock.min_hold_ms".to_string(),
                message: format!(
                    "value {} exceeds rwlock.max_hold_ms {}",
                    self.rwlock.min_hold_ms, self.rwlock.max_hold_ms
                ),
            });
        }

        if self.rwlock.roles.len() > MAX_THREADS {
            return Err(ConfigError::InvalidValue {
                key: "rwlock.roles".to_string(),
                message: format!("at most {MAX_THREADS} roles are supported"),
            });
        }

        if self.search.records == 0 || self.search.records > MAX_RECORDS {
            return Err(ConfigError::InvalidValue {
                key: "search.records".to_string(),
                message: format!(
                    "value {} is out of range [1, {MAX_RECORDS}]",
                    self.search.records
                ),
            });
        }

        if self.search.from > self.search.to {
            return Err(ConfigError::InvalidValue {
                key: "search.from".to_string(),
                message: format!(
                    "value {} is after search.to {}",
                    self.search.from, self.search.to
                ),
            });
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.level".to_string(),
                message: format!(
                    "value '{}' is invalid, expected one of: {:?}",
                    self.logging.level, valid_levels
                ),
            });
        }

        Ok(())
    }

    /// Returns the worker roles for the readers-writer scenario.
    ///
    /// Explicit roles win; otherwise readers and writers alternate over
    /// `workload.threads`.
    #[must_use]
    pub fn effective_roles(&self) -> Vec<Role> {
        if self.rwlock.roles.is_empty() {
            alternating_roles(self.workload.threads)
        } else {
            self.rwlock.roles.clone()
        }
    }
}
