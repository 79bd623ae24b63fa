//! # VelesSync harness
//!
//! Drives the [`velesync_core`] primitives with concurrent workers that write
//! to a shared [`OutputSink`], and reports per-worker timings.
//!
//! ```rust,no_run
//! use velesync_cli::{run, HarnessConfig, OutputSink, Scenario};
//!
//! let config = HarnessConfig::load()?;
//! let sink = OutputSink::create(&config.workload.output)?;
//! let report = run(&config, Scenario::Monitor, &sink)?;
//! println!("slowest worker: {:.3}s", report.max_secs());
//! # Ok::<(), velesync_cli::Error>(())
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod runner;
pub mod search;
pub mod sink;
pub mod workload;

pub use config::{ConfigError, HarnessConfig};
pub use error::{Error, Result};
pub use runner::{run, RunReport, Scenario, WorkerOutcome, WorkerTiming};
pub use search::{Date, SearchSummary};
pub use sink::OutputSink;
pub use workload::Role;
