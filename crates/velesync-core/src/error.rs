//! Error types for `VelesSync`.
//!
//! Synchronization primitives either admit a caller or keep it suspended, so
//! the only errors surfaced here are precondition violations detected when a
//! primitive is constructed.

use thiserror::Error;

/// Result type alias for `VelesSync` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when constructing a primitive.
///
/// Error codes follow the pattern `VSYNC-XXX` for easy debugging.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Barrier party size must be at least one (VSYNC-001).
    #[error("[VSYNC-001] Invalid barrier party size {0}: at least one party is required")]
    InvalidPartySize(usize),

    /// Priority name could not be parsed (VSYNC-002).
    #[error("[VSYNC-002] Unknown readers-writer priority '{0}'")]
    UnknownPriority(String),
}

impl Error {
    /// Returns the error code (e.g., "VSYNC-001").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidPartySize(_) => "VSYNC-001",
            Self::UnknownPriority(_) => "VSYNC-002",
        }
    }
}
