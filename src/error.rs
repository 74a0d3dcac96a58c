//! Error types for soadb
//!
//! Three failure kinds cover the whole engine:
//!
//! - [`Error::Bounds`]: a slice or column was constructed or indexed outside
//!   its valid range. Always a caller bug; surfaced immediately rather than
//!   clamped or truncated.
//! - [`Error::Format`]: a byte or JSON stream was malformed during decode
//!   (premature end of stream, over-long codeword, block count exceeding the
//!   caller's buffer, wrong token where another was expected).
//! - [`Error::Consistency`]: an indices entry referenced a range outside the
//!   current values column. This cannot happen while the garbage-collection
//!   invariants hold, so it is reported as a fatal internal violation, not a
//!   recoverable input error.
//!
//! I/O and JSON parser errors pass through unchanged.

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Engine error type
#[derive(Error, Debug)]
pub enum Error {
    /// Index or range outside the valid bounds of a slice or column
    #[error("out of bounds: {0}")]
    Bounds(String),

    /// Malformed stream encountered during decode
    #[error("malformed stream: {0}")]
    Format(String),

    /// Internal invariant violation (must never occur in a correct engine)
    #[error("consistency violation: {0}")]
    Consistency(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error (serde_json)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a bounds error
    pub fn bounds(msg: impl Into<String>) -> Self {
        Error::Bounds(msg.into())
    }

    /// Create a format error
    pub fn format(msg: impl Into<String>) -> Self {
        Error::Format(msg.into())
    }

    /// Create a consistency error
    pub fn consistency(msg: impl Into<String>) -> Self {
        Error::Consistency(msg.into())
    }
}
