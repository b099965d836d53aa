//! Error type for walk-analytics operations.
//!
//! The core raises hard errors only for caller bugs (deriving a summary from
//! a walk that never ended, feeding an unknown packet version). Malformed
//! external data — low-accuracy fixes, out-of-range hours, non-finite scores —
//! is skipped at the point of use instead, since it arrives from noisy
//! sensors and untrusted peers.

use thiserror::Error;

/// Unified error type for walk-analytics operations.
#[derive(Debug, Error)]
pub enum WalkAnalyticsError {
    /// A summary was requested for a walk whose session is still open.
    #[error("walk '{walk_id}' has no end time; summaries require a completed walk")]
    WalkInProgress { walk_id: String },

    /// A cell id string did not match the `g50:<gx>:<gy>` encoding.
    #[error("invalid cell id '{0}'")]
    InvalidCellId(String),

    /// An exchange packet declared a version this build does not understand.
    #[error("unsupported exchange packet version {0}")]
    UnsupportedVersion(u32),

    /// Exchange packet (de)serialization failure.
    #[error("exchange packet encoding: {0}")]
    Encoding(#[from] serde_json::Error),
}

pub use WalkAnalyticsError as Error;

/// Result type alias for walk-analytics operations.
pub type Result<T> = std::result::Result<T, WalkAnalyticsError>;
