//! # Walk Analytics
//!
//! Deterministic spatial-temporal movement analytics for GPS walk traces.
//!
//! This library provides:
//! - Grid bucketing of coordinates into fixed 50m Web-Mercator cells
//! - Per-walk occupancy summaries (distance, dwell time, simplified path)
//! - Sparse (cell, hour) score aggregation for personal and community views
//! - Weighted score fusion and ranked location recommendations
//!
//! ## Features
//!
//! - **`parallel`** - Enable parallel batch summarization with rayon
//!
//! ## Quick Start
//!
//! ```rust
//! use walk_analytics::{build_walk_summary, GpsPoint, SummaryConfig, Walk};
//!
//! let walk = Walk {
//!     id: "walk-1".to_string(),
//!     started_at_ms: 0,
//!     ended_at_ms: Some(60_000),
//!     points: vec![
//!         GpsPoint::new(51.5074, -0.1278, 0),
//!         GpsPoint::new(51.5080, -0.1290, 30_000),
//!         GpsPoint::new(51.5090, -0.1300, 60_000),
//!     ],
//!     encounters: vec![],
//! };
//!
//! let summary = build_walk_summary(&walk, &SummaryConfig::default()).unwrap();
//! println!(
//!     "{:.0}m over {}s across {} cells",
//!     summary.distance_m,
//!     summary.duration_sec,
//!     summary.cells.len(),
//! );
//! ```
//!
//! ## Design
//!
//! Every operation is a pure, synchronous function over immutable inputs:
//! the current time and timezone offset are always explicit arguments, no
//! component performs I/O, and results are new values rather than in-place
//! mutations. The core is safe to call from any concurrency model.

use serde::{Deserialize, Serialize};

pub mod community;
pub mod error;
pub mod exchange;
pub mod grid;
pub mod recommend;
pub mod summary;

pub use community::{
    build_my_history, merge_sparse, CellHourEntry, CommunitySummary, HISTORY_WINDOW_MS,
};
pub use error::{Error, Result};
pub use exchange::{ExchangePacketV1, PeerKind, PeerRef, MAX_SHARED_WALKS};
pub use grid::{cell_of, CellId, CELL_SIZE_M};
pub use recommend::{
    best_hour, most_active, normalize, recommend, scores_for_hour, CellHourScore,
    RecommendConfig, ScoreWeights,
};
pub use summary::{build_walk_summaries, build_walk_summary, SummaryConfig};

// ============================================================================
// Core Types
// ============================================================================

/// Minimum duration for an encounter to count as a play session.
pub const PLAY_MIN_SEC: f64 = 60.0;
/// Minimum duration for an encounter to count as a greeting.
pub const GREETING_MIN_SEC: f64 = 3.0;

/// A timestamped GPS fix with optional reported accuracy.
///
/// # Example
/// ```
/// use walk_analytics::GpsPoint;
/// let point = GpsPoint::new(51.5074, -0.1278, 1_700_000_000_000); // London
/// assert!(point.accuracy_m.is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Epoch milliseconds.
    pub timestamp_ms: i64,
    /// Reported horizontal accuracy in meters, if the receiver provided one.
    pub accuracy_m: Option<f64>,
}

impl GpsPoint {
    /// Create a fix without accuracy information.
    pub fn new(latitude: f64, longitude: f64, timestamp_ms: i64) -> Self {
        Self {
            latitude,
            longitude,
            timestamp_ms,
            accuracy_m: None,
        }
    }

    /// Create a fix with a reported accuracy in meters.
    pub fn with_accuracy(latitude: f64, longitude: f64, timestamp_ms: i64, accuracy_m: f64) -> Self {
        Self {
            latitude,
            longitude,
            timestamp_ms,
            accuracy_m: Some(accuracy_m),
        }
    }
}

/// Classification of a peer-proximity encounter by duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EncounterKind {
    None,
    Greeting,
    Play,
}

impl EncounterKind {
    /// Classify a duration: at least 60s is a play, at least 3s a greeting.
    pub fn classify(duration_sec: f64) -> Self {
        if duration_sec >= PLAY_MIN_SEC {
            EncounterKind::Play
        } else if duration_sec >= GREETING_MIN_SEC {
            EncounterKind::Greeting
        } else {
            EncounterKind::None
        }
    }
}

/// A peer-proximity interval recorded during a walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Encounter {
    pub first_seen_ms: i64,
    pub last_seen_ms: i64,
    /// Explicit duration, preferred over the seen interval when present.
    pub duration_sec: Option<f64>,
}

impl Encounter {
    /// Effective duration in seconds: the explicit value if set, otherwise
    /// the span between first and last sighting.
    pub fn effective_duration_sec(&self) -> f64 {
        self.duration_sec
            .unwrap_or((self.last_seen_ms - self.first_seen_ms) as f64 / 1000.0)
    }

    /// Classification of this encounter.
    pub fn kind(&self) -> EncounterKind {
        EncounterKind::classify(self.effective_duration_sec())
    }
}

/// A recording session: an ordered GPS trace plus the encounters observed
/// along the way.
///
/// A walk is owned by its recording session and only appended to while in
/// progress. Once `ended_at_ms` is set it is treated as immutable and a
/// [`WalkSummary`] can be derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Walk {
    pub id: String,
    pub started_at_ms: i64,
    /// Unset while the session is still recording.
    pub ended_at_ms: Option<i64>,
    pub points: Vec<GpsPoint>,
    pub encounters: Vec<Encounter>,
}

/// Accumulated dwell seconds in one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellDwell {
    pub cell_id: CellId,
    pub seconds: f64,
}

/// Immutable derived snapshot of a completed walk.
///
/// Created once per walk by [`build_walk_summary`] and never mutated
/// afterwards; this is the durable artifact a storage collaborator persists
/// and later feeds back into [`build_my_history`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkSummary {
    pub walk_id: String,
    pub started_at_ms: i64,
    pub ended_at_ms: i64,
    /// Wall-clock session length in seconds. Independent of the sum of
    /// per-segment times, which reflects only accepted segments.
    pub duration_sec: i64,
    pub distance_m: f64,
    /// Raw encounter count, regardless of classification.
    pub encounters: u32,
    pub greetings: u32,
    pub plays: u32,
    /// Dwell seconds per visited cell, sorted by cell id. Keys are unique.
    pub cells: Vec<CellDwell>,
    /// Simplified trajectory as visited cells: at most 200 entries, no two
    /// consecutive entries equal.
    pub path_cells: Vec<CellId>,
}

// ============================================================================
// Tests
// ============================================================================
