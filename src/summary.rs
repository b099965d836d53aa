//! Walk summarization: distance, per-cell dwell time, simplified path and
//! encounter tallies from a raw GPS trace.
//!
//! ## Overview
//!
//! | Step | Policy |
//! |------|--------|
//! | Accuracy filter | fixes worse than 50m are dropped; unknown accuracy kept |
//! | Distance | haversine over consecutive surviving fixes |
//! | Jump rejection | >200m in under 5s is a glitch; the pair contributes nothing |
//! | Dwell | segment seconds clamped to [0, 60], keyed by the segment's start cell |
//! | Path | both endpoint cells appended, consecutive duplicates skipped, capped at 200 |
//! | Encounters | >=60s play, >=3s greeting, else none |
//!
//! All thresholds live in [`SummaryConfig`] with defaults matching the fixed
//! policy above.

use std::collections::HashMap;

use geo::{Distance, Haversine, Point};
use log::debug;

use crate::error::{Error, Result};
use crate::grid::{cell_of, CellId};
use crate::{CellDwell, EncounterKind, GpsPoint, Walk, WalkSummary};

/// Configuration for walk summarization policies.
#[derive(Debug, Clone)]
pub struct SummaryConfig {
    /// Fixes with reported accuracy worse than this are excluded.
    /// Default: 50.0 meters
    pub max_accuracy_m: f64,

    /// Segment distance above which a short-time displacement is treated as a
    /// GPS glitch. Default: 200.0 meters
    pub max_jump_m: f64,

    /// Elapsed-time bound for jump rejection: only segments faster than this
    /// are rejected. Default: 5.0 seconds
    pub max_jump_dt_sec: f64,

    /// Clamp on a single segment's dwell contribution. Default: 60.0 seconds
    pub max_cell_dwell_sec: f64,

    /// Cap on the simplified path length; further cells are silently dropped.
    /// Default: 200
    pub max_path_cells: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            max_accuracy_m: 50.0,
            max_jump_m: 200.0,
            max_jump_dt_sec: 5.0,
            max_cell_dwell_sec: 60.0,
            max_path_cells: 200,
        }
    }
}

/// Haversine distance in meters between two fixes.
#[inline]
fn haversine_distance(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    let point1 = Point::new(p1.longitude, p1.latitude);
    let point2 = Point::new(p2.longitude, p2.latitude);
    Haversine::distance(point1, point2)
}

fn point_is_usable(point: &GpsPoint, max_accuracy_m: f64) -> bool {
    point.accuracy_m.map_or(true, |acc| acc <= max_accuracy_m)
}

fn push_path_cell(path: &mut Vec<CellId>, cell: CellId, cap: usize) {
    if path.len() >= cap {
        return;
    }
    if path.last() == Some(&cell) {
        return;
    }
    path.push(cell);
}

/// Derive the immutable [`WalkSummary`] snapshot of a completed walk.
///
/// Fails with [`Error::WalkInProgress`] when `ended_at_ms` is unset: a
/// summary cannot be derived from a session that is still recording, and an
/// unset end time indicates a caller bug rather than bad sensor data.
///
/// A walk with zero or one surviving fix after the accuracy filter yields a
/// zero-distance summary with empty cell and path lists.
///
/// # Example
/// ```
/// use walk_analytics::{build_walk_summary, GpsPoint, SummaryConfig, Walk};
///
/// let walk = Walk {
///     id: "w".to_string(),
///     started_at_ms: 0,
///     ended_at_ms: Some(30_000),
///     points: vec![
///         GpsPoint::new(40.0, -3.0, 0),
///         GpsPoint::new(40.0003, -3.0, 30_000),
///     ],
///     encounters: vec![],
/// };
///
/// let summary = build_walk_summary(&walk, &SummaryConfig::default()).unwrap();
/// assert_eq!(summary.duration_sec, 30);
/// assert!(summary.distance_m > 0.0);
/// ```
pub fn build_walk_summary(walk: &Walk, config: &SummaryConfig) -> Result<WalkSummary> {
    let ended_at_ms = walk.ended_at_ms.ok_or_else(|| Error::WalkInProgress {
        walk_id: walk.id.clone(),
    })?;

    let points: Vec<&GpsPoint> = walk
        .points
        .iter()
        .filter(|p| point_is_usable(p, config.max_accuracy_m))
        .collect();

    if points.len() < walk.points.len() {
        debug!(
            "walk {}: dropped {} low-accuracy fixes",
            walk.id,
            walk.points.len() - points.len()
        );
    }

    let mut distance_m = 0.0;
    let mut seconds_by_cell: HashMap<CellId, f64> = HashMap::new();
    let mut path_cells: Vec<CellId> = Vec::new();

    for pair in points.windows(2) {
        let (p1, p2) = (pair[0], pair[1]);
        let dt_sec = (p2.timestamp_ms - p1.timestamp_ms) as f64 / 1000.0;
        let segment_m = haversine_distance(p1, p2);

        // Implausible displacement over a short time: sensor glitch. The
        // pair advances nothing, not even the path.
        if segment_m > config.max_jump_m && dt_sec < config.max_jump_dt_sec {
            debug!(
                "walk {}: rejected {:.0}m jump over {:.1}s",
                walk.id, segment_m, dt_sec
            );
            continue;
        }

        distance_m += segment_m;

        let dwell_sec = dt_sec.clamp(0.0, config.max_cell_dwell_sec);
        let start_cell = cell_of(p1.latitude, p1.longitude);
        *seconds_by_cell.entry(start_cell).or_insert(0.0) += dwell_sec;

        push_path_cell(&mut path_cells, start_cell, config.max_path_cells);
        push_path_cell(
            &mut path_cells,
            cell_of(p2.latitude, p2.longitude),
            config.max_path_cells,
        );
    }

    let mut greetings = 0u32;
    let mut plays = 0u32;
    for encounter in &walk.encounters {
        match encounter.kind() {
            EncounterKind::Greeting => greetings += 1,
            EncounterKind::Play => plays += 1,
            EncounterKind::None => {}
        }
    }

    // Sorted cell list keeps the derived snapshot byte-deterministic.
    let mut cells: Vec<CellDwell> = seconds_by_cell
        .into_iter()
        .map(|(cell_id, seconds)| CellDwell { cell_id, seconds })
        .collect();
    cells.sort_by_key(|c| c.cell_id);

    Ok(WalkSummary {
        walk_id: walk.id.clone(),
        started_at_ms: walk.started_at_ms,
        ended_at_ms,
        duration_sec: ((ended_at_ms - walk.started_at_ms) as f64 / 1000.0).round() as i64,
        distance_m,
        encounters: walk.encounters.len() as u32,
        greetings,
        plays,
        cells,
        path_cells,
    })
}

/// Summarize a batch of walks.
///
/// In-progress walks are skipped with a debug log rather than failing the
/// whole batch. With the `parallel` feature enabled the walks are processed
/// with rayon; output order follows input order either way.
pub fn build_walk_summaries(walks: &[Walk], config: &SummaryConfig) -> Vec<WalkSummary> {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        walks
            .par_iter()
            .filter_map(|walk| summarize_or_skip(walk, config))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        walks
            .iter()
            .filter_map(|walk| summarize_or_skip(walk, config))
            .collect()
    }
}

fn summarize_or_skip(walk: &Walk, config: &SummaryConfig) -> Option<WalkSummary> {
    match build_walk_summary(walk, config) {
        Ok(summary) => Some(summary),
        Err(err) => {
            debug!("skipping walk {}: {}", walk.id, err);
            None
        }
    }
}
