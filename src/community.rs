//! Sparse (cell, hour-of-day) score aggregation.
//!
//! Two views of the same shape coexist: a personal history rebuilt wholesale
//! from the last 30 days of walk summaries, and a community view that only
//! ever grows by additive merges of peer-supplied sparse batches. Both
//! operations are pure over their arguments — the current time and timezone
//! offset come in as parameters, never from an ambient clock.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, Timelike};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::grid::CellId;
use crate::WalkSummary;

/// Rolling window for the personal history view: 30 days.
pub const HISTORY_WINDOW_MS: i64 = 30 * 24 * 3600 * 1000;

/// Hours per day; the inner accumulator array is indexed 0..24.
pub const HOURS_PER_DAY: usize = 24;

/// One sparse score triple, as carried in a peer-exchange payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellHourEntry {
    pub cell_id: CellId,
    /// Hour of day, valid range 0..=23. Out-of-range values are dropped at
    /// merge time, not here — entries arrive from untrusted peers.
    pub hour: u32,
    pub score: f64,
}

/// Sparse accumulation of busy-ness scores keyed by cell and hour of day.
///
/// Internally a two-level container: cell id to a fixed 24-slot hour array.
/// Absent cells and untouched hours read as zero. `(cell, hour)` addresses
/// exactly one accumulator slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunitySummary {
    /// Epoch milliseconds of the last rebuild or merge.
    pub updated_at_ms: i64,
    by_cell: HashMap<CellId, [f64; HOURS_PER_DAY]>,
}

impl CommunitySummary {
    /// An empty summary stamped with the given time.
    pub fn new(updated_at_ms: i64) -> Self {
        Self {
            updated_at_ms,
            by_cell: HashMap::new(),
        }
    }

    /// Accumulated score at one `(cell, hour)` slot; zero when never touched
    /// or when `hour` is out of range.
    pub fn score_at(&self, cell: &CellId, hour: u32) -> f64 {
        if hour as usize >= HOURS_PER_DAY {
            return 0.0;
        }
        self.by_cell
            .get(cell)
            .map_or(0.0, |hours| hours[hour as usize])
    }

    /// Caller guarantees `hour < 24`; both aggregation paths validate first.
    pub(crate) fn add(&mut self, cell: CellId, hour: u32, score: f64) {
        self.by_cell.entry(cell).or_insert([0.0; HOURS_PER_DAY])[hour as usize] += score;
    }

    /// Cells with at least one touched accumulator slot.
    pub fn cell_ids(&self) -> impl Iterator<Item = &CellId> {
        self.by_cell.keys()
    }

    /// Number of cells with accumulated scores.
    pub fn len(&self) -> usize {
        self.by_cell.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_cell.is_empty()
    }

    /// Export the nonzero slots as sparse triples, sorted by cell then hour.
    ///
    /// This is the shape a peer-exchange payload carries and exactly what
    /// [`merge_sparse`] accepts on the receiving side.
    pub fn to_sparse_entries(&self) -> Vec<CellHourEntry> {
        let mut entries: Vec<CellHourEntry> = self
            .by_cell
            .iter()
            .flat_map(|(cell_id, hours)| {
                hours
                    .iter()
                    .enumerate()
                    .filter(|(_, score)| **score != 0.0)
                    .map(move |(hour, score)| CellHourEntry {
                        cell_id: *cell_id,
                        hour: hour as u32,
                        score: *score,
                    })
            })
            .collect();
        entries.sort_by(|a, b| a.cell_id.cmp(&b.cell_id).then(a.hour.cmp(&b.hour)));
        entries
    }
}

/// Additively merge peer-supplied sparse entries into a copy of `base`.
///
/// Invalid entries — hour out of range or non-finite score — are skipped
/// individually and the rest of the batch still applies. This is the only
/// path by which peer data enters the community view: always additive, never
/// a wholesale replacement, so the view reflects the sum of every batch ever
/// merged. Merging is commutative and associative over valid entries.
///
/// # Example
/// ```
/// use walk_analytics::{merge_sparse, CellHourEntry, CommunitySummary};
/// use walk_analytics::grid::cell_of;
///
/// let base = CommunitySummary::new(0);
/// let cell = cell_of(40.0, -3.0);
/// let batch = vec![CellHourEntry { cell_id: cell, hour: 18, score: 2.5 }];
///
/// let merged = merge_sparse(&base, &batch, 1_000);
/// assert_eq!(merged.score_at(&cell, 18), 2.5);
/// assert_eq!(merged.updated_at_ms, 1_000);
/// ```
pub fn merge_sparse(
    base: &CommunitySummary,
    incoming: &[CellHourEntry],
    now_ms: i64,
) -> CommunitySummary {
    let mut merged = base.clone();
    merged.updated_at_ms = now_ms;

    for entry in incoming {
        if entry.hour as usize >= HOURS_PER_DAY || !entry.score.is_finite() {
            debug!(
                "dropping invalid community entry {}@{} = {}",
                entry.cell_id, entry.hour, entry.score
            );
            continue;
        }
        merged.add(entry.cell_id, entry.hour, entry.score);
    }

    merged
}

/// Rebuild the personal history view from scratch over the last 30 days.
///
/// Selects walks with `started_at_ms >= now_ms - 30d` and buckets each walk's
/// per-cell dwell seconds under the walk's local start hour, computed with
/// the injected UTC offset. A wholesale rebuild every time: it never reads a
/// prior history, so stale walks fall out of the window on their own. Walks
/// whose timestamp chrono cannot represent are skipped.
pub fn build_my_history(
    walks: &[WalkSummary],
    now_ms: i64,
    tz: FixedOffset,
) -> CommunitySummary {
    let window_start = now_ms - HISTORY_WINDOW_MS;
    let mut history = CommunitySummary::new(now_ms);

    for walk in walks {
        if walk.started_at_ms < window_start {
            continue;
        }

        let Some(started) = DateTime::from_timestamp_millis(walk.started_at_ms) else {
            debug!(
                "walk {}: unrepresentable start timestamp {}",
                walk.walk_id, walk.started_at_ms
            );
            continue;
        };
        let hour = started.with_timezone(&tz).hour();

        for dwell in &walk.cells {
            history.add(dwell.cell_id, hour, dwell.seconds);
        }
    }

    history
}
