//! Score fusion, normalization and ranked recommendation.
//!
//! Fuses the personal and community score tables with a weighted sum,
//! rescales to a unit range, and ranks cells into two views: recommended
//! (busy places the user has not already frequented) and most active.
//!
//! Ranking order is deterministic by construction — score descending, then
//! grid coordinates, then hour — and never depends on map iteration order.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::community::CommunitySummary;
use crate::grid::CellId;

/// A transient fused score for one `(cell, hour)` slot. Produced for
/// presentation, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellHourScore {
    pub cell_id: CellId,
    pub hour: u32,
    pub score: f64,
}

/// Fusion weights for the two views. Deliberately not required to sum to
/// one; callers may pass unnormalized weights.
#[derive(Debug, Clone, Copy)]
pub struct ScoreWeights {
    pub my: f64,
    pub community: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            my: 0.3,
            community: 0.7,
        }
    }
}

/// Ranking and filter configuration for [`recommend`].
#[derive(Debug, Clone)]
pub struct RecommendConfig {
    pub weights: ScoreWeights,

    /// Cells the user already frequents — raw personal dwell at the slot at
    /// or above this many seconds — are excluded. Default: 120.0
    pub my_low_threshold: f64,

    /// Maximum number of results. Default: 10
    pub top_n: usize,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            my_low_threshold: 120.0,
            top_n: 10,
        }
    }
}

/// Deterministic ranking: score descending, then grid coordinates, then hour.
///
/// Scores are finite by construction (non-finite input is dropped before it
/// is ever stored), so the partial comparison cannot actually fail.
fn rank_order(a: &CellHourScore, b: &CellHourScore) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.cell_id.cmp(&b.cell_id))
        .then_with(|| a.hour.cmp(&b.hour))
}

/// Fuse both score tables for one hour of day.
///
/// Unions the cell sets of both summaries, computes
/// `w_my * my + w_community * community` per cell (a side without the cell
/// contributes zero), keeps slots where either side is nonzero, and sorts by
/// the deterministic ranking order.
pub fn scores_for_hour(
    hour: u32,
    my: &CommunitySummary,
    community: &CommunitySummary,
    weights: ScoreWeights,
) -> Vec<CellHourScore> {
    // BTreeSet union keeps candidate iteration data-dependent.
    let cells: BTreeSet<&CellId> = my.cell_ids().chain(community.cell_ids()).collect();

    let mut scores: Vec<CellHourScore> = cells
        .into_iter()
        .filter_map(|cell| {
            let my_value = my.score_at(cell, hour);
            let community_value = community.score_at(cell, hour);
            if my_value == 0.0 && community_value == 0.0 {
                return None;
            }
            Some(CellHourScore {
                cell_id: *cell,
                hour,
                score: weights.my * my_value + weights.community * community_value,
            })
        })
        .collect();

    scores.sort_by(rank_order);
    scores
}

/// Linearly rescale scores to [0, 1], preserving input order.
///
/// Empty input yields empty output. When every score is equal, all items map
/// to zero: a flat score set carries no ranking information, and zero avoids
/// both division by zero and a false top rank.
pub fn normalize(items: Vec<CellHourScore>) -> Vec<CellHourScore> {
    if items.is_empty() {
        return items;
    }

    let min = items.iter().map(|i| i.score).fold(f64::INFINITY, f64::min);
    let max = items
        .iter()
        .map(|i| i.score)
        .fold(f64::NEG_INFINITY, f64::max);

    if max == min {
        return items
            .into_iter()
            .map(|item| CellHourScore { score: 0.0, ..item })
            .collect();
    }

    let range = max - min;
    items
        .into_iter()
        .map(|item| CellHourScore {
            score: (item.score - min) / range,
            ..item
        })
        .collect()
}

/// Recommend under-visited cells for an hour of day.
///
/// Fuses and normalizes both views, drops every cell whose raw personal
/// dwell at that `(cell, hour)` slot is at or above
/// `config.my_low_threshold` — the point is to surface places the user has
/// *not* already frequented — then re-ranks and truncates to `config.top_n`.
/// The second sort after filtering is deliberate: removing items changes
/// which normalized scores remain in contention.
///
/// # Example
/// ```
/// use walk_analytics::{merge_sparse, recommend, CellHourEntry, CommunitySummary, RecommendConfig};
/// use walk_analytics::grid::cell_of;
///
/// let my = CommunitySummary::new(0);
/// let community = merge_sparse(
///     &CommunitySummary::new(0),
///     &[CellHourEntry { cell_id: cell_of(40.0, -3.0), hour: 18, score: 9.0 }],
///     0,
/// );
///
/// let picks = recommend(18, &my, &community, &RecommendConfig::default());
/// assert_eq!(picks.len(), 1);
/// ```
pub fn recommend(
    hour: u32,
    my: &CommunitySummary,
    community: &CommunitySummary,
    config: &RecommendConfig,
) -> Vec<CellHourScore> {
    let fused = scores_for_hour(hour, my, community, config.weights);

    let mut picks: Vec<CellHourScore> = normalize(fused)
        .into_iter()
        .filter(|item| my.score_at(&item.cell_id, item.hour) < config.my_low_threshold)
        .collect();

    picks.sort_by(rank_order);
    picks.truncate(config.top_n);
    picks
}

/// Busiest cells for an hour of day, regardless of personal visitation.
///
/// Default-weight fusion, normalized, truncated to `top_n`.
pub fn most_active(
    hour: u32,
    my: &CommunitySummary,
    community: &CommunitySummary,
    top_n: usize,
) -> Vec<CellHourScore> {
    let mut scores = normalize(scores_for_hour(hour, my, community, ScoreWeights::default()));
    scores.truncate(top_n);
    scores
}

/// Hour of day (0..=23) whose strongest fused score is highest.
///
/// Ties resolve to the earlier hour; 0 when both views are empty.
pub fn best_hour(my: &CommunitySummary, community: &CommunitySummary) -> u32 {
    let mut best = 0u32;
    let mut best_score = -1.0f64;

    for hour in 0..24 {
        let top = normalize(scores_for_hour(hour, my, community, ScoreWeights::default()))
            .first()
            .map_or(0.0, |item| item.score);
        if top > best_score {
            best_score = top;
            best = hour;
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::community::{merge_sparse, CellHourEntry};

    fn cell(gx: i64) -> CellId {
        CellId { gx, gy: 0 }
    }

    fn summary_of(entries: &[(i64, u32, f64)]) -> CommunitySummary {
        let batch: Vec<CellHourEntry> = entries
            .iter()
            .map(|&(gx, hour, score)| CellHourEntry {
                cell_id: cell(gx),
                hour,
                score,
            })
            .collect();
        merge_sparse(&CommunitySummary::new(0), &batch, 0)
    }

    fn score(cell_id: CellId, hour: u32, score: f64) -> CellHourScore {
        CellHourScore { cell_id, hour, score }
    }

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    #[test]
    fn test_fusion_with_default_weights() {
        let my = summary_of(&[(1, 9, 100.0)]);
        let community = summary_of(&[(1, 9, 10.0)]);

        let scores = scores_for_hour(9, &my, &community, ScoreWeights::default());
        assert_eq!(scores.len(), 1);
        assert!(approx_eq(scores[0].score, 0.3 * 100.0 + 0.7 * 10.0, 1e-9));
    }

    #[test]
    fn test_missing_side_defaults_to_zero() {
        let my = summary_of(&[(1, 9, 100.0)]);
        let community = summary_of(&[(2, 9, 10.0)]);

        let scores = scores_for_hour(9, &my, &community, ScoreWeights::default());
        assert_eq!(scores.len(), 2);
        let only_mine = scores.iter().find(|s| s.cell_id == cell(1)).unwrap();
        assert!(approx_eq(only_mine.score, 30.0, 1e-9));
        let only_community = scores.iter().find(|s| s.cell_id == cell(2)).unwrap();
        assert!(approx_eq(only_community.score, 7.0, 1e-9));
    }

    #[test]
    fn test_other_hours_excluded() {
        let my = summary_of(&[(1, 9, 100.0), (1, 10, 50.0)]);
        let community = CommunitySummary::new(0);

        let scores = scores_for_hour(10, &my, &community, ScoreWeights::default());
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].hour, 10);
    }

    #[test]
    fn test_unnormalized_weights_pass_through() {
        let my = summary_of(&[(1, 9, 10.0)]);
        let community = summary_of(&[(1, 9, 10.0)]);

        let weights = ScoreWeights { my: 2.0, community: 3.0 };
        let scores = scores_for_hour(9, &my, &community, weights);
        assert!(approx_eq(scores[0].score, 50.0, 1e-9));
    }

    #[test]
    fn test_tie_break_is_deterministic() {
        let my = CommunitySummary::new(0);
        let community = summary_of(&[(3, 9, 5.0), (1, 9, 5.0), (2, 9, 5.0)]);

        let scores = scores_for_hour(9, &my, &community, ScoreWeights::default());
        let order: Vec<i64> = scores.iter().map(|s| s.cell_id.gx).collect();
        assert_eq!(order, vec![1, 2, 3]); // equal scores fall back to cell order

        // Stable across repeated calls with identical input
        let again = scores_for_hour(9, &my, &community, ScoreWeights::default());
        assert_eq!(scores, again);
    }

    #[test]
    fn test_sorted_descending_by_score() {
        let my = CommunitySummary::new(0);
        let community = summary_of(&[(1, 9, 1.0), (2, 9, 9.0), (3, 9, 5.0)]);

        let scores = scores_for_hour(9, &my, &community, ScoreWeights::default());
        let order: Vec<i64> = scores.iter().map(|s| s.cell_id.gx).collect();
        assert_eq!(order, vec![2, 3, 1]);
    }

    #[test]
    fn test_normalize_empty() {
        assert!(normalize(vec![]).is_empty());
    }

    #[test]
    fn test_normalize_all_equal_maps_to_zero() {
        let items = vec![
            score(cell(1), 9, 5.0),
            score(cell(2), 9, 5.0),
            score(cell(3), 9, 5.0),
        ];
        let normalized = normalize(items);
        assert!(normalized.iter().all(|i| i.score == 0.0));
    }

    #[test]
    fn test_normalize_rescales_and_preserves_order() {
        let items = vec![score(cell(1), 9, 0.0), score(cell(2), 9, 10.0)];
        let normalized = normalize(items);
        assert_eq!(normalized[0].cell_id, cell(1));
        assert_eq!(normalized[0].score, 0.0);
        assert_eq!(normalized[1].score, 1.0);

        let items = vec![score(cell(1), 9, 10.0), score(cell(2), 9, 0.0)];
        let normalized = normalize(items);
        assert_eq!(normalized[0].cell_id, cell(1)); // input order kept
        assert_eq!(normalized[0].score, 1.0);
    }

    #[test]
    fn test_recommend_filters_frequented_cells() {
        // Cell 1: heavy personal dwell. Cell 2: community only.
        let my = summary_of(&[(1, 9, 500.0)]);
        let community = summary_of(&[(1, 9, 50.0), (2, 9, 40.0)]);

        let picks = recommend(9, &my, &community, &RecommendConfig::default());
        assert_eq!(picks.len(), 1);
        assert_eq!(picks[0].cell_id, cell(2));
    }

    #[test]
    fn test_recommend_threshold_is_inclusive() {
        let my = summary_of(&[(1, 9, 120.0), (2, 9, 119.9)]);
        let community = summary_of(&[(1, 9, 1.0), (2, 9, 1.0), (3, 9, 1.0)]);

        let picks = recommend(9, &my, &community, &RecommendConfig::default());
        assert!(picks.iter().all(|p| p.cell_id != cell(1))); // 120 >= 120 excluded
        assert!(picks.iter().any(|p| p.cell_id == cell(2)));
    }

    #[test]
    fn test_recommend_truncates_to_top_n() {
        let community = summary_of(&[(1, 9, 1.0), (2, 9, 2.0), (3, 9, 3.0), (4, 9, 4.0)]);
        let my = CommunitySummary::new(0);

        let config = RecommendConfig {
            top_n: 2,
            ..RecommendConfig::default()
        };
        let picks = recommend(9, &my, &community, &config);
        assert_eq!(picks.len(), 2);
        assert_eq!(picks[0].cell_id, cell(4));
        assert_eq!(picks[1].cell_id, cell(3));
    }

    #[test]
    fn test_recommend_empty_views() {
        let empty = CommunitySummary::new(0);
        assert!(recommend(9, &empty, &empty, &RecommendConfig::default()).is_empty());
    }

    #[test]
    fn test_most_active_includes_frequented_cells() {
        let my = summary_of(&[(1, 9, 500.0)]);
        let community = summary_of(&[(2, 9, 40.0)]);

        let active = most_active(9, &my, &community, 10);
        assert_eq!(active.len(), 2);
        assert_eq!(active[0].cell_id, cell(1)); // personal dwell dominates
    }

    #[test]
    fn test_best_hour_picks_hour_with_spread() {
        // Hour 18 has two distinct scores (top normalizes to 1.0); hour 9 is flat.
        let community = summary_of(&[(1, 18, 10.0), (2, 18, 2.0), (1, 9, 5.0)]);
        let my = CommunitySummary::new(0);
        assert_eq!(best_hour(&my, &community), 18);
    }

    #[test]
    fn test_best_hour_empty_defaults_to_zero() {
        let empty = CommunitySummary::new(0);
        assert_eq!(best_hour(&empty, &empty), 0);
    }
}
