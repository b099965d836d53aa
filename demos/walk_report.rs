//! End-to-end walk analytics: summarize traces, merge peer data, recommend.
//!
//! Run with: cargo run --example walk_report

use chrono::FixedOffset;
use walk_analytics::{
    best_hour, build_my_history, build_walk_summary, merge_sparse, most_active, recommend,
    CellHourEntry, CommunitySummary, GpsPoint, RecommendConfig, SummaryConfig, Walk,
};

fn main() {
    env_logger::init();

    let now_ms: i64 = 1_700_000_000_000;
    let hour_ms: i64 = 3_600_000;

    // An evening walk around Madrid's Retiro park, one fix every 30s
    let walk = Walk {
        id: "walk-1".to_string(),
        started_at_ms: now_ms - 2 * hour_ms,
        ended_at_ms: Some(now_ms - 2 * hour_ms + 150_000),
        points: vec![
            GpsPoint::with_accuracy(40.4150, -3.6840, now_ms - 2 * hour_ms, 8.0),
            GpsPoint::with_accuracy(40.4155, -3.6845, now_ms - 2 * hour_ms + 30_000, 10.0),
            GpsPoint::with_accuracy(40.4160, -3.6850, now_ms - 2 * hour_ms + 60_000, 12.0),
            GpsPoint::with_accuracy(40.4165, -3.6855, now_ms - 2 * hour_ms + 90_000, 9.0),
            GpsPoint::with_accuracy(40.4170, -3.6860, now_ms - 2 * hour_ms + 120_000, 11.0),
            GpsPoint::with_accuracy(40.4175, -3.6865, now_ms - 2 * hour_ms + 150_000, 7.0),
        ],
        encounters: vec![],
    };

    let config = SummaryConfig::default();
    let summary = build_walk_summary(&walk, &config).expect("walk has ended");

    println!("Walk summary");
    println!("  distance: {:.0}m over {}s", summary.distance_m, summary.duration_sec);
    println!("  cells visited: {}", summary.cells.len());
    println!("  path: {} cells", summary.path_cells.len());

    // Personal history over the last 30 days, bucketed by local hour (CET)
    let cet = FixedOffset::east_opt(3600).expect("valid offset");
    let my = build_my_history(&[summary], now_ms, cet);

    // Simulate a peer-supplied community batch around the same park
    let peer_batch: Vec<CellHourEntry> = my
        .to_sparse_entries()
        .into_iter()
        .map(|mut entry| {
            entry.cell_id.gx += 2; // a couple of cells east
            entry.score *= 4.0;
            entry
        })
        .collect();
    let community = merge_sparse(&CommunitySummary::new(now_ms), &peer_batch, now_ms);

    let hour = peer_batch.first().map_or(18, |e| e.hour);
    println!("\nRecommendations for hour {hour}:");
    for pick in recommend(hour, &my, &community, &RecommendConfig::default()) {
        println!("  {} score {:.2}", pick.cell_id, pick.score);
    }

    println!("\nMost active for hour {hour}:");
    for item in most_active(hour, &my, &community, 5) {
        println!("  {} score {:.2}", item.cell_id, item.score);
    }

    println!("\nBest hour of day: {}", best_hour(&my, &community));
}
