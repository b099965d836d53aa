//! Parallel batch summarization of a month of walks.
//!
//! Run with: cargo run --example batch_history --features parallel

use chrono::FixedOffset;
use walk_analytics::{
    build_my_history, build_walk_summaries, GpsPoint, SummaryConfig, Walk,
};

fn main() {
    env_logger::init();

    let now_ms: i64 = 1_700_000_000_000;
    let day_ms: i64 = 24 * 3_600_000;

    // One 10-minute walk per day for 30 days, shifting start location slightly
    let walks: Vec<Walk> = (0..30)
        .map(|day| {
            let started_at_ms = now_ms - day * day_ms;
            let lat0 = 40.4150 + (day % 5) as f64 * 0.0005;
            let points: Vec<GpsPoint> = (0..20)
                .map(|i| {
                    GpsPoint::with_accuracy(
                        lat0 + i as f64 * 0.0002,
                        -3.6840,
                        started_at_ms + i * 30_000,
                        10.0,
                    )
                })
                .collect();
            Walk {
                id: format!("walk-{day}"),
                started_at_ms,
                ended_at_ms: Some(started_at_ms + 600_000),
                points,
                encounters: vec![],
            }
        })
        .collect();

    let start = std::time::Instant::now();
    let summaries = build_walk_summaries(&walks, &SummaryConfig::default());
    println!(
        "Summarized {} walks in {:?}",
        summaries.len(),
        start.elapsed()
    );

    let total_distance: f64 = summaries.iter().map(|s| s.distance_m).sum();
    println!("Total distance: {:.1}km", total_distance / 1000.0);

    let cet = FixedOffset::east_opt(3600).expect("valid offset");
    let history = build_my_history(&summaries, now_ms, cet);
    println!(
        "History covers {} cells across the 30-day window",
        history.len()
    );
}
