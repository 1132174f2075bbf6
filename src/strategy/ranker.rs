use crate::models::{ScoreResult, Snapshot};
use std::cmp::Ordering;

/// Order two opportunities, best first
///
/// Higher bullish percentage wins, then more bullish indicators, then the
/// larger absolute distance of price from VWAP. A missing VWAP counts as
/// zero distance.
pub fn compare_opportunity(
    a: (&ScoreResult, &Snapshot),
    b: (&ScoreResult, &Snapshot),
) -> Ordering {
    let (score_a, snap_a) = a;
    let (score_b, snap_b) = b;

    let deviation = |s: &Snapshot| s.vwap_deviation().map(f64::abs).unwrap_or(0.0);

    score_b
        .percentage
        .total_cmp(&score_a.percentage)
        .then_with(|| score_b.bullish_count.cmp(&score_a.bullish_count))
        .then_with(|| deviation(snap_b).total_cmp(&deviation(snap_a)))
}

/// Stable sort of items by opportunity, best first
pub fn rank_by<T, F>(items: &mut [T], key: F)
where
    F: Fn(&T) -> (&ScoreResult, &Snapshot),
{
    items.sort_by(|a, b| compare_opportunity(key(a), key(b)));
}
