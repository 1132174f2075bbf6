use crate::models::{ScoreResult, Snapshot, TradeSetup};

/// Build the trade setup for an actionable verdict
///
/// Entry is the last traded price and risk is taken to VWAP. When price is
/// not above VWAP (or there is no VWAP yet) the stop falls back to the
/// session low.
pub fn build_trade_setup(
    score: &ScoreResult,
    snapshot: &Snapshot,
    target_1_pct: f64,
    target_2_pct: f64,
) -> Option<TradeSetup> {
    if !score.verdict.is_actionable() {
        return None;
    }

    let entry = snapshot.ltp;
    let stop_loss = match snapshot.vwap {
        Some(vwap) if entry > vwap => vwap,
        _ => snapshot.day_low,
    };

    Some(TradeSetup {
        entry,
        stop_loss,
        target_1: entry * (1.0 + target_1_pct / 100.0),
        target_2: entry * (1.0 + target_2_pct / 100.0),
    })
}
