// Plain-text reports for analyses and scans
use crate::engine::{Analysis, ScanReport};
use crate::models::IndicatorResult;
use crate::session::MarketStatus;
use std::fmt;

const RULE: &str = "═══════════════════════════════════════════════════════";

fn banner(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(f, "\n╔{}╗", RULE)?;
    writeln!(f, "║{:^55}║", title)?;
    writeln!(f, "╚{}╝\n", RULE)
}

fn status_line(status: MarketStatus) -> &'static str {
    match status {
        MarketStatus::PreMarket => "⏳ PRE-MARKET",
        MarketStatus::Open => "🟢 OPEN",
        MarketStatus::Closed => "🔴 CLOSED",
    }
}

fn format_values(result: &IndicatorResult) -> String {
    result
        .values
        .iter()
        .map(|(name, value)| format!("{}={:.2}", name, value))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Full single-instrument report
impl fmt::Display for Analysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        banner(f, &format!("LIVE TREND ANALYSIS: {}", self.instrument))?;

        writeln!(f, "🕒 SESSION")?;
        writeln!(f, "  Date:                  {}", self.session_date)?;
        writeln!(f, "  Analyzed at:           {}", self.analyzed_at.format("%H:%M:%S UTC"))?;
        writeln!(f, "  Market:                {}", status_line(self.market_status))?;
        writeln!(f, "  Elapsed:               {} min", self.elapsed_minutes)?;
        writeln!(f, "  Closed 5m candles:     {}", self.closed_candles)?;

        let skipped: Vec<&IndicatorResult> = self.skipped_indicators().collect();
        if !skipped.is_empty() {
            writeln!(f, "\n⚠️  SKIPPED INDICATORS (not enough data yet)")?;
            for result in skipped {
                writeln!(
                    f,
                    "  {:<22} {}",
                    result.name(),
                    result.reason.as_deref().unwrap_or("unavailable")
                )?;
            }
        }

        let snap = &self.snapshot;
        writeln!(f, "\n💹 SNAPSHOT")?;
        writeln!(f, "  LTP:                   {:.2}", snap.ltp)?;
        match snap.vwap {
            Some(vwap) => writeln!(
                f,
                "  VWAP:                  {:.2} ({:+.2}%)",
                vwap,
                snap.vwap_deviation().unwrap_or(0.0) * 100.0
            )?,
            None => writeln!(f, "  VWAP:                  n/a")?,
        }
        writeln!(f, "  Day range:             {:.2} - {:.2}", snap.day_low, snap.day_high)?;
        writeln!(f, "  Volume:                {:.0}", snap.volume)?;

        writeln!(f, "\n📊 INDICATORS")?;
        for result in self.indicators.iter().filter(|r| r.available) {
            let mark = if result.bullish { "✅" } else { "❌" };
            writeln!(f, "  {} {:<20} {}", mark, result.name(), result.signal)?;
            if !result.values.is_empty() {
                writeln!(f, "     {}", format_values(result))?;
            }
        }

        let score = &self.score;
        writeln!(f, "\n🎯 VERDICT")?;
        writeln!(
            f,
            "  Score:                 {}/{} bullish ({:.1}%)",
            score.bullish_count, score.available_count, score.percentage
        )?;
        writeln!(f, "  Verdict:               {}", score.verdict)?;
        writeln!(f, "  Action:                {}", score.verdict.action())?;

        if let Some(setup) = &self.trade_setup {
            writeln!(f, "\n💰 TRADE SETUP")?;
            writeln!(f, "  Entry:                 {:.2}", setup.entry)?;
            writeln!(
                f,
                "  Stop loss:             {:.2} ({:+.2}%)",
                setup.stop_loss,
                (setup.stop_loss - setup.entry) / setup.entry * 100.0
            )?;
            writeln!(f, "  Target 1:              {:.2}", setup.target_1)?;
            writeln!(f, "  Target 2:              {:.2}", setup.target_2)?;
        }

        writeln!(f, "\n{}", RULE)
    }
}

/// Ranked scan table with the top pick
impl fmt::Display for ScanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        banner(f, &format!("MARKET SCAN: {}", self.session_date))?;

        if self.ranked.is_empty() {
            writeln!(f, "❌ No instrument could be analyzed")?;
        } else {
            writeln!(
                f,
                "  {:>3}  {:<12} {:>10} {:>7} {:>7}  {}",
                "#", "TOKEN", "LTP", "SCORE", "PCT", "VERDICT"
            )?;
            for (rank, analysis) in self.ranked.iter().enumerate() {
                let score = &analysis.score;
                writeln!(
                    f,
                    "  {:>3}  {:<12} {:>10.2} {:>7} {:>6.1}%  {}",
                    rank + 1,
                    analysis.instrument,
                    analysis.snapshot.ltp,
                    format!("{}/{}", score.bullish_count, score.available_count),
                    score.percentage,
                    score.verdict
                )?;
            }
        }

        if !self.skipped.is_empty() {
            writeln!(f, "\n⚠️  SKIPPED")?;
            for skipped in &self.skipped {
                writeln!(f, "  {:<12} {}", skipped.instrument, skipped.reason)?;
            }
        }

        if let Some(top) = self.top_pick() {
            writeln!(f, "\n🏆 TOP PICK: {} ({})", top.instrument, top.score.verdict.action())?;
            if let Some(setup) = &top.trade_setup {
                writeln!(
                    f,
                    "  Entry {:.2} | SL {:.2} | T1 {:.2} | T2 {:.2}",
                    setup.entry, setup.stop_loss, setup.target_1, setup.target_2
                )?;
            }
        }

        writeln!(f, "\n{}", RULE)
    }
}

pub fn render_analysis(analysis: &Analysis) -> String {
    analysis.to_string()
}

pub fn render_scan(report: &ScanReport) -> String {
    report.to_string()
}
