//! Export analysis rows and screen matches to CSV.

use analysis_core::AnalysisRow;
use analysis_orchestrator::ScreenResult;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

pub const HEADER: [&str; 10] = [
    "Ticker",
    "Name",
    "Price",
    "FairValue",
    "MarginOfSafetyPct",
    "RSI14",
    "DrawdownPct",
    "AvgCorrectionPct",
    "Quality",
    "Status",
];

pub const SCREEN_HEADER: [&str; 9] = [
    "Ticker",
    "Name",
    "Price",
    "MarketCap",
    "EpsGrowthPct",
    "DebtToEquity",
    "PayoutRatioPct",
    "DividendYieldPct",
    "PriceToFcf",
];

fn two_dp(value: f64) -> String {
    format!("{:.2}", value)
}

fn optional(value: Option<f64>) -> String {
    value.map(two_dp).unwrap_or_default()
}

fn record(row: &AnalysisRow) -> [String; 10] {
    [
        row.symbol.clone(),
        row.name.clone().unwrap_or_default(),
        two_dp(row.current_price),
        two_dp(row.fair_value),
        two_dp(row.margin_of_safety_pct),
        optional(row.rsi),
        two_dp(row.current_drawdown_pct),
        optional(row.avg_correction_pct),
        row.quality_score.to_string(),
        row.status.as_str().to_string(),
    ]
}

fn screen_record(result: &ScreenResult) -> [String; 9] {
    let m = &result.metrics;
    let pct = |value: Option<f64>| optional(value.map(|v| v * 100.0));
    [
        result.symbol.clone(),
        result.name.clone().unwrap_or_default(),
        two_dp(m.price),
        optional(m.market_cap),
        pct(m.eps_growth),
        optional(m.debt_to_equity),
        pct(m.payout_ratio),
        pct(m.dividend_yield),
        optional(m.price_to_fcf),
    ]
}

pub fn write_rows<W: Write>(writer: W, rows: &[AnalysisRow]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(HEADER)?;
    for row in rows {
        writer.write_record(record(row))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_screen<W: Write>(writer: W, results: &[ScreenResult]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(SCREEN_HEADER)?;
    for result in results {
        writer.write_record(screen_record(result))?;
    }
    writer.flush()?;
    Ok(())
}

fn create(path: &Path) -> Result<std::fs::File> {
    std::fs::File::create(path).with_context(|| format!("cannot create {}", path.display()))
}

pub fn export_csv(path: &Path, rows: &[AnalysisRow]) -> Result<()> {
    write_rows(create(path)?, rows).with_context(|| format!("cannot write {}", path.display()))?;
    tracing::info!("Exported {} rows to {}", rows.len(), path.display());
    Ok(())
}

pub fn export_screen_csv(path: &Path, results: &[ScreenResult]) -> Result<()> {
    write_screen(create(path)?, results).with_context(|| format!("cannot write {}", path.display()))?;
    tracing::info!("Exported {} matches to {}", results.len(), path.display());
    Ok(())
}
