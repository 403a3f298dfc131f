//! Plain-text rendering for the terminal.

use analysis_core::{AnalysisRow, DataCompleteness, WatchlistEntry};
use analysis_orchestrator::{BatchReport, Comparison, ComparisonSide, ScreenReport, ScreenResult};
use std::fmt::Write;
use technical_analysis::RsiZone;

const NAME_WIDTH: usize = 22;

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let cut: String = text.chars().take(width.saturating_sub(1)).collect();
        format!("{}~", cut)
    }
}

fn opt(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", decimals, v),
        None => "n/a".to_string(),
    }
}

fn pct(value: Option<f64>) -> String {
    opt(value.map(|v| v * 100.0), 1)
}

fn models(row: &AnalysisRow) -> String {
    if row.completeness == DataCompleteness::PriceOnly {
        return "price only".to_string();
    }
    row.models_used
        .iter()
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .join("+")
}

pub fn render_rows(rows: &[AnalysisRow]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<9} {:<name$} {:>10} {:>10} {:>7} {:>6} {:<10} {:>7} {:>8} {:>4}  {:<11} {}",
        "Ticker",
        "Name",
        "Price",
        "Fair",
        "MoS%",
        "RSI",
        "Zone",
        "DD%",
        "AvgCor%",
        "Q",
        "Status",
        "Models",
        name = NAME_WIDTH
    );
    for row in rows {
        let _ = writeln!(
            out,
            "{:<9} {:<name$} {:>10.2} {:>10.2} {:>7.1} {:>6} {:<10} {:>7.1} {:>8} {:>4}  {:<11} {}",
            row.symbol,
            truncate(row.name.as_deref().unwrap_or(""), NAME_WIDTH),
            row.current_price,
            row.fair_value,
            row.margin_of_safety_pct,
            opt(row.rsi, 1),
            RsiZone::from_rsi(row.rsi).as_str(),
            row.current_drawdown_pct,
            opt(row.avg_correction_pct, 1),
            format!("{}/10", row.quality_score),
            row.status.as_str(),
            models(row),
            name = NAME_WIDTH
        );
    }
    out
}

pub fn render_report(report: &BatchReport) -> String {
    let mut out = render_rows(&report.rows);
    if !report.skipped.is_empty() {
        let _ = writeln!(out, "\nSkipped:");
        for skipped in &report.skipped {
            let _ = writeln!(out, "  {:<9} {}", skipped.symbol, skipped.reason);
        }
    }
    out
}

fn screen_line(out: &mut String, result: &ScreenResult) {
    let m = &result.metrics;
    let _ = writeln!(
        out,
        "{:<9} {:<name$} {:>10.2} {:>9} {:>7} {:>6} {:>8} {:>7} {:>7}",
        result.symbol,
        truncate(result.name.as_deref().unwrap_or(""), NAME_WIDTH),
        m.price,
        opt(m.market_cap.map(|c| c / 1e9), 1),
        pct(m.eps_growth),
        opt(m.debt_to_equity, 2),
        pct(m.payout_ratio),
        pct(m.dividend_yield),
        opt(m.price_to_fcf, 1),
        name = NAME_WIDTH
    );
}

pub fn render_screen(report: &ScreenReport) -> String {
    let mut out = String::new();
    if report.matches.is_empty() {
        let _ = writeln!(out, "No matches; the filters may be too strict");
    } else {
        let _ = writeln!(
            out,
            "{:<9} {:<name$} {:>10} {:>9} {:>7} {:>6} {:>8} {:>7} {:>7}",
            "Ticker",
            "Name",
            "Price",
            "Cap($B)",
            "EPSg%",
            "D/E",
            "Payout%",
            "Yield%",
            "P/FCF",
            name = NAME_WIDTH
        );
        for result in &report.matches {
            screen_line(&mut out, result);
        }
    }

    if !report.rejected.is_empty() {
        let _ = writeln!(out, "\nRejected:");
        for result in &report.rejected {
            let failed: Vec<&str> = result.failed.iter().map(|c| c.as_str()).collect();
            let _ = writeln!(out, "  {:<9} {}", result.symbol, failed.join(", "));
        }
    }
    if !report.skipped.is_empty() {
        let _ = writeln!(out, "\nSkipped:");
        for skipped in &report.skipped {
            let _ = writeln!(out, "  {:<9} {}", skipped.symbol, skipped.reason);
        }
    }
    out
}

pub fn render_watchlist(entries: &[WatchlistEntry]) -> String {
    if entries.is_empty() {
        return "Watchlist is empty\n".to_string();
    }
    let mut out = String::new();
    let _ = writeln!(out, "{:<9} {:>8}", "Ticker", "FairPE");
    for entry in entries {
        let _ = writeln!(out, "{:<9} {:>8}", entry.symbol, opt(entry.fair_pe, 1));
    }
    out
}

pub fn render_comparison(cmp: &Comparison) -> String {
    let lines: [(&str, fn(&ComparisonSide) -> String); 10] = [
        ("Name", |s| s.row.name.clone().unwrap_or_default()),
        ("Price", |s| format!("{:.2}", s.row.current_price)),
        ("Quality", |s| format!("{}/10", s.row.quality_score)),
        ("RSI", |s| opt(s.row.rsi, 1)),
        ("RSI zone", |s| RsiZone::from_rsi(s.row.rsi).as_str().to_string()),
        ("Fair value", |s| format!("{:.2}", s.row.fair_value)),
        ("MoS %", |s| format!("{:.1}%", s.row.margin_of_safety_pct)),
        ("Return %", |s| opt(s.period_return_pct, 1)),
        ("Max DD %", |s| format!("{:.1}", s.row.max_drawdown_pct)),
        ("Status", |s| s.row.status.as_str().to_string()),
    ];

    let mut out = String::new();
    let _ = writeln!(out, "{:<12} {:>24} {:>24}", "", cmp.left.row.symbol, cmp.right.row.symbol);
    for (label, value) in lines {
        let _ = writeln!(
            out,
            "{:<12} {:>24} {:>24}",
            label,
            truncate(&value(&cmp.left), 24),
            truncate(&value(&cmp.right), 24)
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::{SignalLabel, ValuationModel};

    fn row(symbol: &str) -> AnalysisRow {
        AnalysisRow {
            symbol: symbol.to_string(),
            name: Some("A Very Long Company Name Incorporated".to_string()),
            current_price: 100.0,
            fair_value: 125.0,
            margin_of_safety_pct: 20.0,
            rsi: Some(33.3),
            current_drawdown_pct: -12.0,
            avg_correction_pct: None,
            max_drawdown_pct: -30.0,
            quality_score: 6,
            models_used: vec![ValuationModel::AssetBased, ValuationModel::DiscountedCashFlow],
            completeness: DataCompleteness::Complete,
            status: SignalLabel::StrongBuy,
        }
    }

    #[test]
    fn test_row_rendering() {
        let text = render_rows(&[row("AAPL")]);
        let line = text.lines().nth(1).unwrap();
        assert!(line.starts_with("AAPL"));
        assert!(line.contains("STRONG BUY"));
        assert!(line.contains("Graham+DCF"));
        assert!(line.contains("Oversold"));
        // no correction history
        assert!(line.contains("n/a"));
        assert!(line.contains("6/10"));
        assert!(line.contains("A Very Long Company N~"));
    }

    #[test]
    fn test_comparison_shows_max_drawdown() {
        let side = |symbol: &str| ComparisonSide {
            row: row(symbol),
            period_return_pct: Some(12.5),
        };
        let text = render_comparison(&Comparison {
            left: side("AAPL"),
            right: side("MSFT"),
        });
        let line = text.lines().find(|l| l.starts_with("Max DD %")).unwrap();
        assert!(line.contains("-30.0"));
        assert_eq!(text.lines().count(), 11);
    }

    #[test]
    fn test_screen_rendering() {
        use analysis_orchestrator::{Criterion, ScreenMetrics, SkippedTicker};
        use analysis_core::AnalysisError;

        let metrics = ScreenMetrics {
            price: 60.0,
            average_volume: Some(1e7),
            market_cap: Some(260e9),
            eps_growth: Some(0.08),
            debt_to_equity: Some(0.45),
            payout_ratio: Some(0.65),
            dividend_yield: Some(0.031),
            price_to_fcf: None,
            sma20: None,
            sma50: None,
            sma200: None,
        };
        let report = ScreenReport {
            matches: vec![ScreenResult {
                symbol: "KO".to_string(),
                name: Some("Coca-Cola Co".to_string()),
                metrics,
                failed: vec![],
            }],
            rejected: vec![ScreenResult {
                symbol: "PEP".to_string(),
                name: None,
                metrics,
                failed: vec![Criterion::PayoutRatio, Criterion::DividendYield],
            }],
            skipped: vec![SkippedTicker {
                symbol: "NOPE".to_string(),
                reason: AnalysisError::SymbolNotFound("NOPE".to_string()),
            }],
        };

        let text = render_screen(&report);
        let ko = text.lines().nth(1).unwrap();
        assert!(ko.starts_with("KO"));
        assert!(ko.contains("260.0"));
        assert!(ko.contains("3.1"));
        assert!(text.contains("PEP       payout, yield"));
        assert!(text.contains("NOPE"));
    }

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("Société Générale", 7), "Sociét~");
        assert_eq!(truncate("KO", 7), "KO");
    }

    #[test]
    fn test_watchlist_rendering() {
        let entries = vec![WatchlistEntry::new("KO").with_fair_pe(22.0), WatchlistEntry::new("F")];
        let text = render_watchlist(&entries);
        assert!(text.contains("22.0"));
        assert_eq!(text.lines().count(), 3);
        assert_eq!(render_watchlist(&[]), "Watchlist is empty\n");
    }
}
