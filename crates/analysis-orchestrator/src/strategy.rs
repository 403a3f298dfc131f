//! Strategy screens
//!
//! Growth, dividend and momentum presets that filter a ticker universe on
//! fundamentals and price trend. Unlike a sector scan nothing is valued or
//! classified; a ticker either meets every criterion or is rejected with the
//! list of criteria it failed.

use super::{AnalysisOrchestrator, SkippedTicker};
use analysis_core::{AnalysisError, QuoteSnapshot};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use technical_analysis::latest_sma;
use tokio::sync::Semaphore;

/// Trading days averaged for the volume filter (about three months)
const VOLUME_WINDOW: usize = 63;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    Growth,
    Dividend,
    Momentum,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::Growth, Strategy::Dividend, Strategy::Momentum];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Growth => "growth",
            Strategy::Dividend => "dividend",
            Strategy::Momentum => "momentum",
        }
    }

    /// Default thresholds for the strategy
    pub fn filters(&self) -> StrategyFilters {
        let base = StrategyFilters::default();
        match self {
            Strategy::Growth => StrategyFilters {
                min_market_cap: Some(10e9),
                min_eps_growth: Some(0.20),
                max_payout_ratio: Some(0.50),
                max_price_to_fcf: Some(20.0),
                ..base
            },
            Strategy::Dividend => StrategyFilters {
                min_market_cap: Some(2e9),
                min_eps_growth: Some(0.05),
                min_dividend_yield: Some(0.04),
                max_payout_ratio: Some(0.70),
                ..base
            },
            Strategy::Momentum => StrategyFilters {
                min_market_cap: Some(2e9),
                min_eps_growth: Some(0.15),
                max_payout_ratio: Some(0.60),
                above_sma20: true,
                min_premium_to_sma50: Some(0.10),
                above_sma200: true,
                ..base
            },
        }
    }
}

impl FromStr for Strategy {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Strategy::ALL
            .iter()
            .copied()
            .find(|st| st.as_str() == wanted)
            .ok_or_else(|| {
                AnalysisError::InvalidData(format!(
                    "Unknown strategy '{}' (expected growth, dividend or momentum)",
                    s
                ))
            })
    }
}

/// Screen thresholds. `None` (or `false`) disables a criterion; ratios and
/// growth rates are fractions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategyFilters {
    pub min_price: Option<f64>,
    pub min_average_volume: Option<f64>,
    pub min_market_cap: Option<f64>,
    pub min_eps_growth: Option<f64>,
    pub max_debt_to_equity: Option<f64>,
    pub max_payout_ratio: Option<f64>,
    pub min_dividend_yield: Option<f64>,
    pub max_price_to_fcf: Option<f64>,
    pub above_sma20: bool,
    /// Minimum premium of price over the 50-day average
    pub min_premium_to_sma50: Option<f64>,
    pub above_sma200: bool,
}

impl Default for StrategyFilters {
    /// Liquidity floor shared by every strategy
    fn default() -> Self {
        Self {
            min_price: Some(1.0),
            min_average_volume: Some(200_000.0),
            min_market_cap: None,
            min_eps_growth: None,
            max_debt_to_equity: Some(0.5),
            max_payout_ratio: None,
            min_dividend_yield: None,
            max_price_to_fcf: None,
            above_sma20: false,
            min_premium_to_sma50: None,
            above_sma200: false,
        }
    }
}

/// One screen condition, named for reporting rejections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Criterion {
    Price,
    AverageVolume,
    MarketCap,
    EpsGrowth,
    DebtToEquity,
    PayoutRatio,
    DividendYield,
    PriceToFreeCashFlow,
    AboveSma20,
    AboveSma50,
    AboveSma200,
}

impl Criterion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Criterion::Price => "price",
            Criterion::AverageVolume => "avg volume",
            Criterion::MarketCap => "market cap",
            Criterion::EpsGrowth => "EPS growth",
            Criterion::DebtToEquity => "debt/equity",
            Criterion::PayoutRatio => "payout",
            Criterion::DividendYield => "yield",
            Criterion::PriceToFreeCashFlow => "P/FCF",
            Criterion::AboveSma20 => "SMA20",
            Criterion::AboveSma50 => "SMA50",
            Criterion::AboveSma200 => "SMA200",
        }
    }
}

/// Values a screen looks at for one ticker. Missing data stays `None` and
/// fails any criterion that needs it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenMetrics {
    pub price: f64,
    pub average_volume: Option<f64>,
    pub market_cap: Option<f64>,
    pub eps_growth: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub payout_ratio: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub price_to_fcf: Option<f64>,
    pub sma20: Option<f64>,
    pub sma50: Option<f64>,
    pub sma200: Option<f64>,
}

impl ScreenMetrics {
    pub fn from_snapshot(snapshot: &QuoteSnapshot) -> Self {
        let f = &snapshot.fundamentals;
        let price_to_fcf = match (f.market_cap, f.free_cash_flow) {
            (Some(cap), Some(fcf)) if cap.is_finite() && fcf.is_finite() && fcf > 0.0 => Some(cap / fcf),
            _ => None,
        };

        Self {
            price: snapshot.current_price,
            average_volume: latest_sma(&snapshot.volumes, VOLUME_WINDOW),
            market_cap: f.market_cap,
            eps_growth: f.earnings_growth,
            debt_to_equity: f.debt_to_equity,
            payout_ratio: f.payout_ratio,
            dividend_yield: f.dividend_yield,
            price_to_fcf,
            sma20: latest_sma(&snapshot.closes, 20),
            sma50: latest_sma(&snapshot.closes, 50),
            sma200: latest_sma(&snapshot.closes, 200),
        }
    }
}

fn above(value: Option<f64>, min: Option<f64>) -> bool {
    match min {
        None => true,
        Some(min) => value.map_or(false, |v| v > min),
    }
}

fn below(value: Option<f64>, max: Option<f64>) -> bool {
    match max {
        None => true,
        Some(max) => value.map_or(false, |v| v < max),
    }
}

/// A missing average fails
fn above_average(price: Option<f64>, average: Option<f64>) -> bool {
    match (price, average) {
        (Some(p), Some(avg)) => p > avg,
        _ => false,
    }
}

impl StrategyFilters {
    /// Criteria the metrics fail, in a fixed order; empty means a match
    pub fn failed(&self, m: &ScreenMetrics) -> Vec<Criterion> {
        let price = Some(m.price).filter(|p| p.is_finite() && *p > 0.0);
        let sma50_premium = match (price, m.sma50) {
            (Some(p), Some(avg)) if avg > 0.0 => Some(p / avg - 1.0),
            _ => None,
        };

        let checks = [
            (Criterion::Price, above(price, self.min_price)),
            (Criterion::AverageVolume, above(m.average_volume, self.min_average_volume)),
            (Criterion::MarketCap, above(m.market_cap, self.min_market_cap)),
            (Criterion::EpsGrowth, above(m.eps_growth, self.min_eps_growth)),
            (Criterion::DebtToEquity, below(m.debt_to_equity, self.max_debt_to_equity)),
            (Criterion::PayoutRatio, below(m.payout_ratio, self.max_payout_ratio)),
            (Criterion::DividendYield, above(m.dividend_yield, self.min_dividend_yield)),
            (Criterion::PriceToFreeCashFlow, below(m.price_to_fcf, self.max_price_to_fcf)),
            (Criterion::AboveSma20, !self.above_sma20 || above_average(price, m.sma20)),
            (Criterion::AboveSma50, above(sma50_premium, self.min_premium_to_sma50)),
            (Criterion::AboveSma200, !self.above_sma200 || above_average(price, m.sma200)),
        ];

        checks
            .into_iter()
            .filter(|(_, passed)| !passed)
            .map(|(criterion, _)| criterion)
            .collect()
    }
}

/// Screen outcome for one fetched ticker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenResult {
    pub symbol: String,
    pub name: Option<String>,
    pub metrics: ScreenMetrics,
    pub failed: Vec<Criterion>,
}

impl ScreenResult {
    pub fn passed(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Result of one strategy screen, all lists in universe order
#[derive(Debug, Clone, Default)]
pub struct ScreenReport {
    pub matches: Vec<ScreenResult>,
    pub rejected: Vec<ScreenResult>,
    pub skipped: Vec<SkippedTicker>,
}

impl AnalysisOrchestrator {
    async fn screen_symbol(&self, symbol: &str, filters: &StrategyFilters) -> Result<ScreenResult, AnalysisError> {
        let snapshot = self.fetch(symbol).await?;
        let metrics = ScreenMetrics::from_snapshot(&snapshot);
        let failed = filters.failed(&metrics);
        tracing::debug!("{}: failed {:?}", snapshot.symbol, failed);

        Ok(ScreenResult {
            symbol: snapshot.symbol,
            name: snapshot.name,
            metrics,
            failed,
        })
    }

    /// Screen every symbol concurrently. Fetch failures are reported in
    /// `skipped` and never abort the screen.
    pub async fn screen(&self, symbols: &[String], filters: StrategyFilters) -> ScreenReport {
        tracing::info!("Screening {} tickers", symbols.len());

        let semaphore = Arc::new(Semaphore::new(self.settings.concurrency.max(1)));
        let mut handles = Vec::with_capacity(symbols.len());

        for symbol in symbols {
            let orchestrator = self.clone();
            let semaphore = Arc::clone(&semaphore);
            let symbol = symbol.clone();

            handles.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                orchestrator.screen_symbol(&symbol, &filters).await
            }));
        }

        let mut report = ScreenReport::default();
        for (handle, symbol) in handles.into_iter().zip(symbols) {
            let outcome = handle
                .await
                .unwrap_or_else(|e| Err(AnalysisError::ProviderUnavailable(e.to_string())));
            match outcome {
                Ok(result) if result.passed() => report.matches.push(result),
                Ok(result) => report.rejected.push(result),
                Err(reason) => {
                    tracing::warn!("Skipping {}: {}", symbol, reason);
                    report.skipped.push(SkippedTicker {
                        symbol: symbol.clone(),
                        reason,
                    });
                }
            }
        }

        tracing::info!(
            "Screen complete: {} matched, {} rejected, {} skipped",
            report.matches.len(),
            report.rejected.len(),
            report.skipped.len()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use analysis_core::Fundamentals;

    /// Steady uptrend with a breakout on the last day
    fn breakout(len: usize) -> Vec<f64> {
        let mut closes: Vec<f64> = (0..len - 1).map(|i| 100.0 + i as f64 * 0.5).collect();
        closes.push(260.0);
        closes
    }

    fn screened(fundamentals: Fundamentals, closes: Vec<f64>) -> QuoteSnapshot {
        let price = *closes.last().unwrap();
        QuoteSnapshot {
            symbol: "TEST".to_string(),
            name: None,
            current_price: price,
            volumes: vec![1_000_000.0; closes.len()],
            closes,
            fundamentals,
        }
    }

    fn dividend_payer() -> Fundamentals {
        Fundamentals {
            market_cap: Some(3e9),
            earnings_growth: Some(0.06),
            dividend_yield: Some(0.05),
            debt_to_equity: Some(0.4),
            payout_ratio: Some(0.6),
            ..Default::default()
        }
    }

    fn failed(strategy: Strategy, snapshot: &QuoteSnapshot) -> Vec<Criterion> {
        strategy.filters().failed(&ScreenMetrics::from_snapshot(snapshot))
    }

    #[test]
    fn test_dividend_screen() {
        let snap = screened(dividend_payer(), breakout(80));
        assert!(failed(Strategy::Dividend, &snap).is_empty());

        let stretched = Fundamentals {
            payout_ratio: Some(0.9),
            dividend_yield: None,
            ..dividend_payer()
        };
        assert_eq!(
            failed(Strategy::Dividend, &screened(stretched, breakout(80))),
            vec![Criterion::PayoutRatio, Criterion::DividendYield]
        );
    }

    #[test]
    fn test_growth_screen_caps_price_to_fcf() {
        let grower = Fundamentals {
            market_cap: Some(50e9),
            earnings_growth: Some(0.25),
            debt_to_equity: Some(0.3),
            payout_ratio: Some(0.0),
            free_cash_flow: Some(5e9),
            ..Default::default()
        };
        assert!(failed(Strategy::Growth, &screened(grower.clone(), breakout(80))).is_empty());

        let expensive = Fundamentals {
            free_cash_flow: Some(1e9),
            ..grower
        };
        assert_eq!(
            failed(Strategy::Growth, &screened(expensive, breakout(80))),
            vec![Criterion::PriceToFreeCashFlow]
        );
    }

    #[test]
    fn test_momentum_needs_trend() {
        let fundamentals = Fundamentals {
            market_cap: Some(5e9),
            earnings_growth: Some(0.2),
            debt_to_equity: Some(0.3),
            payout_ratio: Some(0.2),
            ..Default::default()
        };
        assert!(failed(Strategy::Momentum, &screened(fundamentals.clone(), breakout(251))).is_empty());

        // Steady climb without a breakout: under 10% above SMA50
        let steady: Vec<f64> = (0..251).map(|i| 100.0 + i as f64 * 0.5).collect();
        assert_eq!(
            failed(Strategy::Momentum, &screened(fundamentals.clone(), steady)),
            vec![Criterion::AboveSma50]
        );

        // Too little history for the 200-day average
        assert_eq!(
            failed(Strategy::Momentum, &screened(fundamentals, breakout(120))),
            vec![Criterion::AboveSma200]
        );
    }

    #[test]
    fn test_missing_metrics_fail() {
        let snap = screened(Fundamentals::default(), vec![0.5; 10]);
        let failures = failed(Strategy::Dividend, &snap);
        assert_eq!(failures[0], Criterion::Price);
        assert!(failures.contains(&Criterion::AverageVolume));
        assert!(failures.contains(&Criterion::DebtToEquity));
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!("Dividend".parse::<Strategy>().unwrap(), Strategy::Dividend);
        assert!("value".parse::<Strategy>().is_err());
    }

    #[tokio::test]
    async fn test_screen_splits_matches_rejections_and_skips() {
        let mut payer = screened(dividend_payer(), breakout(80));
        payer.symbol = "KO".to_string();
        let mut cutter = screened(
            Fundamentals {
                dividend_yield: Some(0.01),
                ..dividend_payer()
            },
            breakout(80),
        );
        cutter.symbol = "PEP".to_string();

        let orch = AnalysisOrchestrator::with_defaults(Arc::new(StaticProvider::new(vec![payer, cutter])));
        let symbols: Vec<String> = ["PEP", "NOPE", "KO"].iter().map(|s| s.to_string()).collect();
        let report = orch.screen(&symbols, Strategy::Dividend.filters()).await;

        assert_eq!(report.matches.len(), 1);
        assert_eq!(report.matches[0].symbol, "KO");
        assert_eq!(report.rejected[0].symbol, "PEP");
        assert_eq!(report.rejected[0].failed, vec![Criterion::DividendYield]);
        assert_eq!(report.skipped[0].symbol, "NOPE");
    }
}
