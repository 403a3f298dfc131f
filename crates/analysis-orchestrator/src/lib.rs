//! Analysis Orchestrator
//!
//! Runs the per-ticker pipeline (quote provider, technical indicators, fair
//! value, classifier) and fans it out over a watchlist with bounded
//! concurrency.

pub mod screener;
pub mod strategy;

pub use screener::{Comparison, ComparisonSide, SectorPreset};
pub use strategy::{Criterion, ScreenMetrics, ScreenReport, ScreenResult, Strategy, StrategyFilters};

use analysis_core::{
    AnalysisError, AnalysisRow, DataCompleteness, QuoteProvider, QuoteSnapshot, TickerOutcome,
    WatchlistEntry,
};
use fundamental_analysis::{quality_score, FairValueEstimator};
use serde::{Deserialize, Serialize};
use signal_classifier::{SignalClassifier, SignalInputs};
use std::cmp::Ordering;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use technical_analysis::TechnicalSnapshot;
use tokio::sync::Semaphore;

pub const DEFAULT_CONCURRENCY: usize = 4;
pub const DEFAULT_HISTORY_DAYS: i64 = 365;
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrchestratorSettings {
    /// Tickers fetched at the same time
    pub concurrency: usize,
    /// Upper bound on one provider fetch, rate-limiter waits included.
    /// Size it to the provider's request budget for `concurrency` fetches.
    pub fetch_timeout: Duration,
    pub history_days: i64,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            history_days: DEFAULT_HISTORY_DAYS,
        }
    }
}

/// Row ordering for a batch. Sorts are stable, so ties keep input order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowOrder {
    #[default]
    Input,
    /// Highest margin of safety first
    MarginOfSafety,
    /// Highest quality score first
    Quality,
}

impl RowOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            RowOrder::Input => "input",
            RowOrder::MarginOfSafety => "margin",
            RowOrder::Quality => "quality",
        }
    }

    pub fn apply(&self, rows: &mut [AnalysisRow]) {
        match self {
            RowOrder::Input => {}
            RowOrder::MarginOfSafety => rows.sort_by(|a, b| {
                b.margin_of_safety_pct
                    .partial_cmp(&a.margin_of_safety_pct)
                    .unwrap_or(Ordering::Equal)
            }),
            RowOrder::Quality => rows.sort_by(|a, b| b.quality_score.cmp(&a.quality_score)),
        }
    }
}

impl FromStr for RowOrder {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "input" => Ok(RowOrder::Input),
            "margin" | "mos" => Ok(RowOrder::MarginOfSafety),
            "quality" => Ok(RowOrder::Quality),
            other => Err(AnalysisError::InvalidData(format!(
                "Unknown row order '{}' (expected input, margin or quality)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SkippedTicker {
    pub symbol: String,
    pub reason: AnalysisError,
}

/// Result of one pass over a list of tickers
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub rows: Vec<AnalysisRow>,
    pub skipped: Vec<SkippedTicker>,
}

impl BatchReport {
    /// Split outcomes (given in input order) into rows and skips, then order the rows
    pub fn from_outcomes(outcomes: Vec<TickerOutcome>, order: RowOrder) -> Self {
        let mut report = Self::default();
        for outcome in outcomes {
            match outcome {
                TickerOutcome::Computed(row) => report.rows.push(row),
                TickerOutcome::Skipped { symbol, reason } => {
                    report.skipped.push(SkippedTicker { symbol, reason })
                }
            }
        }
        order.apply(&mut report.rows);
        report
    }
}

/// Per-ticker pipeline plus batch runner. Cheap to clone; clones share the
/// provider and engines.
#[derive(Clone)]
pub struct AnalysisOrchestrator {
    provider: Arc<dyn QuoteProvider>,
    estimator: Arc<FairValueEstimator>,
    classifier: Arc<SignalClassifier>,
    settings: OrchestratorSettings,
}

impl AnalysisOrchestrator {
    pub fn new(
        provider: Arc<dyn QuoteProvider>,
        estimator: FairValueEstimator,
        classifier: SignalClassifier,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            provider,
            estimator: Arc::new(estimator),
            classifier: Arc::new(classifier),
            settings,
        }
    }

    pub fn with_defaults(provider: Arc<dyn QuoteProvider>) -> Self {
        Self::new(
            provider,
            FairValueEstimator::default(),
            SignalClassifier::default(),
            OrchestratorSettings::default(),
        )
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Fetch a snapshot, bounded by the fetch timeout
    pub async fn fetch(&self, symbol: &str) -> Result<QuoteSnapshot, AnalysisError> {
        let timeout = self.settings.fetch_timeout;
        match tokio::time::timeout(
            timeout,
            self.provider.fetch_snapshot(symbol, self.settings.history_days),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(AnalysisError::Timeout {
                symbol: symbol.to_string(),
                secs: timeout.as_secs(),
            }),
        }
    }

    /// Pure part of the pipeline: indicators, valuation and label for one snapshot
    pub fn evaluate(&self, snapshot: &QuoteSnapshot, manual_pe: Option<f64>) -> Result<AnalysisRow, AnalysisError> {
        let price = snapshot.current_price;
        if !price.is_finite() || price <= 0.0 {
            return Err(AnalysisError::InvalidData(format!(
                "{}: current price {} is not positive",
                snapshot.symbol, price
            )));
        }

        let technical = TechnicalSnapshot::from_closes(&snapshot.closes)?;
        let estimate = self.estimator.estimate(&snapshot.fundamentals, price, manual_pe);

        let status = self.classifier.classify(&SignalInputs {
            margin_of_safety_pct: estimate.margin_of_safety_pct,
            rsi: technical.rsi,
            current_drawdown_pct: technical.current_drawdown_pct,
            avg_correction_pct: technical.avg_correction_pct,
        });

        let completeness = if estimate.is_price_fallback() {
            DataCompleteness::PriceOnly
        } else if technical.rsi.is_none() {
            DataCompleteness::Partial
        } else {
            DataCompleteness::Complete
        };

        Ok(AnalysisRow {
            symbol: snapshot.symbol.clone(),
            name: snapshot.name.clone(),
            current_price: price,
            fair_value: estimate.fair_value,
            margin_of_safety_pct: estimate.margin_of_safety_pct,
            rsi: technical.rsi,
            current_drawdown_pct: technical.current_drawdown_pct,
            avg_correction_pct: technical.avg_correction_pct,
            max_drawdown_pct: technical.max_drawdown_pct,
            quality_score: quality_score(&snapshot.fundamentals),
            models_used: estimate.models_used(),
            completeness,
            status,
        })
    }

    /// Fetch and evaluate one watchlist entry
    pub async fn analyze_symbol(&self, entry: &WatchlistEntry) -> Result<AnalysisRow, AnalysisError> {
        let snapshot = self.fetch(&entry.symbol).await?;
        let row = self.evaluate(&snapshot, entry.fair_pe)?;

        tracing::info!(
            "{}: price {:.2}, fair {:.2} ({:+.1}%), {} [{:?}]",
            row.symbol,
            row.current_price,
            row.fair_value,
            row.margin_of_safety_pct,
            row.status,
            row.completeness
        );
        Ok(row)
    }

    async fn outcome(&self, entry: &WatchlistEntry) -> TickerOutcome {
        match self.analyze_symbol(entry).await {
            Ok(row) => TickerOutcome::Computed(row),
            Err(reason) => {
                tracing::warn!("Skipping {}: {}", entry.symbol, reason);
                TickerOutcome::Skipped {
                    symbol: entry.symbol.clone(),
                    reason,
                }
            }
        }
    }

    /// Analyse every entry concurrently. A failing ticker is reported in
    /// `skipped` and never aborts the batch.
    pub async fn run_batch(&self, entries: &[WatchlistEntry], order: RowOrder) -> BatchReport {
        tracing::info!(
            "Analysing {} tickers (concurrency {})",
            entries.len(),
            self.settings.concurrency
        );

        let semaphore = Arc::new(Semaphore::new(self.settings.concurrency.max(1)));
        let mut handles = Vec::with_capacity(entries.len());

        for entry in entries {
            let orchestrator = self.clone();
            let semaphore = Arc::clone(&semaphore);
            let entry = entry.clone();

            handles.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                orchestrator.outcome(&entry).await
            }));
        }

        // Awaiting in spawn order keeps outcomes in input order
        let mut outcomes = Vec::with_capacity(handles.len());
        for (handle, entry) in handles.into_iter().zip(entries) {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    tracing::error!("Task for {} failed: {}", entry.symbol, e);
                    outcomes.push(TickerOutcome::Skipped {
                        symbol: entry.symbol.clone(),
                        reason: AnalysisError::ProviderUnavailable(e.to_string()),
                    });
                }
            }
        }

        let report = BatchReport::from_outcomes(outcomes, order);
        tracing::info!(
            "Batch complete: {} analysed, {} skipped",
            report.rows.len(),
            report.skipped.len()
        );
        report
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use analysis_core::Fundamentals;
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// In-memory provider; unknown symbols are not found
    pub struct StaticProvider {
        pub snapshots: HashMap<String, QuoteSnapshot>,
        pub delay: Option<Duration>,
    }

    impl StaticProvider {
        pub fn new(snapshots: Vec<QuoteSnapshot>) -> Self {
            Self {
                snapshots: snapshots.into_iter().map(|s| (s.symbol.clone(), s)).collect(),
                delay: None,
            }
        }
    }

    #[async_trait]
    impl QuoteProvider for StaticProvider {
        async fn fetch_snapshot(&self, symbol: &str, _history_days: i64) -> Result<QuoteSnapshot, AnalysisError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.snapshots
                .get(symbol)
                .cloned()
                .ok_or_else(|| AnalysisError::SymbolNotFound(symbol.to_string()))
        }
    }

    /// Rising series with a pullback, long enough for RSI(14)
    pub fn closes(end: f64) -> Vec<f64> {
        let mut closes: Vec<f64> = (0..30).map(|i| 80.0 + i as f64).collect();
        closes.extend([100.0, 96.0, 92.0, end]);
        closes
    }

    pub fn snapshot(symbol: &str, price: f64, fundamentals: Fundamentals) -> QuoteSnapshot {
        QuoteSnapshot {
            symbol: symbol.to_string(),
            name: Some(format!("{} Corp", symbol)),
            current_price: price,
            volumes: vec![1_000_000.0; closes(price).len()],
            closes: closes(price),
            fundamentals,
        }
    }
}
