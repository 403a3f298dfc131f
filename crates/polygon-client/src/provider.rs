use analysis_core::{AnalysisError, Fundamentals, QuoteProvider, QuoteSnapshot};
use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::{build_fundamentals, trailing_dividends_per_share, PolygonClient};

/// Two years of quarters: one TTM window plus the prior year for growth
const FINANCIAL_QUARTERS: u32 = 8;
const DIVIDEND_LIMIT: u32 = 12;

#[async_trait]
impl QuoteProvider for PolygonClient {
    async fn fetch_snapshot(&self, symbol: &str, history_days: i64) -> Result<QuoteSnapshot, AnalysisError> {
        let to = Utc::now();
        let from = to - Duration::days(history_days.max(1));
        let features = self.features();

        tracing::debug!(
            "Fetching {} ({} days of history, {} requests)",
            symbol,
            history_days,
            features.requests_per_fetch()
        );

        let (bars_result, financials_result, details_result, dividends_result, snapshot_result, consensus_result) = tokio::join!(
            self.get_aggregates(symbol, 1, "day", from, to),
            self.get_financials(symbol, FINANCIAL_QUARTERS),
            self.get_ticker_details(symbol),
            self.get_dividends(symbol, DIVIDEND_LIMIT),
            async {
                if features.live_snapshot {
                    Some(self.get_snapshot(symbol).await)
                } else {
                    None
                }
            },
            async {
                if features.analyst_targets {
                    self.get_consensus_target(symbol).await
                } else {
                    Ok(None)
                }
            },
        );

        // Price history is required; everything else degrades to absent fields
        let bars = bars_result?;
        if bars.is_empty() {
            return Err(AnalysisError::SymbolNotFound(symbol.to_string()));
        }
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();

        let snapshot_price = match &snapshot_result {
            Some(Ok(snap)) => snap.last_price(),
            Some(Err(e)) => {
                tracing::warn!("Snapshot unavailable for {}: {}", symbol, e);
                None
            }
            None => None,
        };
        let current_price = match snapshot_price.or_else(|| closes.last().copied()) {
            Some(price) => price,
            None => return Err(AnalysisError::InsufficientData(format!("no price for {}", symbol))),
        };

        let quarters = financials_result.unwrap_or_else(|e| {
            tracing::warn!("Financials unavailable for {}: {}", symbol, e);
            Vec::new()
        });

        let details = details_result
            .map_err(|e| tracing::warn!("Ticker details unavailable for {}: {}", symbol, e))
            .ok();

        let consensus = consensus_result.unwrap_or_else(|e| {
            tracing::warn!("Consensus target unavailable for {}: {}", symbol, e);
            None
        });

        let dividends_per_share = match &dividends_result {
            Ok(dividends) => Some(trailing_dividends_per_share(dividends)),
            Err(e) => {
                tracing::warn!("Dividends unavailable for {}: {}", symbol, e);
                None
            }
        };

        let fundamentals = Fundamentals {
            analyst_target_price: consensus.filter(|t| *t > 0.0),
            ..build_fundamentals(&quarters, details.as_ref(), current_price, dividends_per_share)
        };

        tracing::debug!(
            "{}: {} closes, {} quarters, missing {:?}",
            symbol,
            closes.len(),
            quarters.len(),
            fundamentals.missing()
        );

        Ok(QuoteSnapshot {
            symbol: symbol.to_string(),
            name: details.map(|d| d.name),
            current_price,
            closes,
            volumes,
            fundamentals,
        })
    }
}
