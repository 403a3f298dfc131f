use async_trait::async_trait;
use crate::{AnalysisError, QuoteSnapshot, WatchlistEntry};

/// Source of prices and fundamentals for a single ticker
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Fetch a fresh snapshot covering `history_days` of daily closes.
    ///
    /// Returns `AnalysisError::SymbolNotFound` for unknown symbols; the caller
    /// skips the ticker rather than failing the run.
    async fn fetch_snapshot(&self, symbol: &str, history_days: i64) -> Result<QuoteSnapshot, AnalysisError>;
}

/// Persistence for the list of watched tickers
pub trait WatchlistStore: Send + Sync {
    fn load(&self) -> Result<Vec<WatchlistEntry>, AnalysisError>;
    fn save(&self, entries: &[WatchlistEntry]) -> Result<(), AnalysisError>;
}
