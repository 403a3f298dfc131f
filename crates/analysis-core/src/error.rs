use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Timed out after {secs}s fetching {symbol}")]
    Timeout { symbol: String, secs: u64 },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl AnalysisError {
    /// True when the provider reported that the symbol does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AnalysisError::SymbolNotFound(_))
    }
}
