use super::{AnalysisOrchestrator, BatchReport, RowOrder};
use analysis_core::{AnalysisError, AnalysisRow, WatchlistEntry};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Fixed ticker universes for a sector scan. Non-US companies are listed
/// by their US ticker (ADR or OTC line) so the provider can serve them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectorPreset {
    Technology,
    Automotive,
    Financials,
    Consumer,
}

impl SectorPreset {
    pub const ALL: [SectorPreset; 4] = [
        SectorPreset::Technology,
        SectorPreset::Automotive,
        SectorPreset::Financials,
        SectorPreset::Consumer,
    ];

    pub fn symbols(&self) -> &'static [&'static str] {
        match self {
            SectorPreset::Technology => &["AAPL", "MSFT", "NVDA", "ASML", "SAP"],
            SectorPreset::Automotive => &["TSLA", "MBGYF", "BMWYY", "VWAGY", "F"],
            SectorPreset::Financials => &["ALIZY", "JPM", "GS", "DB"],
            SectorPreset::Consumer => &["KO", "PEP", "PG", "LVMUY"],
        }
    }

    /// Every preset's symbols, first occurrence kept
    pub fn all_symbols() -> Vec<&'static str> {
        let mut symbols: Vec<&'static str> = Vec::new();
        for preset in SectorPreset::ALL {
            for symbol in preset.symbols() {
                if !symbols.contains(symbol) {
                    symbols.push(*symbol);
                }
            }
        }
        symbols
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SectorPreset::Technology => "technology",
            SectorPreset::Automotive => "automotive",
            SectorPreset::Financials => "financials",
            SectorPreset::Consumer => "consumer",
        }
    }
}

impl FromStr for SectorPreset {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        SectorPreset::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| {
                AnalysisError::InvalidData(format!(
                    "Unknown sector '{}' (expected technology, automotive, financials or consumer)",
                    s
                ))
            })
    }
}

/// One side of a two-ticker comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonSide {
    pub row: AnalysisRow,
    /// Price change over the fetched history, in percent
    pub period_return_pct: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comparison {
    pub left: ComparisonSide,
    pub right: ComparisonSide,
}

fn period_return_pct(closes: &[f64]) -> Option<f64> {
    let first = *closes.first()?;
    let last = *closes.last()?;
    if first > 0.0 {
        Some((last / first - 1.0) * 100.0)
    } else {
        None
    }
}

impl AnalysisOrchestrator {
    /// Analyse a sector preset, best quality first
    pub async fn scan(&self, sector: SectorPreset) -> BatchReport {
        tracing::info!("Scanning {} sector", sector.as_str());
        let entries: Vec<WatchlistEntry> = sector
            .symbols()
            .iter()
            .map(|s| WatchlistEntry::new(s))
            .collect();
        self.run_batch(&entries, RowOrder::Quality).await
    }

    async fn compare_side(&self, entry: &WatchlistEntry) -> Result<ComparisonSide, AnalysisError> {
        let snapshot = self.fetch(&entry.symbol).await?;
        let row = self.evaluate(&snapshot, entry.fair_pe)?;
        Ok(ComparisonSide {
            period_return_pct: period_return_pct(&snapshot.closes),
            row,
        })
    }

    /// Side-by-side analysis of two tickers, each with its own manual fair
    /// P/E if any; fails if either one fails
    pub async fn compare(&self, left: &WatchlistEntry, right: &WatchlistEntry) -> Result<Comparison, AnalysisError> {
        let (left, right) = tokio::join!(self.compare_side(&left), self.compare_side(&right));
        Ok(Comparison {
            left: left?,
            right: right?,
        })
    }
}
