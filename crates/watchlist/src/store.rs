use analysis_core::{AnalysisError, WatchlistEntry, WatchlistStore};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const HEADER: [&str; 2] = ["Ticker", "FairPE"];

/// Tickers shown on first start
pub const SEED_SYMBOLS: [&str; 3] = ["AAPL", "MSFT", "TSLA"];

pub fn seed_entries() -> Vec<WatchlistEntry> {
    SEED_SYMBOLS.iter().map(|s| WatchlistEntry::new(s)).collect()
}

/// Watchlist persisted as a two-column `Ticker,FairPE` CSV file
pub struct CsvWatchlistStore {
    path: PathBuf,
}

impl CsvWatchlistStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_error(&self, e: impl std::fmt::Display) -> AnalysisError {
        AnalysisError::Persistence(format!("cannot write {}: {}", self.path.display(), e))
    }

    /// Parse watchlist CSV. Rows without a ticker are dropped; an
    /// unparseable or non-positive fair P/E reads as unset.
    fn parse<R: std::io::Read>(reader: R) -> Result<Vec<WatchlistEntry>, csv::Error> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut entries: Vec<WatchlistEntry> = Vec::new();
        for result in reader.records() {
            let record = result?;
            let symbol = record.get(0).unwrap_or("");
            if symbol.is_empty() {
                continue;
            }
            let entry = WatchlistEntry {
                fair_pe: record
                    .get(1)
                    .and_then(|s| s.parse::<f64>().ok())
                    .filter(|pe| pe.is_finite() && *pe > 0.0),
                ..WatchlistEntry::new(symbol)
            };
            if !entries.iter().any(|e| e.symbol == entry.symbol) {
                entries.push(entry);
            }
        }
        Ok(entries)
    }
}

impl WatchlistStore for CsvWatchlistStore {
    /// A missing file yields the seed list; any other failure is a
    /// `Persistence` error.
    fn load(&self) -> Result<Vec<WatchlistEntry>, AnalysisError> {
        let file = match std::fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!("No watchlist at {}, starting from seed list", self.path.display());
                return Ok(seed_entries());
            }
            Err(e) => {
                return Err(AnalysisError::Persistence(format!(
                    "cannot open {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        Self::parse(file).map_err(|e| {
            AnalysisError::Persistence(format!("cannot read {}: {}", self.path.display(), e))
        })
    }

    fn save(&self, entries: &[WatchlistEntry]) -> Result<(), AnalysisError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.write_error(e))?;
        }

        let mut writer = csv::Writer::from_path(&self.path).map_err(|e| self.write_error(e))?;
        writer.write_record(HEADER).map_err(|e| self.write_error(e))?;
        for entry in entries {
            let fair_pe = entry.fair_pe.map(|pe| pe.to_string()).unwrap_or_default();
            writer
                .write_record([entry.symbol.as_str(), fair_pe.as_str()])
                .map_err(|e| self.write_error(e))?;
        }
        writer.flush().map_err(|e| self.write_error(e))?;

        tracing::debug!("Saved {} watchlist entries to {}", entries.len(), self.path.display());
        Ok(())
    }
}
