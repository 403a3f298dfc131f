//! Watchlist
//!
//! The user's list of watched tickers with optional manual fair P/E, and its
//! CSV persistence.

pub mod store;

pub use store::{seed_entries, CsvWatchlistStore, SEED_SYMBOLS};

use analysis_core::{AnalysisError, WatchlistEntry, WatchlistStore};

/// Ordered, duplicate-free list of watched tickers
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Watchlist {
    entries: Vec<WatchlistEntry>,
}

impl Watchlist {
    pub fn new(entries: Vec<WatchlistEntry>) -> Self {
        let mut list = Self::default();
        for entry in entries {
            if !list.contains(&entry.symbol) {
                list.entries.push(entry);
            }
        }
        list
    }

    pub fn seed() -> Self {
        Self::new(seed_entries())
    }

    /// Load from the store, failing when an existing file cannot be read
    pub fn load(store: &dyn WatchlistStore) -> Result<Self, AnalysisError> {
        store.load().map(Self::new)
    }

    /// Load for read-only use, falling back to the seed list when the store
    /// cannot be read. Never save a list obtained this way.
    pub fn load_or_default(store: &dyn WatchlistStore) -> Self {
        match Self::load(store) {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!("Watchlist unreadable ({}), using default list", e);
                Self::seed()
            }
        }
    }

    pub fn save(&self, store: &dyn WatchlistStore) -> Result<(), AnalysisError> {
        store.save(&self.entries)
    }

    /// Load, apply `edit`, then save. Nothing is written when the stored
    /// list cannot be read or the edit fails.
    pub fn update<T>(
        store: &dyn WatchlistStore,
        edit: impl FnOnce(&mut Watchlist) -> Result<T, AnalysisError>,
    ) -> Result<T, AnalysisError> {
        let mut list = Self::load(store)?;
        let outcome = edit(&mut list)?;
        list.save(store)?;
        Ok(outcome)
    }

    pub fn entries(&self) -> &[WatchlistEntry] {
        &self.entries
    }

    pub fn symbols(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.symbol.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.get(symbol).is_some()
    }

    pub fn get(&self, symbol: &str) -> Option<&WatchlistEntry> {
        let symbol = symbol.trim().to_uppercase();
        self.entries.iter().find(|e| e.symbol == symbol)
    }

    /// Append a ticker. Returns false if it was already on the list, in
    /// which case a given fair P/E still replaces the old one.
    pub fn add(&mut self, symbol: &str, fair_pe: Option<f64>) -> Result<bool, AnalysisError> {
        let entry = WatchlistEntry {
            fair_pe: validate_pe(fair_pe)?,
            ..WatchlistEntry::new(symbol)
        };
        if entry.symbol.is_empty() {
            return Err(AnalysisError::InvalidData("empty ticker symbol".to_string()));
        }

        match self.entries.iter_mut().find(|e| e.symbol == entry.symbol) {
            Some(existing) => {
                if entry.fair_pe.is_some() {
                    existing.fair_pe = entry.fair_pe;
                }
                Ok(false)
            }
            None => {
                self.entries.push(entry);
                Ok(true)
            }
        }
    }

    /// Returns false if the ticker was not on the list
    pub fn remove(&mut self, symbol: &str) -> bool {
        let symbol = symbol.trim().to_uppercase();
        let before = self.entries.len();
        self.entries.retain(|e| e.symbol != symbol);
        self.entries.len() != before
    }

    /// Set or, with `None`, clear the manual fair P/E
    pub fn set_fair_pe(&mut self, symbol: &str, fair_pe: Option<f64>) -> Result<(), AnalysisError> {
        let fair_pe = validate_pe(fair_pe)?;
        let symbol = symbol.trim().to_uppercase();
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.symbol == symbol)
            .ok_or(AnalysisError::SymbolNotFound(symbol))?;
        entry.fair_pe = fair_pe;
        Ok(())
    }
}

fn validate_pe(fair_pe: Option<f64>) -> Result<Option<f64>, AnalysisError> {
    match fair_pe {
        Some(pe) if !pe.is_finite() || pe <= 0.0 => {
            Err(AnalysisError::InvalidData(format!("fair P/E must be positive, got {}", pe)))
        }
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_uppercases_and_dedupes() {
        let mut list = Watchlist::default();
        assert!(list.add(" nvda ", None).unwrap());
        assert!(!list.add("NVDA", Some(30.0)).unwrap());
        assert_eq!(list.len(), 1);
        assert_eq!(list.get("nvda").unwrap().fair_pe, Some(30.0));

        // Re-adding without a P/E keeps the existing one
        list.add("NVDA", None).unwrap();
        assert_eq!(list.get("NVDA").unwrap().fair_pe, Some(30.0));
    }

    #[test]
    fn test_add_rejects_bad_input() {
        let mut list = Watchlist::default();
        assert!(list.add("   ", None).is_err());
        assert!(list.add("KO", Some(0.0)).is_err());
        assert!(list.add("KO", Some(f64::NAN)).is_err());
        assert!(list.is_empty());
    }

    #[test]
    fn test_remove() {
        let mut list = Watchlist::seed();
        assert!(list.remove("msft"));
        assert!(!list.remove("MSFT"));
        assert_eq!(list.symbols(), vec!["AAPL", "TSLA"]);
    }

    #[test]
    fn test_set_and_clear_fair_pe() {
        let mut list = Watchlist::seed();
        list.set_fair_pe("tsla", Some(40.0)).unwrap();
        assert_eq!(list.get("TSLA").unwrap().fair_pe, Some(40.0));
        list.set_fair_pe("TSLA", None).unwrap();
        assert_eq!(list.get("TSLA").unwrap().fair_pe, None);

        let err = list.set_fair_pe("GME", Some(10.0)).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_load_or_default_falls_back_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvWatchlistStore::new(dir.path());
        assert_eq!(Watchlist::load_or_default(&store), Watchlist::seed());
    }

    #[test]
    fn test_update_leaves_unreadable_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watchlist.csv");
        let original: &[u8] = b"Ticker,FairPE\nNVDA,30\nASML,\nSoci\xE9te,\n";
        std::fs::write(&path, original).unwrap();
        let store = CsvWatchlistStore::new(&path);

        let err = Watchlist::update(&store, |list| list.add("KO", None)).unwrap_err();
        assert!(matches!(err, AnalysisError::Persistence(_)));
        assert_eq!(std::fs::read(&path).unwrap(), original);

        // Read-only callers still get a usable list
        assert_eq!(Watchlist::load_or_default(&store), Watchlist::seed());
    }

    #[test]
    fn test_update_writes_edit() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvWatchlistStore::new(dir.path().join("watchlist.csv"));
        store.save(&[WatchlistEntry::new("NVDA").with_fair_pe(30.0)]).unwrap();

        let added = Watchlist::update(&store, |list| list.add("ko", None)).unwrap();
        assert!(added);
        let list = Watchlist::load(&store).unwrap();
        assert_eq!(list.symbols(), vec!["NVDA", "KO"]);
        assert_eq!(list.get("NVDA").unwrap().fair_pe, Some(30.0));
    }

    #[test]
    fn test_failed_edit_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watchlist.csv");
        let store = CsvWatchlistStore::new(&path);

        let err = Watchlist::update(&store, |list| list.set_fair_pe("GME", Some(10.0))).unwrap_err();
        assert!(err.is_not_found());
        assert!(!path.exists());
    }

    #[test]
    fn test_failed_save_keeps_in_memory_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvWatchlistStore::new(dir.path());
        let mut list = Watchlist::seed();
        list.add("ASML", None).unwrap();
        assert!(list.save(&store).is_err());
        assert!(list.contains("ASML"));
    }

    #[test]
    fn test_new_drops_duplicates_keeping_first() {
        let list = Watchlist::new(vec![
            WatchlistEntry::new("KO").with_fair_pe(20.0),
            WatchlistEntry::new("PEP"),
            WatchlistEntry::new("KO"),
        ]);
        assert_eq!(list.symbols(), vec!["KO", "PEP"]);
        assert_eq!(list.get("KO").unwrap().fair_pe, Some(20.0));
    }
}
