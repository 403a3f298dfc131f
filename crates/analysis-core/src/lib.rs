pub mod error;
pub mod traits;
pub mod types;

pub use error::*;
pub use traits::*;
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_metrics_ignores_present_fields() {
        let f = Fundamentals {
            eps: Some(5.0),
            book_value_per_share: Some(20.0),
            ..Default::default()
        };
        let missing = f.missing();
        assert!(!missing.contains(&Metric::Eps));
        assert!(!missing.contains(&Metric::BookValuePerShare));
        assert_eq!(missing.len(), Metric::ALL.len() - 2);
    }

    #[test]
    fn test_nan_metric_reads_as_absent() {
        let f = Fundamentals {
            free_cash_flow: Some(f64::NAN),
            ..Default::default()
        };
        assert_eq!(f.get(Metric::FreeCashFlow), None);
    }

    #[test]
    fn test_watchlist_entry_normalizes_symbol() {
        let entry = WatchlistEntry::new("  nvda ").with_fair_pe(22.0);
        assert_eq!(entry.symbol, "NVDA");
        assert_eq!(entry.fair_pe, Some(22.0));
    }

    #[test]
    fn test_signal_label_ordering() {
        assert!(SignalLabel::StrongBuy.rank() < SignalLabel::Buy.rank());
        assert!(SignalLabel::Fair.rank() < SignalLabel::Overvalued.rank());
        assert_eq!(SignalLabel::Watch.to_string(), "WATCH");
    }
}
