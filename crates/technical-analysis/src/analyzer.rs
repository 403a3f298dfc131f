use analysis_core::AnalysisError;
use serde::{Deserialize, Serialize};

use crate::indicators::*;

pub const RSI_PERIOD: usize = 14;

/// Momentum reading derived from the latest RSI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RsiZone {
    Oversold,
    Neutral,
    Overbought,
    Indeterminate,
}

impl RsiZone {
    pub fn from_rsi(rsi: Option<f64>) -> Self {
        match rsi {
            Some(v) if v < 35.0 => RsiZone::Oversold,
            Some(v) if v > 70.0 => RsiZone::Overbought,
            Some(_) => RsiZone::Neutral,
            None => RsiZone::Indeterminate,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RsiZone::Oversold => "Oversold",
            RsiZone::Neutral => "Neutral",
            RsiZone::Overbought => "Overbought",
            RsiZone::Indeterminate => "n/a",
        }
    }
}

/// Timing indicators for one ticker
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TechnicalSnapshot {
    /// `None` when fewer than `RSI_PERIOD + 1` closes were available
    pub rsi: Option<f64>,
    pub current_drawdown_pct: f64,
    pub avg_correction_pct: Option<f64>,
    pub max_drawdown_pct: f64,
}

impl TechnicalSnapshot {
    /// Compute RSI(14) and drawdown statistics from daily closes, oldest first.
    pub fn from_closes(closes: &[f64]) -> Result<Self, AnalysisError> {
        if closes.is_empty() {
            return Err(AnalysisError::InsufficientData(
                "No closing prices to analyse".to_string(),
            ));
        }
        if closes.iter().any(|c| !c.is_finite()) {
            return Err(AnalysisError::InvalidData(
                "Close series contains non-finite values".to_string(),
            ));
        }

        let rsi = latest_rsi(closes, RSI_PERIOD);
        if rsi.is_none() {
            tracing::debug!(
                "RSI({}) indeterminate: only {} closes",
                RSI_PERIOD,
                closes.len()
            );
        }

        let stats = drawdown_stats(closes).ok_or_else(|| {
            AnalysisError::InsufficientData("No closing prices to analyse".to_string())
        })?;

        Ok(Self {
            rsi,
            current_drawdown_pct: stats.current_pct,
            avg_correction_pct: stats.avg_correction_pct,
            max_drawdown_pct: stats.max_pct,
        })
    }

    pub fn rsi_zone(&self) -> RsiZone {
        RsiZone::from_rsi(self.rsi)
    }

    /// True when the current pullback is at least as deep as the average
    /// historical correction. False when there is no correction history.
    pub fn correction_met(&self) -> bool {
        correction_met(self.current_drawdown_pct, self.avg_correction_pct)
    }
}

pub fn correction_met(current_drawdown_pct: f64, avg_correction_pct: Option<f64>) -> bool {
    match avg_correction_pct {
        Some(avg) => current_drawdown_pct <= avg,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_closes_rejected() {
        let err = TechnicalSnapshot::from_closes(&[]).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData(_)));
    }

    #[test]
    fn test_short_history_keeps_drawdown() {
        let closes = vec![10.0, 12.0, 9.0];
        let snap = TechnicalSnapshot::from_closes(&closes).unwrap();
        assert_eq!(snap.rsi, None);
        assert_eq!(snap.rsi_zone(), RsiZone::Indeterminate);
        assert!((snap.current_drawdown_pct - (-25.0)).abs() < 1e-9);
    }

    #[test]
    fn test_flat_then_drop_has_no_correction_history() {
        let mut closes = vec![100.0; 250];
        closes.push(80.0);
        let snap = TechnicalSnapshot::from_closes(&closes).unwrap();

        assert!((snap.current_drawdown_pct - (-20.0)).abs() < 1e-9);
        assert_eq!(snap.avg_correction_pct, None);
        assert!(!snap.correction_met());
    }

    #[test]
    fn test_correction_met_when_pullback_deeper_than_average() {
        // 10% dip, recovery to a new high, then a 15% pullback
        let mut closes = vec![100.0, 97.0, 90.0, 100.0, 110.0];
        closes.push(93.5);
        let snap = TechnicalSnapshot::from_closes(&closes).unwrap();

        assert!((snap.avg_correction_pct.unwrap() - (-10.0)).abs() < 1e-9);
        assert!((snap.current_drawdown_pct - (-15.0)).abs() < 1e-9);
        assert!(snap.correction_met());
    }

    #[test]
    fn test_rsi_zones() {
        assert_eq!(RsiZone::from_rsi(Some(20.0)), RsiZone::Oversold);
        assert_eq!(RsiZone::from_rsi(Some(50.0)), RsiZone::Neutral);
        assert_eq!(RsiZone::from_rsi(Some(80.0)), RsiZone::Overbought);
    }

    #[test]
    fn test_undefined_average_never_meets_correction() {
        assert!(!correction_met(-40.0, None));
        assert!(correction_met(-12.0, Some(-8.0)));
        assert!(!correction_met(-6.0, Some(-8.0)));
    }
}
