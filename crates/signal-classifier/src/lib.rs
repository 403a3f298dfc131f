//! Signal Classifier
//!
//! Maps valuation margin and timing indicators to a recommendation label.
//! The thresholds are plain data so alternative policies are configuration,
//! not code.

use analysis_core::SignalLabel;
use serde::{Deserialize, Serialize};
use technical_analysis::correction_met;

/// Threshold table for the classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierThresholds {
    /// Margin of safety (%) above which a name can be a strong buy
    pub strong_buy_margin: f64,
    /// RSI must be below this for a strong buy
    pub strong_buy_rsi: f64,
    /// Also require the current drawdown to reach the average correction
    pub require_correction_for_strong_buy: bool,
    /// Margin (%) above which a name counts as undervalued
    pub buy_margin: f64,
    /// RSI below this confirms a buy
    pub buy_rsi: f64,
    /// Margin (%) below which a name is overvalued
    pub overvalued_margin: f64,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            strong_buy_margin: 15.0,
            strong_buy_rsi: 40.0,
            require_correction_for_strong_buy: false,
            buy_margin: 0.0,
            buy_rsi: 45.0,
            overvalued_margin: -15.0,
        }
    }
}

impl ClassifierThresholds {
    /// Stricter table: strong buys also need a pullback to the usual depth
    pub fn strict() -> Self {
        Self {
            require_correction_for_strong_buy: true,
            ..Self::default()
        }
    }
}

/// Inputs to the decision rule, all in percent except RSI
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalInputs {
    pub margin_of_safety_pct: f64,
    pub rsi: Option<f64>,
    pub current_drawdown_pct: f64,
    pub avg_correction_pct: Option<f64>,
}

pub struct SignalClassifier {
    thresholds: ClassifierThresholds,
}

impl SignalClassifier {
    pub fn new(thresholds: ClassifierThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &ClassifierThresholds {
        &self.thresholds
    }

    /// Classify one ticker. An indeterminate RSI or an undefined average
    /// correction never satisfies a condition.
    pub fn classify(&self, inputs: &SignalInputs) -> SignalLabel {
        let t = &self.thresholds;
        let margin = inputs.margin_of_safety_pct;
        let rsi_below = |limit: f64| inputs.rsi.map_or(false, |r| r < limit);
        let in_correction = correction_met(inputs.current_drawdown_pct, inputs.avg_correction_pct);

        if margin > t.strong_buy_margin
            && rsi_below(t.strong_buy_rsi)
            && (!t.require_correction_for_strong_buy || in_correction)
        {
            SignalLabel::StrongBuy
        } else if margin > t.buy_margin {
            if rsi_below(t.buy_rsi) || in_correction {
                SignalLabel::Buy
            } else {
                SignalLabel::Watch
            }
        } else if margin >= t.overvalued_margin {
            SignalLabel::Fair
        } else {
            SignalLabel::Overvalued
        }
    }
}

impl Default for SignalClassifier {
    fn default() -> Self {
        Self::new(ClassifierThresholds::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(margin: f64, rsi: Option<f64>, dd: f64, avg: Option<f64>) -> SignalInputs {
        SignalInputs {
            margin_of_safety_pct: margin,
            rsi,
            current_drawdown_pct: dd,
            avg_correction_pct: avg,
        }
    }

    #[test]
    fn test_strong_buy() {
        let c = SignalClassifier::default();
        assert_eq!(c.classify(&inputs(20.0, Some(30.0), -3.0, None)), SignalLabel::StrongBuy);
    }

    #[test]
    fn test_strict_strong_buy_needs_correction() {
        let c = SignalClassifier::new(ClassifierThresholds::strict());
        // Undefined average correction: condition is false, so only a buy
        assert_eq!(c.classify(&inputs(20.0, Some(30.0), -20.0, None)), SignalLabel::Buy);
        assert_eq!(
            c.classify(&inputs(20.0, Some(30.0), -20.0, Some(-12.0))),
            SignalLabel::StrongBuy
        );
    }

    #[test]
    fn test_buy_on_rsi_or_correction() {
        let c = SignalClassifier::default();
        assert_eq!(c.classify(&inputs(5.0, Some(42.0), 0.0, None)), SignalLabel::Buy);
        assert_eq!(c.classify(&inputs(5.0, Some(60.0), -15.0, Some(-10.0))), SignalLabel::Buy);
    }

    #[test]
    fn test_watch_without_timing() {
        let c = SignalClassifier::default();
        assert_eq!(c.classify(&inputs(5.0, Some(60.0), -2.0, Some(-10.0))), SignalLabel::Watch);
        // Deep drawdown with no correction history is not a timing signal
        assert_eq!(c.classify(&inputs(5.0, Some(60.0), -20.0, None)), SignalLabel::Watch);
    }

    #[test]
    fn test_indeterminate_rsi_never_confirms() {
        let c = SignalClassifier::default();
        assert_eq!(c.classify(&inputs(30.0, None, 0.0, None)), SignalLabel::Watch);
    }

    #[test]
    fn test_fair_band() {
        let c = SignalClassifier::default();
        assert_eq!(c.classify(&inputs(0.0, Some(50.0), 0.0, None)), SignalLabel::Fair);
        assert_eq!(c.classify(&inputs(-15.0, Some(50.0), 0.0, None)), SignalLabel::Fair);
        // Price-only fallback yields margin 0 -> fair regardless of RSI
        assert_eq!(c.classify(&inputs(0.0, Some(10.0), -30.0, Some(-8.0))), SignalLabel::Fair);
    }

    #[test]
    fn test_overvalued() {
        let c = SignalClassifier::default();
        assert_eq!(c.classify(&inputs(-15.01, Some(20.0), -25.0, Some(-10.0))), SignalLabel::Overvalued);
    }
}
