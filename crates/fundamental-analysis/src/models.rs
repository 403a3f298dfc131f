//! Individual fair-value models. Each returns `None` when its preconditions
//! fail, and never a non-positive or non-finite value.

use crate::config::{DcfParams, ValuationConfig};

/// P/E 15 x P/B 1.5
pub const GRAHAM_CONSTANT: f64 = 22.5;

fn positive(value: f64) -> Option<f64> {
    if value.is_finite() && value > 0.0 {
        Some(value)
    } else {
        None
    }
}

/// Graham number: sqrt(22.5 * EPS * BVPS)
pub fn graham_value(eps: Option<f64>, book_value_per_share: Option<f64>) -> Option<f64> {
    let eps = eps.and_then(positive)?;
    let bvps = book_value_per_share.and_then(positive)?;
    positive((GRAHAM_CONSTANT * eps * bvps).sqrt())
}

/// Multiple applied to earnings and cash flow. A positive manual P/E wins;
/// otherwise the base multiple is adjusted for growth and clamped to the band.
pub fn fair_multiplier(manual_pe: Option<f64>, growth: f64, config: &ValuationConfig) -> f64 {
    if let Some(pe) = manual_pe.and_then(positive) {
        return pe;
    }
    (config.base_multiple + growth * config.growth_scaling)
        .clamp(config.min_multiple, config.max_multiple)
}

pub fn earnings_multiple_value(eps: Option<f64>, multiplier: f64) -> Option<f64> {
    let eps = eps.and_then(positive)?;
    positive(eps * multiplier)
}

pub fn cash_flow_multiple_value(
    free_cash_flow: Option<f64>,
    shares_outstanding: Option<f64>,
    multiplier: f64,
) -> Option<f64> {
    let fcf = free_cash_flow.and_then(positive)?;
    let shares = shares_outstanding.and_then(positive)?;
    positive(fcf / shares * multiplier)
}

/// Per-share value of a `horizon_years` FCF projection plus a Gordon-growth
/// terminal value, all discounted to today.
pub fn dcf_value(
    free_cash_flow: Option<f64>,
    shares_outstanding: Option<f64>,
    growth: f64,
    params: &DcfParams,
) -> Option<f64> {
    let fcf = free_cash_flow.and_then(positive)?;
    let shares = shares_outstanding.and_then(positive)?;
    if params.discount_rate <= params.terminal_growth || params.horizon_years == 0 {
        return None;
    }

    let g = growth.clamp(params.growth_floor, params.growth_cap);
    let r = params.discount_rate;

    let mut projected = fcf;
    let mut present_value = 0.0;
    for year in 1..=params.horizon_years as i32 {
        projected *= 1.0 + g;
        present_value += projected / (1.0 + r).powi(year);
    }

    let terminal_value = projected * (1.0 + params.terminal_growth) / (r - params.terminal_growth);
    let terminal_pv = terminal_value / (1.0 + r).powi(params.horizon_years as i32);

    positive((present_value + terminal_pv) / shares)
}

pub fn analyst_value(target_price: Option<f64>) -> Option<f64> {
    target_price.and_then(positive)
}

/// Mean of the candidates, or the current price when there are none
pub fn blend(candidates: &[f64], current_price: f64) -> f64 {
    if candidates.is_empty() {
        return current_price;
    }
    candidates.iter().sum::<f64>() / candidates.len() as f64
}

/// Percent discount of price to fair value; positive means undervalued
pub fn margin_of_safety(current_price: f64, fair_value: f64) -> f64 {
    if fair_value > 0.0 && fair_value.is_finite() {
        (1.0 - current_price / fair_value) * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graham_scenario() {
        let value = graham_value(Some(5.0), Some(20.0)).unwrap();
        assert!((value - 2250.0_f64.sqrt()).abs() < 1e-12);
        assert!((value - 47.43).abs() < 0.01);
    }

    #[test]
    fn test_graham_requires_positive_inputs() {
        assert!(graham_value(Some(-1.0), Some(20.0)).is_none());
        assert!(graham_value(Some(5.0), Some(0.0)).is_none());
        assert!(graham_value(None, Some(20.0)).is_none());
    }

    #[test]
    fn test_multiplier_clamped_to_band() {
        let cfg = ValuationConfig::default();
        assert_eq!(fair_multiplier(None, 0.10, &cfg), 20.0);
        assert_eq!(fair_multiplier(None, 0.90, &cfg), 30.0);
        assert_eq!(fair_multiplier(None, -0.50, &cfg), 10.0);
    }

    #[test]
    fn test_manual_pe_overrides_band() {
        let cfg = ValuationConfig::default();
        assert_eq!(fair_multiplier(Some(42.0), 0.10, &cfg), 42.0);
        // Non-positive override falls back to growth-adjusted multiple
        assert_eq!(fair_multiplier(Some(0.0), 0.10, &cfg), 20.0);
    }

    #[test]
    fn test_earnings_multiple_negative_eps() {
        assert!(earnings_multiple_value(Some(-2.0), 20.0).is_none());
        assert_eq!(earnings_multiple_value(Some(2.0), 20.0), Some(40.0));
    }

    #[test]
    fn test_cash_flow_multiple_needs_shares() {
        assert!(cash_flow_multiple_value(Some(1e6), None, 20.0).is_none());
        assert_eq!(cash_flow_multiple_value(Some(1e6), Some(1e6), 20.0), Some(20.0));
    }

    #[test]
    fn test_dcf_closed_form() {
        let params = DcfParams {
            discount_rate: 0.08,
            terminal_growth: 0.02,
            horizon_years: 10,
            growth_floor: 0.0,
            growth_cap: 0.25,
        };
        let value = dcf_value(Some(1_000_000.0), Some(1_000_000.0), 0.10, &params).unwrap();

        let mut expected = 0.0;
        for t in 1..=10 {
            expected += 1.1_f64.powi(t) / 1.08_f64.powi(t);
        }
        let terminal = 1.1_f64.powi(10) * 1.02 / (0.08 - 0.02);
        expected += terminal / 1.08_f64.powi(10);

        assert!(value > 0.0);
        assert!((value - expected).abs() < 1e-9 * expected);
    }

    #[test]
    fn test_dcf_invalid_rates() {
        let params = DcfParams {
            discount_rate: 0.02,
            terminal_growth: 0.02,
            ..DcfParams::default()
        };
        assert!(dcf_value(Some(1e6), Some(1e6), 0.1, &params).is_none());
        assert!(dcf_value(Some(-1e6), Some(1e6), 0.1, &DcfParams::default()).is_none());
    }

    #[test]
    fn test_dcf_monotone_in_growth() {
        let params = DcfParams::default();
        let mut last = 0.0;
        for g in [0.0, 0.05, 0.10, 0.15, 0.20, 0.25] {
            let v = dcf_value(Some(1e6), Some(1e6), g, &params).unwrap();
            assert!(v > last, "growth {} gave {} <= {}", g, v, last);
            last = v;
        }
    }

    #[test]
    fn test_dcf_monotone_in_discount_rate() {
        let mut last = f64::INFINITY;
        for r in [0.06, 0.08, 0.10, 0.12] {
            let params = DcfParams {
                discount_rate: r,
                ..DcfParams::default()
            };
            let v = dcf_value(Some(1e6), Some(1e6), 0.10, &params).unwrap();
            assert!(v < last, "rate {} gave {} >= {}", r, v, last);
            last = v;
        }
    }

    #[test]
    fn test_dcf_growth_clamped() {
        let params = DcfParams::default();
        let capped = dcf_value(Some(1e6), Some(1e6), 0.25, &params).unwrap();
        let wild = dcf_value(Some(1e6), Some(1e6), 0.80, &params).unwrap();
        assert_eq!(capped, wild);

        let floor = dcf_value(Some(1e6), Some(1e6), 0.0, &params).unwrap();
        let shrinking = dcf_value(Some(1e6), Some(1e6), -0.30, &params).unwrap();
        assert_eq!(floor, shrinking);
    }

    #[test]
    fn test_blend_and_margin() {
        assert_eq!(blend(&[], 123.0), 123.0);
        assert_eq!(blend(&[100.0, 50.0], 10.0), 75.0);
        assert_eq!(margin_of_safety(75.0, 100.0), 25.0);
        assert!(margin_of_safety(120.0, 100.0) < 0.0);
        assert_eq!(margin_of_safety(100.0, 100.0), 0.0);
    }
}
