pub mod config;
pub mod models;
pub mod quality;

pub use config::{DcfParams, ValuationConfig, ValuationPreset};
pub use models::*;
pub use quality::quality_score;

use analysis_core::{AnalysisError, Fundamentals, Metric, ValuationModel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Blended valuation for one ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FairValueEstimate {
    /// Contributing models and their per-share values
    pub candidates: BTreeMap<ValuationModel, f64>,
    pub fair_value: f64,
    pub margin_of_safety_pct: f64,
    /// Multiple used by the earnings and cash-flow models
    pub multiplier: f64,
    /// Growth rate fed to the multiplier and DCF (before DCF clamping)
    pub growth_rate: f64,
}

impl FairValueEstimate {
    /// No model applied; fair value is the current price
    pub fn is_price_fallback(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn models_used(&self) -> Vec<ValuationModel> {
        self.candidates.keys().copied().collect()
    }
}

pub struct FairValueEstimator {
    config: ValuationConfig,
}

impl FairValueEstimator {
    pub fn new(config: ValuationConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn from_preset(preset: ValuationPreset) -> Self {
        Self {
            config: preset.config(),
        }
    }

    pub fn config(&self) -> &ValuationConfig {
        &self.config
    }

    /// Earnings growth estimate, else revenue growth, else the configured default
    pub fn resolve_growth(&self, fundamentals: &Fundamentals) -> f64 {
        fundamentals
            .get(Metric::EarningsGrowth)
            .or_else(|| fundamentals.get(Metric::RevenueGrowth))
            .unwrap_or(self.config.default_growth)
    }

    /// Run every enabled model and blend the ones that apply
    pub fn estimate(
        &self,
        fundamentals: &Fundamentals,
        current_price: f64,
        manual_pe: Option<f64>,
    ) -> FairValueEstimate {
        let cfg = &self.config;
        let growth = self.resolve_growth(fundamentals);
        let multiplier = fair_multiplier(manual_pe, growth, cfg);

        let eps = fundamentals.get(Metric::Eps);
        let bvps = fundamentals.get(Metric::BookValuePerShare);
        let fcf = fundamentals.get(Metric::FreeCashFlow);
        let shares = fundamentals.get(Metric::SharesOutstanding);

        let mut candidates = BTreeMap::new();
        for model in &cfg.models {
            let value = match model {
                ValuationModel::AssetBased => graham_value(eps, bvps),
                ValuationModel::EarningsMultiple => earnings_multiple_value(eps, multiplier),
                ValuationModel::CashFlowMultiple => cash_flow_multiple_value(fcf, shares, multiplier),
                ValuationModel::DiscountedCashFlow => dcf_value(fcf, shares, growth, &cfg.dcf),
                ValuationModel::AnalystConsensus => {
                    analyst_value(fundamentals.get(Metric::AnalystTargetPrice))
                }
            };
            if let Some(v) = value {
                candidates.insert(*model, v);
            }
        }

        let values: Vec<f64> = candidates.values().copied().collect();
        let fair_value = blend(&values, current_price);
        let margin_of_safety_pct = if candidates.is_empty() {
            0.0
        } else {
            margin_of_safety(current_price, fair_value)
        };

        FairValueEstimate {
            candidates,
            fair_value,
            margin_of_safety_pct,
            multiplier,
            growth_rate: growth,
        }
    }
}

impl Default for FairValueEstimator {
    fn default() -> Self {
        Self::from_preset(ValuationPreset::default())
    }
}
