use analysis_core::{AnalysisError, ValuationModel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Discounted-cash-flow parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DcfParams {
    pub discount_rate: f64,
    pub terminal_growth: f64,
    pub horizon_years: u32,
    /// Projection growth is clamped to `[growth_floor, growth_cap]`
    pub growth_floor: f64,
    pub growth_cap: f64,
}

impl Default for DcfParams {
    fn default() -> Self {
        Self {
            discount_rate: 0.09,
            terminal_growth: 0.02,
            horizon_years: 10,
            growth_floor: 0.0,
            growth_cap: 0.25,
        }
    }
}

/// Everything that used to differ between the dashboard variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationConfig {
    pub models: BTreeSet<ValuationModel>,
    /// Multiple applied at zero growth
    pub base_multiple: f64,
    /// Added multiple per unit of growth (0.10 growth * 50 = +5)
    pub growth_scaling: f64,
    pub min_multiple: f64,
    pub max_multiple: f64,
    /// Growth assumed when the provider has no estimate
    pub default_growth: f64,
    pub dcf: DcfParams,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        ValuationPreset::Balanced.config()
    }
}

impl ValuationConfig {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let finite = [
            self.base_multiple,
            self.growth_scaling,
            self.min_multiple,
            self.max_multiple,
            self.default_growth,
            self.dcf.discount_rate,
            self.dcf.terminal_growth,
            self.dcf.growth_floor,
            self.dcf.growth_cap,
        ];
        if finite.iter().any(|v| !v.is_finite()) {
            return Err(AnalysisError::InvalidData(
                "Valuation parameters must be finite".to_string(),
            ));
        }
        if self.min_multiple <= 0.0 || self.min_multiple > self.max_multiple {
            return Err(AnalysisError::InvalidData(format!(
                "Invalid multiplier band [{}, {}]",
                self.min_multiple, self.max_multiple
            )));
        }
        if self.dcf.horizon_years == 0 {
            return Err(AnalysisError::InvalidData(
                "DCF horizon must be at least one year".to_string(),
            ));
        }
        if self.dcf.growth_floor > self.dcf.growth_cap {
            return Err(AnalysisError::InvalidData(format!(
                "Invalid DCF growth clamp [{}, {}]",
                self.dcf.growth_floor, self.dcf.growth_cap
            )));
        }
        Ok(())
    }

    pub fn uses(&self, model: ValuationModel) -> bool {
        self.models.contains(&model)
    }
}

/// Named configurations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ValuationPreset {
    #[default]
    Balanced,
    Conservative,
    Growth,
}

impl ValuationPreset {
    pub fn config(&self) -> ValuationConfig {
        let all: BTreeSet<ValuationModel> = ValuationModel::ALL.into_iter().collect();
        match self {
            ValuationPreset::Balanced => ValuationConfig {
                models: all,
                base_multiple: 15.0,
                growth_scaling: 50.0,
                min_multiple: 10.0,
                max_multiple: 30.0,
                default_growth: 0.08,
                dcf: DcfParams::default(),
            },
            ValuationPreset::Conservative => ValuationConfig {
                models: all
                    .into_iter()
                    .filter(|m| *m != ValuationModel::AnalystConsensus)
                    .collect(),
                base_multiple: 15.0,
                growth_scaling: 40.0,
                min_multiple: 12.0,
                max_multiple: 28.0,
                default_growth: 0.08,
                dcf: DcfParams {
                    discount_rate: 0.10,
                    ..DcfParams::default()
                },
            },
            ValuationPreset::Growth => ValuationConfig {
                models: all,
                base_multiple: 15.0,
                growth_scaling: 50.0,
                min_multiple: 12.0,
                max_multiple: 30.0,
                default_growth: 0.10,
                dcf: DcfParams {
                    discount_rate: 0.08,
                    ..DcfParams::default()
                },
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValuationPreset::Balanced => "balanced",
            ValuationPreset::Conservative => "conservative",
            ValuationPreset::Growth => "growth",
        }
    }
}

impl FromStr for ValuationPreset {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "balanced" => Ok(ValuationPreset::Balanced),
            "conservative" => Ok(ValuationPreset::Conservative),
            "growth" => Ok(ValuationPreset::Growth),
            other => Err(AnalysisError::InvalidData(format!(
                "Unknown valuation preset '{}' (expected balanced, conservative or growth)",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        for preset in [
            ValuationPreset::Balanced,
            ValuationPreset::Conservative,
            ValuationPreset::Growth,
        ] {
            assert!(preset.config().validate().is_ok(), "{:?}", preset);
        }
    }

    #[test]
    fn test_conservative_excludes_analyst_targets() {
        let cfg = ValuationPreset::Conservative.config();
        assert!(!cfg.uses(ValuationModel::AnalystConsensus));
        assert!(cfg.uses(ValuationModel::DiscountedCashFlow));
        assert_eq!((cfg.min_multiple, cfg.max_multiple), (12.0, 28.0));
    }

    #[test]
    fn test_inverted_band_rejected() {
        let cfg = ValuationConfig {
            min_multiple: 30.0,
            max_multiple: 10.0,
            ..ValuationConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(AnalysisError::InvalidData(_))));
    }

    #[test]
    fn test_preset_parsing() {
        assert_eq!("Growth".parse::<ValuationPreset>().unwrap(), ValuationPreset::Growth);
        assert!("aggressive".parse::<ValuationPreset>().is_err());
    }
}
