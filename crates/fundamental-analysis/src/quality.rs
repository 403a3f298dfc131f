use analysis_core::{Fundamentals, Metric};

/// 0-10 business quality score: two points for each condition met.
/// Missing metrics never score. The valuation check reads forward P/E and
/// falls back to trailing P/E for providers without estimates.
pub fn quality_score(fundamentals: &Fundamentals) -> u8 {
    let checks: [(Option<f64>, fn(f64) -> bool); 5] = [
        (fundamentals.get(Metric::RevenueGrowth), |v| v > 0.05),
        (fundamentals.get(Metric::ReturnOnEquity), |v| v > 0.15),
        (fundamentals.get(Metric::DebtToEquity), |v| v < 0.6),
        (fundamentals.get(Metric::ProfitMargin), |v| v > 0.10),
        (
            fundamentals
                .get(Metric::ForwardPe)
                .or_else(|| fundamentals.get(Metric::TrailingPe)),
            |v| v > 0.0 && v < 25.0,
        ),
    ];

    checks
        .iter()
        .filter(|(value, passes)| value.map_or(false, |v| passes(v)))
        .count() as u8
        * 2
}
