/// Guards the relative-strength division when a window has no losses
pub const RSI_EPSILON: f64 = 1e-9;

/// Drawdowns shallower than this are treated as noise, not corrections
pub const CORRECTION_THRESHOLD: f64 = -0.05;

/// Simple Moving Average
pub fn sma(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return vec![];
    }

    let mut result = Vec::with_capacity(data.len() - period + 1);
    for i in period - 1..data.len() {
        let sum: f64 = data[i + 1 - period..=i].iter().sum();
        result.push(sum / period as f64);
    }
    result
}

/// Mean of the last `period` values, `None` when the series is too short
pub fn latest_sma(data: &[f64], period: usize) -> Option<f64> {
    if period == 0 || data.len() < period {
        return None;
    }
    let window = &data[data.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}

/// Relative Strength Index using simple rolling means of gains and losses.
///
/// One value per complete window, so the first value corresponds to
/// `data[period]`. Returns an empty vector when `data.len() <= period`.
pub fn rsi(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period + 1 {
        return vec![];
    }

    let mut gains = Vec::with_capacity(data.len() - 1);
    let mut losses = Vec::with_capacity(data.len() - 1);

    for w in data.windows(2) {
        let change = w[1] - w[0];
        if change > 0.0 {
            gains.push(change);
            losses.push(0.0);
        } else {
            gains.push(0.0);
            losses.push(-change);
        }
    }

    let avg_gains = sma(&gains, period);
    let avg_losses = sma(&losses, period);

    avg_gains
        .iter()
        .zip(avg_losses.iter())
        .map(|(gain, loss)| {
            let rs = gain / (loss + RSI_EPSILON);
            100.0 - 100.0 / (1.0 + rs)
        })
        .collect()
}

/// Most recent RSI value, `None` when the series is too short
pub fn latest_rsi(data: &[f64], period: usize) -> Option<f64> {
    rsi(data, period).last().copied().filter(|v| v.is_finite())
}

/// High-water mark at each point
pub fn running_max(data: &[f64]) -> Vec<f64> {
    let mut peak = f64::NEG_INFINITY;
    data.iter()
        .map(|&close| {
            peak = peak.max(close);
            peak
        })
        .collect()
}

/// Fractional decline from the running peak at each point (always <= 0)
pub fn drawdowns(data: &[f64]) -> Vec<f64> {
    data.iter()
        .zip(running_max(data))
        .map(|(&close, peak)| {
            if peak > 0.0 && close.is_finite() {
                (close / peak - 1.0).min(0.0)
            } else {
                0.0
            }
        })
        .collect()
}

/// Drawdown summary for a close series, in percent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawdownStats {
    /// Drawdown at the latest close
    pub current_pct: f64,
    /// Mean depth of past points that sat deeper than the correction
    /// threshold, excluding the latest close
    pub avg_correction_pct: Option<f64>,
    /// Deepest drawdown in the series
    pub max_pct: f64,
}

/// Summarize drawdowns. `None` for an empty series.
pub fn drawdown_stats(data: &[f64]) -> Option<DrawdownStats> {
    let dd = drawdowns(data);
    let (&current, history) = dd.split_last()?;

    let corrections: Vec<f64> = history
        .iter()
        .copied()
        .filter(|&d| d < CORRECTION_THRESHOLD)
        .collect();

    let avg_correction_pct = if corrections.is_empty() {
        None
    } else {
        Some(corrections.iter().sum::<f64>() / corrections.len() as f64 * 100.0)
    };

    let max_pct = dd.iter().copied().fold(0.0_f64, f64::min) * 100.0;

    Some(DrawdownStats {
        current_pct: current * 100.0,
        avg_correction_pct,
        max_pct,
    })
}
