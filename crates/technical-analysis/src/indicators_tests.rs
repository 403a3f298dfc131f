#[cfg(test)]
mod tests {
    use super::super::indicators::*;

    // Helper function to create sample price data
    fn sample_prices() -> Vec<f64> {
        vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08,
            45.89, 46.03, 45.61, 46.28, 46.28, 46.00, 46.03, 46.41, 46.22, 45.64,
        ]
    }

    #[test]
    fn test_sma_basic() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = sma(&data, 3);

        assert_eq!(result.len(), 3);
        assert!((result[0] - 2.0).abs() < 0.001); // (1+2+3)/3 = 2
        assert!((result[1] - 3.0).abs() < 0.001); // (2+3+4)/3 = 3
        assert!((result[2] - 4.0).abs() < 0.001); // (3+4+5)/3 = 4
    }

    #[test]
    fn test_sma_insufficient_data() {
        let data = vec![1.0, 2.0];
        let result = sma(&data, 5);

        assert_eq!(result.len(), 0);
    }

    #[test]
    fn test_latest_sma_matches_last_rolling_value() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(latest_sma(&data, 3), sma(&data, 3).last().copied());
        assert_eq!(latest_sma(&data, 5), Some(3.0));
        assert_eq!(latest_sma(&data, 6), None);
        assert_eq!(latest_sma(&data, 0), None);
    }

    #[test]
    fn test_rsi_basic() {
        let prices = sample_prices();
        let result = rsi(&prices, 14);

        // 19 deltas -> 6 complete 14-period windows
        assert_eq!(result.len(), 6);
        for &value in &result {
            assert!(value >= 0.0 && value <= 100.0);
        }
    }

    #[test]
    fn test_rsi_insufficient_data() {
        let data = vec![1.0, 2.0, 3.0];
        assert!(rsi(&data, 14).is_empty());
        assert_eq!(latest_rsi(&data, 14), None);

        // 14 closes give only 13 deltas
        let fourteen: Vec<f64> = (0..14).map(|i| 100.0 + i as f64).collect();
        assert_eq!(latest_rsi(&fourteen, 14), None);
    }

    #[test]
    fn test_rsi_first_value_needs_fifteen_closes() {
        let fifteen: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        assert_eq!(rsi(&fifteen, 14).len(), 1);
    }

    #[test]
    fn test_rsi_rising_series_approaches_100() {
        let uptrend: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let value = latest_rsi(&uptrend, 14).unwrap();
        assert!(value > 99.999);
        assert!(value <= 100.0);
    }

    #[test]
    fn test_rsi_falling_series_is_zero() {
        let downtrend: Vec<f64> = (0..30).map(|i| 200.0 - i as f64).collect();
        let value = latest_rsi(&downtrend, 14).unwrap();
        assert!(value.abs() < 1e-9);
    }

    #[test]
    fn test_rsi_uses_simple_rolling_mean() {
        // 14 gains of 1.0 then a loss of 7.0: window = 13 gains + 1 loss
        let mut prices: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        prices.push(107.0);
        let values = rsi(&prices, 14);
        let avg_gain = 13.0 / 14.0;
        let avg_loss = 7.0 / 14.0;
        let expected = 100.0 - 100.0 / (1.0 + avg_gain / (avg_loss + RSI_EPSILON));
        assert!((values.last().unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_running_max_is_monotone() {
        let prices = sample_prices();
        let peaks = running_max(&prices);
        assert_eq!(peaks.len(), prices.len());
        for w in peaks.windows(2) {
            assert!(w[1] >= w[0]);
        }
    }

    #[test]
    fn test_drawdowns_never_positive() {
        let prices = sample_prices();
        for d in drawdowns(&prices) {
            assert!(d <= 0.0);
        }
    }

    #[test]
    fn test_drawdown_zero_at_all_time_high() {
        let prices = vec![10.0, 8.0, 9.0, 12.0];
        let stats = drawdown_stats(&prices).unwrap();
        assert_eq!(stats.current_pct, 0.0);
        assert!((stats.max_pct - (-20.0)).abs() < 1e-9);
    }

    #[test]
    fn test_drawdown_stats_empty() {
        assert!(drawdown_stats(&[]).is_none());
    }

    #[test]
    fn test_average_correction_filters_noise() {
        // -2% wiggle is ignored, the -20% and -10% points count
        let prices = vec![100.0, 98.0, 100.0, 80.0, 90.0, 100.0];
        let stats = drawdown_stats(&prices).unwrap();
        let avg = stats.avg_correction_pct.unwrap();
        assert!((avg - (-15.0)).abs() < 1e-9);
    }

    #[test]
    fn test_average_correction_undefined_without_corrections() {
        let prices = vec![100.0, 99.0, 101.0, 100.5, 102.0];
        let stats = drawdown_stats(&prices).unwrap();
        assert_eq!(stats.avg_correction_pct, None);
    }
}
