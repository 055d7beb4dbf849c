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
    fn test_ema_full_length_seeded_with_first_value() {
        let data = vec![22.0, 24.0, 23.0, 25.0, 26.0];
        let result = ema(&data, 3);

        assert_eq!(result.len(), data.len());
        assert!((result[0] - 22.0).abs() < 0.001);
        // k = 0.5 for period 3: next = 24*0.5 + 22*0.5
        assert!((result[1] - 23.0).abs() < 0.001);
    }

    #[test]
    fn test_ema_empty_data() {
        let data: Vec<f64> = vec![];
        let result = ema(&data, 5);

        assert_eq!(result.len(), 0);
    }

    #[test]
    fn test_ema_increases_with_uptrend() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        let result = ema(&data, 3);

        for i in 1..result.len() {
            assert!(result[i] > result[i - 1]);
        }
    }

    #[test]
    fn test_rsi_within_bounds() {
        let prices = sample_prices();
        let result = rsi(&prices, 14);

        assert!(!result.is_empty());
        for &value in &result {
            assert!((0.0..=100.0).contains(&value));
        }
    }

    #[test]
    fn test_rsi_insufficient_data() {
        let data = vec![1.0, 2.0, 3.0];
        let result = rsi(&data, 14);

        assert_eq!(result.len(), 0);
    }

    #[test]
    fn test_rsi_flat_series_is_100() {
        // No gains and no losses: average loss is zero, which must resolve
        // to the defined value instead of a silent division by zero.
        let data = vec![50.0; 20];
        let result = rsi(&data, 14);

        assert!(!result.is_empty());
        for &value in &result {
            assert!((value - 100.0).abs() < 0.001);
        }
    }

    #[test]
    fn test_rsi_monotone_uptrend_is_100() {
        let data: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let result = rsi(&data, 14);

        assert!((result.last().unwrap() - 100.0).abs() < 0.001);
    }

    #[test]
    fn test_macd_series_are_aligned() {
        let prices = sample_prices();
        let result = macd(&prices, 12, 26, 9);

        assert_eq!(result.macd_line.len(), prices.len());
        assert_eq!(result.signal_line.len(), prices.len());
        assert_eq!(result.histogram.len(), prices.len());
    }

    #[test]
    fn test_macd_histogram() {
        let prices = sample_prices();
        let result = macd(&prices, 12, 26, 9);

        for i in 0..result.histogram.len() {
            let expected = result.macd_line[i] - result.signal_line[i];
            assert!((result.histogram[i] - expected).abs() < 0.001);
        }
    }

    #[test]
    fn test_bollinger_bands_basic() {
        let prices = sample_prices();
        let result = bollinger_bands(&prices, 20, 2.0);

        assert_eq!(result.upper.len(), result.middle.len());
        assert_eq!(result.middle.len(), result.lower.len());
        assert_eq!(result.middle.len(), 1);
    }

    #[test]
    fn test_bollinger_bands_ordering() {
        let prices = sample_prices();
        let result = bollinger_bands(&prices, 10, 2.0);

        for i in 0..result.upper.len() {
            assert!(result.upper[i] >= result.middle[i]);
            assert!(result.middle[i] >= result.lower[i]);
        }
    }

    #[test]
    fn test_bollinger_bands_collapse_on_constant_prices() {
        let prices = vec![100.0; 20];
        let result = bollinger_bands(&prices, 10, 2.0);

        for i in 0..result.upper.len() {
            assert!((result.upper[i] - result.lower[i]).abs() < 0.001);
        }
    }

    #[test]
    fn test_stochastic_within_bounds() {
        let prices = sample_prices();
        let high: Vec<f64> = prices.iter().map(|p| p + 0.5).collect();
        let low: Vec<f64> = prices.iter().map(|p| p - 0.5).collect();
        let result = stochastic(&high, &low, &prices, 14, 3);

        assert!(!result.k.is_empty());
        assert!(!result.d.is_empty());
        for &value in result.k.iter().chain(result.d.iter()) {
            assert!((0.0..=100.0).contains(&value));
        }
    }

    #[test]
    fn test_stochastic_flat_window_uses_midpoint() {
        let flat = vec![100.0; 16];
        let result = stochastic(&flat, &flat, &flat, 14, 3);

        for &value in &result.k {
            assert!((value - 50.0).abs() < 0.001);
        }
    }

    #[test]
    fn test_stochastic_insufficient_data() {
        let data = vec![1.0; 5];
        let result = stochastic(&data, &data, &data, 14, 3);

        assert_eq!(result.k.len(), 0);
    }

    #[test]
    fn test_pivot_point_ordering() {
        let prices = sample_prices();
        let high: Vec<f64> = prices.iter().map(|p| p + 1.0).collect();
        let low: Vec<f64> = prices.iter().map(|p| p - 1.0).collect();
        let levels = pivot_points(&high, &low, &prices, 20).unwrap();

        // Whenever the window high exceeds the low the levels nest strictly.
        assert!(levels.r2 > levels.r1);
        assert!(levels.r1 > levels.pivot);
        assert!(levels.pivot > levels.s1);
        assert!(levels.s1 > levels.s2);
    }

    #[test]
    fn test_pivot_point_formulas() {
        let high = vec![110.0, 112.0];
        let low = vec![90.0, 95.0];
        let close = vec![100.0, 105.0];
        let levels = pivot_points(&high, &low, &close, 20).unwrap();

        let pivot = (112.0 + 90.0 + 105.0) / 3.0;
        assert!((levels.pivot - pivot).abs() < 0.001);
        assert!((levels.r1 - (2.0 * pivot - 90.0)).abs() < 0.001);
        assert!((levels.r2 - (pivot + 22.0)).abs() < 0.001);
        assert!((levels.s1 - (2.0 * pivot - 112.0)).abs() < 0.001);
        assert!((levels.s2 - (pivot - 22.0)).abs() < 0.001);
    }

    #[test]
    fn test_pivot_point_empty_input() {
        assert!(pivot_points(&[], &[], &[], 20).is_none());
    }
}
