// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// Recursive (non-adjusted) EMA, seeded with the first close:
//
//   alpha  = 2 / (span + 1)
//   EMA_0  = close_0
//   EMA_t  = alpha * close_t + (1 - alpha) * EMA_{t-1}
//
// Every input close gets an output value, so the result lines up index for
// index with the price series.
// =============================================================================

/// Smoothing factor for a span-`span` EMA.
pub fn smoothing_factor(span: usize) -> f64 {
    2.0 / (span as f64 + 1.0)
}

/// Compute the EMA series for `closes` with the given `span`.
///
/// # Edge cases
/// - `span == 0` => empty vec
/// - empty `closes` => empty vec
pub fn calculate_ema(closes: &[f64], span: usize) -> Vec<f64> {
    if span == 0 || closes.is_empty() {
        return Vec::new();
    }

    let alpha = smoothing_factor(span);

    let mut result = Vec::with_capacity(closes.len());
    let mut prev = closes[0];
    result.push(prev);

    for &close in &closes[1..] {
        prev = alpha * close + (1.0 - alpha) * prev;
        result.push(prev);
    }

    result
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    // ---- smoothing_factor ------------------------------------------------

    #[test]
    fn smoothing_factor_for_standard_spans() {
        assert!((smoothing_factor(100) - 2.0 / 101.0).abs() < f64::EPSILON);
        assert!((smoothing_factor(200) - 2.0 / 201.0).abs() < f64::EPSILON);
        assert!((smoothing_factor(1) - 1.0).abs() < f64::EPSILON);
    }

    // ---- calculate_ema ---------------------------------------------------

    #[test]
    fn ema_empty_input() {
        assert!(calculate_ema(&[], 5).is_empty());
    }

    #[test]
    fn ema_span_zero() {
        assert!(calculate_ema(&[1.0, 2.0, 3.0], 0).is_empty());
    }

    #[test]
    fn ema_single_value_is_seed() {
        assert_eq!(calculate_ema(&[42.5], 100), vec![42.5]);
    }

    #[test]
    fn ema_output_length_matches_input() {
        let closes: Vec<f64> = (1..=37).map(|x| x as f64).collect();
        assert_eq!(calculate_ema(&closes, 200).len(), closes.len());
    }

    #[test]
    fn ema_replays_recurrence_exactly() {
        let closes: Vec<f64> = (0..250).map(|i| 50.0 + (i as f64 * 0.37).sin() * 10.0).collect();
        for span in [100usize, 200] {
            let ema = calculate_ema(&closes, span);
            let alpha = 2.0 / (span as f64 + 1.0);
            assert_eq!(ema[0], closes[0]);
            for i in 1..closes.len() {
                let expected = alpha * closes[i] + (1.0 - alpha) * ema[i - 1];
                assert_eq!(ema[i], expected, "span {span}, index {i}");
            }
        }
    }

    #[test]
    fn ema_known_values() {
        // span 3 => alpha = 0.5
        let ema = calculate_ema(&[2.0, 4.0, 8.0], 3);
        assert_eq!(ema, vec![2.0, 3.0, 5.5]);
    }

    #[test]
    fn ema_of_constant_series_is_constant() {
        // alpha * c + (1 - alpha) * c is not always exactly c in f64 (span 200
        // drifts by one ulp), so compare with a tolerance.
        for span in [100usize, 200] {
            let ema = calculate_ema(&[100.0; 300], span);
            assert_eq!(ema[0], 100.0);
            for &v in &ema {
                assert!((v - 100.0).abs() < 1e-9, "span {span}: got {v}");
            }
        }
    }
}
