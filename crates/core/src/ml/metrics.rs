use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub mae: f64,
    pub r2: f64,
    pub samples: usize,
}

impl RegressionMetrics {
    pub fn evaluate(actual: &[f64], predicted: &[f64]) -> Self {
        Self {
            mae: mean_absolute_error(actual, predicted),
            r2: r2_score(actual, predicted),
            samples: actual.len().min(predicted.len()),
        }
    }
}

pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> f64 {
    let n = actual.len().min(predicted.len());
    if n == 0 {
        return 0.0;
    }
    actual.iter().zip(predicted).map(|(a, p)| (a - p).abs()).sum::<f64>() / n as f64
}

/// Coefficient of determination. A constant target scores 1 when matched exactly, else 0.
pub fn r2_score(actual: &[f64], predicted: &[f64]) -> f64 {
    let n = actual.len().min(predicted.len());
    if n == 0 {
        return 0.0;
    }
    let mean = actual[..n].iter().sum::<f64>() / n as f64;
    let ss_res: f64 = actual.iter().zip(predicted).map(|(a, p)| (a - p).powi(2)).sum();
    let ss_tot: f64 = actual[..n].iter().map(|a| (a - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

#[cfg(test)]
mod tests {
    use super::{mean_absolute_error, r2_score, RegressionMetrics};

    #[test]
    fn perfect_predictions_score_one() {
        let actual = [1.0, 2.0, 3.0];
        assert_eq!(mean_absolute_error(&actual, &actual), 0.0);
        assert_eq!(r2_score(&actual, &actual), 1.0);
    }

    #[test]
    fn mean_prediction_scores_zero_r2() {
        let actual = [1.0, 2.0, 3.0];
        let predicted = [2.0, 2.0, 2.0];
        assert_eq!(r2_score(&actual, &predicted), 0.0);
        assert!((mean_absolute_error(&actual, &predicted) - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn empty_inputs_are_harmless() {
        let metrics = RegressionMetrics::evaluate(&[], &[]);
        assert_eq!(metrics.samples, 0);
        assert_eq!(metrics.mae, 0.0);
    }
}
