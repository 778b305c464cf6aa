use serde::{Deserialize, Serialize};

use super::tree::{RegressionTree, TreeParams};

/// Least-squares gradient boosting over shallow regression trees.
///
/// Prediction is `init_value + learning_rate * sum(stage(x))`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub tree_params: TreeParams,
    init_value: f64,
    stages: Vec<RegressionTree>,
}

impl GradientBoostingRegressor {
    pub fn new(n_estimators: usize) -> Self {
        Self {
            n_estimators,
            learning_rate: 0.1,
            tree_params: TreeParams { max_depth: Some(3), ..TreeParams::default() },
            init_value: 0.0,
            stages: Vec::new(),
        }
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn fit(mut self, x: &[Vec<f64>], y: &[f64]) -> Self {
        let sample: Vec<usize> = (0..x.len()).collect();
        self.init_value = if y.is_empty() { 0.0 } else { y.iter().sum::<f64>() / y.len() as f64 };

        let mut current = vec![self.init_value; y.len()];
        let mut stages = Vec::with_capacity(self.n_estimators);
        for _ in 0..self.n_estimators {
            let residuals: Vec<f64> =
                y.iter().zip(&current).map(|(target, fitted)| target - fitted).collect();
            let stage = RegressionTree::fit(x, &residuals, &sample, self.tree_params);
            for (row, fitted) in x.iter().zip(current.iter_mut()) {
                *fitted += self.learning_rate * stage.predict(row);
            }
            stages.push(stage);
        }

        self.stages = stages;
        self
    }

    pub fn init_value(&self) -> f64 {
        self.init_value
    }

    pub fn stages(&self) -> &[RegressionTree] {
        &self.stages
    }

    pub fn predict(&self, features: &[f64]) -> f64 {
        self.stages
            .iter()
            .fold(self.init_value, |acc, stage| acc + self.learning_rate * stage.predict(features))
    }
}

#[cfg(test)]
mod tests {
    use super::GradientBoostingRegressor;

    #[test]
    fn boosting_reduces_training_error() {
        let x: Vec<Vec<f64>> = (0..30).map(|i| vec![i as f64]).collect();
        let y: Vec<f64> = (0..30).map(|i| if i < 15 { 0.0 } else { 10.0 }).collect();

        let model = GradientBoostingRegressor::new(50).fit(&x, &y);

        assert_eq!(model.init_value(), 5.0);
        assert_eq!(model.stages().len(), 50);
        assert!(model.predict(&[2.0]) < 1.0);
        assert!(model.predict(&[25.0]) > 9.0);
    }

    #[test]
    fn empty_training_set_predicts_zero() {
        let model = GradientBoostingRegressor::new(3).fit(&[], &[]);
        assert_eq!(model.predict(&[1.0]), 0.0);
    }
}
