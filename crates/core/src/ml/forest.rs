use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::tree::{RegressionTree, TreeParams};

/// Bagged regression trees; the prediction is the mean over trees.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    pub n_estimators: usize,
    pub seed: u64,
    pub tree_params: TreeParams,
    trees: Vec<RegressionTree>,
}

impl RandomForestRegressor {
    pub fn new(n_estimators: usize, seed: u64) -> Self {
        Self { n_estimators, seed, tree_params: TreeParams::default(), trees: Vec::new() }
    }

    /// Bootstrap sampling is driven by `seed`, so refitting the same data reproduces the forest.
    pub fn fit(mut self, x: &[Vec<f64>], y: &[f64]) -> Self {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let n = x.len();
        self.trees = (0..self.n_estimators)
            .map(|_| {
                let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                RegressionTree::fit(x, y, &sample, self.tree_params)
            })
            .collect();
        self
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }

    pub fn predict(&self, features: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.trees.iter().map(|tree| tree.predict(features)).sum();
        sum / self.trees.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::RandomForestRegressor;

    fn linear_data() -> (Vec<Vec<f64>>, Vec<f64>) {
        let x: Vec<Vec<f64>> = (0..40).map(|i| vec![i as f64, (i % 3) as f64]).collect();
        let y: Vec<f64> = (0..40).map(|i| 2.0 * i as f64).collect();
        (x, y)
    }

    #[test]
    fn same_seed_reproduces_predictions() {
        let (x, y) = linear_data();
        let first = RandomForestRegressor::new(10, 42).fit(&x, &y);
        let second = RandomForestRegressor::new(10, 42).fit(&x, &y);

        assert_eq!(first, second);
        assert_eq!(first.trees().len(), 10);
    }

    #[test]
    fn forest_tracks_monotone_target() {
        let (x, y) = linear_data();
        let forest = RandomForestRegressor::new(20, 7).fit(&x, &y);

        let low = forest.predict(&[3.0, 0.0]);
        let high = forest.predict(&[35.0, 2.0]);
        assert!(low < high, "expected {low} < {high}");
        assert!((0.0..=78.0).contains(&low));
    }

    #[test]
    fn unfitted_forest_predicts_zero() {
        assert_eq!(RandomForestRegressor::new(5, 1).predict(&[1.0]), 0.0);
    }
}
