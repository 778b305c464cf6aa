//! Regression models behind the trend predictor.
//!
//! Everything here is plain data: models fit deterministically from a seed and
//! serialize to JSON so a trained bundle can be reloaded without refitting.

mod boosting;
mod forest;
mod metrics;
mod scaler;
mod tree;

pub use boosting::GradientBoostingRegressor;
pub use forest::RandomForestRegressor;
pub use metrics::{mean_absolute_error, r2_score, RegressionMetrics};
pub use scaler::StandardScaler;
pub use tree::{RegressionNode, RegressionTree, TreeParams};

use serde::{Deserialize, Serialize};

/// Trees in the popularity forest.
pub const POPULARITY_TREES: usize = 100;
/// Boosting stages for the engagement model.
pub const ENGAGEMENT_STAGES: usize = 100;
/// Trees in the trend-class forest.
pub const TREND_CLASS_TREES: usize = 50;

/// A fitted regressor as stored in an artifact bundle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model_type", rename_all = "snake_case")]
pub enum TrainedRegressor {
    RandomForest(RandomForestRegressor),
    GradientBoosting(GradientBoostingRegressor),
}

impl TrainedRegressor {
    pub fn predict(&self, features: &[f64]) -> f64 {
        match self {
            Self::RandomForest(model) => model.predict(features),
            Self::GradientBoosting(model) => model.predict(features),
        }
    }

    fn trees(&self) -> &[RegressionTree] {
        match self {
            Self::RandomForest(model) => model.trees(),
            Self::GradientBoosting(model) => model.stages(),
        }
    }

    /// Every tree is well formed and reads exactly `n_features` inputs.
    pub fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.trees().is_empty() {
            return Err("regressor has no fitted trees".to_string());
        }
        for (index, tree) in self.trees().iter().enumerate() {
            if tree.n_features() != n_features {
                return Err(format!(
                    "tree {index} expects {} features, schema has {n_features}",
                    tree.n_features()
                ));
            }
            tree.validate().map_err(|reason| format!("tree {index}: {reason}"))?;
        }
        Ok(())
    }
}
