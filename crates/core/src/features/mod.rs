//! Feature encoding shared by training and inference.
//!
//! The ordered column list is fixed at training time and persisted with the
//! models. Inference must encode through the same [`FeatureEncoder`] so each
//! position keeps its meaning.

mod encoder;
mod source;

pub use encoder::{FeatureEncoder, LabelEncoder, UNSEEN_CATEGORY_CODE};
pub use source::{CategoricalField, FeatureSource, PredictionContext, MISSING_CATEGORY};

use serde::{Deserialize, Serialize};

/// Every column the encoder knows how to produce, in vector order.
pub const BASE_FEATURE_COLUMNS: &[&str] = &[
    "views",
    "likes",
    "comments",
    "engagement_rate",
    "days_since_published",
    "food_type_count",
    "pastry_type_count",
    "fame_score",
    "month",
    "day_of_year",
    "weekday",
    "temperature_celsius",
    "rainfall_probability",
    "bakery_demand_factor",
    "cold_drink_demand",
    "hot_beverage_demand",
    "ice_cream_demand",
    "tourism_factor",
    "market_potential",
    "competition_level",
    "growth_trend_score",
    "topic_encoded",
    "segment_encoded",
    "season_encoded",
    "viral_potential",
    "engagement_category",
];

pub const VIRAL_POTENTIAL: &str = "viral_potential";
pub const ENGAGEMENT_CATEGORY: &str = "engagement_category";

/// Upper edges of the engagement-rate buckets; the last bucket is open-ended.
const ENGAGEMENT_BUCKET_EDGES: [f64; 3] = [2.0, 4.0, 6.0];

pub fn viral_potential(likes: f64, views: f64) -> f64 {
    likes / (views + 1.0) * 100.0
}

/// Buckets (-inf, 2], (2, 4], (4, 6], (6, inf) map to 0..=3.
pub fn engagement_category(engagement_rate: f64) -> f64 {
    ENGAGEMENT_BUCKET_EDGES.iter().take_while(|edge| engagement_rate > **edge).count() as f64
}

/// Ordered feature columns with their integrity digest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    columns: Vec<String>,
}

impl FeatureSchema {
    /// Base columns minus any leak column. Unknown leak names are ignored.
    pub fn without_leaks(leak_columns: &[String]) -> Self {
        let columns = BASE_FEATURE_COLUMNS
            .iter()
            .filter(|column| !leak_columns.iter().any(|leak| leak == *column))
            .map(|column| column.to_string())
            .collect();
        Self { columns }
    }

    pub fn from_columns(columns: Vec<String>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn categorical_fields(&self) -> Vec<CategoricalField> {
        self.columns.iter().filter_map(|column| CategoricalField::from_column(column)).collect()
    }

    /// blake3 over the newline-joined column names.
    pub fn digest(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for column in &self.columns {
            hasher.update(column.as_bytes());
            hasher.update(b"\n");
        }
        hasher.finalize().to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{engagement_category, viral_potential, FeatureSchema, BASE_FEATURE_COLUMNS};

    #[test]
    fn engagement_buckets_are_right_inclusive() {
        assert_eq!(engagement_category(-1.0), 0.0);
        assert_eq!(engagement_category(2.0), 0.0);
        assert_eq!(engagement_category(2.01), 1.0);
        assert_eq!(engagement_category(4.0), 1.0);
        assert_eq!(engagement_category(6.0), 2.0);
        assert_eq!(engagement_category(12.5), 3.0);
    }

    #[test]
    fn viral_potential_guards_zero_views() {
        assert_eq!(viral_potential(10.0, 0.0), 1000.0);
        assert!((viral_potential(50.0, 999.0) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn leak_columns_are_removed_in_order() {
        let leaks = vec!["views".to_string(), "fame_score".to_string(), "not_a_column".to_string()];
        let schema = FeatureSchema::without_leaks(&leaks);

        assert_eq!(schema.len(), BASE_FEATURE_COLUMNS.len() - 2);
        assert_eq!(schema.columns()[0], "likes");
        assert!(!schema.columns().iter().any(|column| column == "fame_score"));
    }

    #[test]
    fn digest_changes_with_column_order() {
        let forward = FeatureSchema::from_columns(vec!["a".into(), "b".into()]);
        let reversed = FeatureSchema::from_columns(vec!["b".into(), "a".into()]);
        assert_ne!(forward.digest(), reversed.digest());
        assert_eq!(forward.digest(), forward.clone().digest());
    }
}
