//! Trend-strength training and inference.
//!
//! Training turns historical engagement records into an [`ArtifactBundle`]:
//! records are ordered by publication date, labels are taken from the record
//! `horizon_days` ahead, leak columns are dropped from the schema and every
//! fitted transform sees the training head of the timeline only.
//!
//! Inference goes through a [`ModelRegistry`] so the bundle can be replaced
//! while readers keep the one they started with.

mod bundle;
mod registry;

pub use bundle::{ArtifactBundle, ArtifactStore, BundleMetrics, BUNDLE_FORMAT_VERSION};
pub use registry::ModelRegistry;

use chrono::{Duration, Utc};

use crate::config::{ModelConfig, DEFAULT_LEAK_COLUMNS};
use crate::domain::trend::HistoricalRecord;
use crate::errors::{TrainingError, TrendError};
use crate::features::{FeatureEncoder, FeatureSchema};
use crate::ml::{
    GradientBoostingRegressor, RandomForestRegressor, RegressionMetrics, StandardScaler,
    TrainedRegressor, ENGAGEMENT_STAGES, POPULARITY_TREES, TREND_CLASS_TREES,
};

/// Fewest label-aligned records a model can be trained on.
pub const MIN_TRAINING_ROWS: usize = 5;

#[derive(Clone, Debug, PartialEq)]
pub struct TrainingOptions {
    pub model_name: String,
    pub horizon_days: u32,
    pub leak_columns: Vec<String>,
    pub train_fraction: f64,
    pub seed: u64,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            model_name: "bakery_trend".to_string(),
            horizon_days: 14,
            leak_columns: DEFAULT_LEAK_COLUMNS.iter().map(|column| column.to_string()).collect(),
            train_fraction: 0.8,
            seed: 42,
        }
    }
}

impl From<&ModelConfig> for TrainingOptions {
    fn from(config: &ModelConfig) -> Self {
        Self {
            model_name: config.name.clone(),
            horizon_days: config.horizon_days,
            leak_columns: config.leak_columns.clone(),
            train_fraction: config.train_fraction,
            seed: config.seed,
        }
    }
}

/// A record's features paired with the targets observed `horizon_days` later.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelledRecord {
    pub features: HistoricalRecord,
    pub popularity: f64,
    pub engagement: f64,
    pub trend_class: f64,
}

/// Forward-shifts targets on chronologically sorted records.
///
/// Each row takes its labels from the first record published on or after
/// `published_at + horizon_days`; rows without such a record are dropped. A zero
/// horizon keeps each row's own labels.
pub fn align_labels(sorted: &[HistoricalRecord], horizon_days: u32) -> Vec<LabelledRecord> {
    sorted
        .iter()
        .enumerate()
        .filter_map(|(index, record)| {
            let source = if horizon_days == 0 {
                Some(record)
            } else {
                let target = record.published_at + Duration::days(i64::from(horizon_days));
                let position = sorted.partition_point(|candidate| candidate.published_at < target);
                sorted.get(position.max(index))
            }?;
            Some(LabelledRecord {
                features: record.clone(),
                popularity: source.popularity_target(),
                engagement: source.engagement_target(),
                trend_class: source.trend_class_target(),
            })
        })
        .collect()
}

/// Splits ordered rows into a training head and a test tail, both non-empty when
/// there are at least two rows.
pub fn chronological_split<T>(rows: &[T], train_fraction: f64) -> (&[T], &[T]) {
    if rows.len() < 2 {
        return (rows, &[]);
    }
    let raw = (rows.len() as f64 * train_fraction).floor() as usize;
    rows.split_at(raw.clamp(1, rows.len() - 1))
}

#[derive(Clone, Debug, Default)]
pub struct TrendTrainer {
    options: TrainingOptions,
}

impl TrendTrainer {
    pub fn new(options: TrainingOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &TrainingOptions {
        &self.options
    }

    pub fn train(&self, records: &[HistoricalRecord]) -> Result<ArtifactBundle, TrendError> {
        let mut sorted = records.to_vec();
        sorted.sort_by_key(|record| record.published_at);

        let rows = align_labels(&sorted, self.options.horizon_days);
        if rows.len() < MIN_TRAINING_ROWS {
            return Err(TrainingError::InsufficientData {
                required: MIN_TRAINING_ROWS,
                available: rows.len(),
            }
            .into());
        }

        let schema = FeatureSchema::without_leaks(&self.options.leak_columns);
        if schema.is_empty() {
            return Err(TrainingError::NoFeatureColumns.into());
        }

        let (train, test) = chronological_split(&rows, self.options.train_fraction);
        let train_features: Vec<HistoricalRecord> =
            train.iter().map(|row| row.features.clone()).collect();
        let encoder = FeatureEncoder::fit(schema, &train_features);

        let raw_train = encode_rows(&encoder, train);
        let raw_test = encode_rows(&encoder, test);
        let scaler = StandardScaler::fit(&raw_train);
        let x_train = scaler.transform(&raw_train);
        let x_test = scaler.transform(&raw_test);

        let seed = self.options.seed;
        let popularity = TrainedRegressor::RandomForest(
            RandomForestRegressor::new(POPULARITY_TREES, seed)
                .fit(&x_train, &targets(train, |row| row.popularity)),
        );
        let engagement = TrainedRegressor::GradientBoosting(
            GradientBoostingRegressor::new(ENGAGEMENT_STAGES)
                .fit(&x_train, &targets(train, |row| row.engagement)),
        );
        let trend_class = TrainedRegressor::RandomForest(
            RandomForestRegressor::new(TREND_CLASS_TREES, seed)
                .fit(&x_train, &targets(train, |row| row.trend_class)),
        );

        let metrics = BundleMetrics {
            train_rows: train.len(),
            test_rows: test.len(),
            popularity: evaluate(&popularity, &x_test, &targets(test, |row| row.popularity)),
            engagement: evaluate(&engagement, &x_test, &targets(test, |row| row.engagement)),
            trend_class: evaluate(&trend_class, &x_test, &targets(test, |row| row.trend_class)),
        };

        tracing::info!(
            event_name = "predictor.training.completed",
            model = %self.options.model_name,
            train_rows = metrics.train_rows,
            test_rows = metrics.test_rows,
            features = encoder.schema().len(),
            popularity_r2 = metrics.popularity.r2,
            engagement_r2 = metrics.engagement.r2,
            trend_class_r2 = metrics.trend_class.r2,
            "trend models trained"
        );

        Ok(ArtifactBundle::assemble(
            self.options.model_name.clone(),
            Utc::now(),
            self.options.horizon_days,
            encoder,
            scaler,
            [popularity, engagement, trend_class],
            metrics,
        ))
    }
}

fn encode_rows(encoder: &FeatureEncoder, rows: &[LabelledRecord]) -> Vec<Vec<f64>> {
    rows.iter().map(|row| encoder.encode(&row.features)).collect()
}

fn targets(rows: &[LabelledRecord], pick: impl Fn(&LabelledRecord) -> f64) -> Vec<f64> {
    rows.iter().map(pick).collect()
}

fn evaluate(model: &TrainedRegressor, x: &[Vec<f64>], actual: &[f64]) -> RegressionMetrics {
    let predicted: Vec<f64> = x.iter().map(|row| model.predict(row)).collect();
    RegressionMetrics::evaluate(actual, &predicted)
}
