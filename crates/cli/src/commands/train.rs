use std::fs;
use std::path::{Path, PathBuf};

use bakecast_core::config::LoadOptions;
use bakecast_core::errors::{TrainingError, TrendError};
use bakecast_core::predictor::{ArtifactStore, BundleMetrics, TrainingOptions, TrendTrainer};
use bakecast_core::HistoricalRecord;
use serde::Serialize;

use crate::commands::{
    interface_failure, load_config, CommandResult, EXIT_ARTIFACT, EXIT_DATA_INPUT, EXIT_TRAINING,
};

#[derive(Debug, Clone)]
pub struct TrainArgs {
    /// JSON array of historical records.
    pub data: PathBuf,
}

#[derive(Debug, Serialize)]
struct TrainSummary {
    model: String,
    bundle_path: PathBuf,
    horizon_days: u32,
    feature_columns: usize,
    metrics: BundleMetrics,
}

pub fn run(args: &TrainArgs, options: LoadOptions) -> CommandResult {
    let config = match load_config("train", options) {
        Ok(config) => config,
        Err(result) => return result,
    };

    let records = match read_records(&args.data) {
        Ok(records) => records,
        Err(message) => return CommandResult::failure("train", "data_input", message, EXIT_DATA_INPUT),
    };

    let trainer = TrendTrainer::new(TrainingOptions::from(&config.model));
    let bundle = match trainer.train(&records) {
        Ok(bundle) => bundle,
        Err(TrendError::Training(error)) => {
            let class = match error {
                TrainingError::InsufficientData { .. } => "insufficient_data",
                TrainingError::NoFeatureColumns => "no_feature_columns",
            };
            return CommandResult::failure("train", class, error.to_string(), EXIT_TRAINING);
        }
        Err(error) => return interface_failure("train", error, EXIT_TRAINING),
    };

    let store = ArtifactStore::new(&config.model.artifact_dir);
    let bundle_path = match store.save(&bundle) {
        Ok(path) => path,
        Err(error) => return interface_failure("train", error, EXIT_ARTIFACT),
    };

    let summary = TrainSummary {
        model: bundle.name.clone(),
        bundle_path,
        horizon_days: bundle.horizon_days,
        feature_columns: bundle.feature_columns.len(),
        metrics: bundle.metrics,
    };
    CommandResult::success_with(
        "train",
        format!(
            "trained `{}` on {} rows ({} held out)",
            summary.model, summary.metrics.train_rows, summary.metrics.test_rows
        ),
        &summary,
    )
}

fn read_records(path: &Path) -> Result<Vec<HistoricalRecord>, String> {
    let raw = fs::read_to_string(path)
        .map_err(|error| format!("could not read `{}`: {error}", path.display()))?;
    serde_json::from_str(&raw)
        .map_err(|error| format!("could not parse records in `{}`: {error}", path.display()))
}
