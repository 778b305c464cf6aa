use bakecast_core::domain::context::Season;
use bakecast_core::domain::trend::HistoricalRecord;
use bakecast_core::features::PredictionContext;
use bakecast_core::predictor::{align_labels, chronological_split};
use bakecast_core::{ArtifactStore, ModelRegistry, TrainingOptions, TrendTrainer};
use chrono::{Duration, NaiveDate};
use tempfile::TempDir;

const SEGMENTS: [&str; 3] = ["gen_z", "millennials", "office_workers"];
const TOPICS: [&str; 3] = ["matcha", "pumpkin", "croissant"];

fn start() -> NaiveDate {
    match NaiveDate::from_ymd_opt(2024, 1, 1) {
        Some(date) => date,
        None => panic!("valid start date"),
    }
}

fn history(count: usize) -> Vec<HistoricalRecord> {
    (0..count)
        .map(|index| {
            let step = index as f64;
            let mut record = HistoricalRecord::new(start() + Duration::days(3 * index as i64));
            record.views = Some(200.0 + (index * 37 % 500) as f64);
            record.likes = Some(20.0 + (index * 11 % 90) as f64);
            record.comments = Some((index % 7) as f64);
            record.engagement_rate = Some(1.0 + (index % 6) as f64 * 0.8);
            record.fame_score = Some((step / count as f64).min(1.0));
            record.temperature_celsius = Some(22.0 + (index % 10) as f64);
            record.segment = Some(SEGMENTS[index % SEGMENTS.len()].to_string());
            record.topic = Some(TOPICS[index % TOPICS.len()].to_string());
            record
        })
        .collect()
}

fn trained_registry() -> ModelRegistry {
    let trainer = TrendTrainer::new(TrainingOptions::default());
    let bundle = match trainer.train(&history(60)) {
        Ok(bundle) => bundle,
        Err(error) => panic!("training should succeed: {error}"),
    };
    ModelRegistry::with_bundle(bundle)
}

fn autumn_gen_z() -> PredictionContext {
    let Some(date) = NaiveDate::from_ymd_opt(2024, 10, 15) else {
        panic!("valid scenario date");
    };
    PredictionContext {
        month: 10,
        temperature: 22.0,
        segment: "gen_z".to_string(),
        season: Season::Autumn,
        ..PredictionContext::for_date(date)
    }
}

#[test]
fn autumn_gen_z_prediction_is_bounded() {
    let registry = trained_registry();
    let score = match registry.predict(&autumn_gen_z()) {
        Ok(score) => score,
        Err(error) => panic!("prediction should succeed: {error}"),
    };

    assert!(score.overall_strength.is_finite());
    assert!((0.0..=1.0).contains(&score.overall_strength));
}

#[test]
fn chronological_split_never_puts_test_rows_before_train_rows() {
    let mut records = history(40);
    records.reverse();
    records.sort_by_key(|record| record.published_at);
    let rows = align_labels(&records, 14);
    let (train, test) = chronological_split(&rows, 0.8);

    assert!(!train.is_empty());
    assert!(!test.is_empty());
    let Some(latest_train) = train.iter().map(|row| row.features.published_at).max() else {
        panic!("train partition is non-empty");
    };
    assert!(test.iter().all(|row| row.features.published_at >= latest_train));
}

#[test]
fn unseen_segment_encodes_to_full_width() {
    let registry = trained_registry();
    let bundle = match registry.current() {
        Ok(bundle) => bundle,
        Err(error) => panic!("bundle installed: {error}"),
    };
    let mut context = autumn_gen_z();
    context.segment = "astronauts".to_string();

    let encoded = match bundle.scaled_features(&context) {
        Ok(encoded) => encoded,
        Err(error) => panic!("unseen segment must encode: {error}"),
    };
    assert_eq!(encoded.len(), bundle.feature_columns.len());
    assert!(registry.predict(&context).is_ok());
}

#[test]
fn saved_bundle_reloads_with_identical_predictions() {
    let registry = trained_registry();
    let Ok(bundle) = registry.current() else {
        panic!("bundle installed");
    };
    let temp_dir = match TempDir::new() {
        Ok(dir) => dir,
        Err(error) => panic!("temp dir: {error}"),
    };
    let store = ArtifactStore::new(temp_dir.path());
    if let Err(error) = store.save(&bundle) {
        panic!("save should succeed: {error}");
    }

    let reloaded = ModelRegistry::new(bundle.name.clone());
    if let Err(error) = reloaded.load_from_store(&store) {
        panic!("load should succeed: {error}");
    }
    let (Ok(before), Ok(after)) =
        (registry.predict(&autumn_gen_z()), reloaded.predict(&autumn_gen_z()))
    else {
        panic!("both registries predict");
    };
    assert!((before.overall_strength - after.overall_strength).abs() < 1e-9);
    assert!((before.popularity - after.popularity).abs() < 1e-9);
}

#[test]
fn untrained_registry_reports_model_not_trained() {
    let registry = ModelRegistry::new("bakery_trend");
    let error = match registry.predict(&autumn_gen_z()) {
        Ok(score) => panic!("expected failure, got {score:?}"),
        Err(error) => error,
    };
    assert!(error.to_string().contains("has not been trained"));
}
