use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::trend::TrendScore;
use crate::errors::TrendError;
use crate::features::{FeatureEncoder, FeatureSchema, FeatureSource};
use crate::ml::{RegressionMetrics, StandardScaler, TrainedRegressor};

pub const BUNDLE_FORMAT_VERSION: u32 = 1;

/// Held-out evaluation recorded at training time.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BundleMetrics {
    pub train_rows: usize,
    pub test_rows: usize,
    pub popularity: RegressionMetrics,
    pub engagement: RegressionMetrics,
    pub trend_class: RegressionMetrics,
}

/// Everything inference needs, persisted as one JSON document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArtifactBundle {
    pub format_version: u32,
    pub name: String,
    pub trained_at: DateTime<Utc>,
    pub horizon_days: u32,
    pub feature_columns: Vec<String>,
    pub schema_digest: String,
    pub encoder: FeatureEncoder,
    pub scaler: StandardScaler,
    pub popularity: TrainedRegressor,
    pub engagement: TrainedRegressor,
    pub trend_class: TrainedRegressor,
    pub metrics: BundleMetrics,
}

impl ArtifactBundle {
    /// Regressors in popularity, engagement, trend-class order.
    pub fn assemble(
        name: String,
        trained_at: DateTime<Utc>,
        horizon_days: u32,
        encoder: FeatureEncoder,
        scaler: StandardScaler,
        regressors: [TrainedRegressor; 3],
        metrics: BundleMetrics,
    ) -> Self {
        let schema = encoder.schema();
        let feature_columns = schema.columns().to_vec();
        let schema_digest = schema.digest();
        let [popularity, engagement, trend_class] = regressors;
        Self {
            format_version: BUNDLE_FORMAT_VERSION,
            name,
            trained_at,
            horizon_days,
            feature_columns,
            schema_digest,
            encoder,
            scaler,
            popularity,
            engagement,
            trend_class,
            metrics,
        }
    }

    /// Integrity checks run on every load. Width disagreements are schema mismatches;
    /// anything else that does not line up marks the bundle corrupt.
    pub fn validate(&self) -> Result<(), TrendError> {
        let corrupt = |reason: String| TrendError::CorruptBundle { name: self.name.clone(), reason };

        if self.format_version != BUNDLE_FORMAT_VERSION {
            return Err(corrupt(format!("unsupported format version {}", self.format_version)));
        }
        if self.feature_columns.is_empty() {
            return Err(corrupt("bundle has no feature columns".to_string()));
        }

        let expected = self.feature_columns.len();
        let schema = FeatureSchema::from_columns(self.feature_columns.clone());
        if schema.digest() != self.schema_digest {
            return Err(corrupt("schema digest does not match feature columns".to_string()));
        }
        if self.encoder.schema().len() != expected {
            return Err(TrendError::SchemaMismatch {
                expected,
                actual: self.encoder.schema().len(),
            });
        }
        if self.encoder.schema() != &schema {
            return Err(corrupt("encoder schema differs from feature columns".to_string()));
        }
        if !self.encoder.covers_schema() {
            return Err(corrupt("encoder is missing a categorical vocabulary".to_string()));
        }
        if self.scaler.n_features() != expected {
            return Err(TrendError::SchemaMismatch { expected, actual: self.scaler.n_features() });
        }

        for (label, model) in [
            ("popularity", &self.popularity),
            ("engagement", &self.engagement),
            ("trend_class", &self.trend_class),
        ] {
            model.validate(expected).map_err(|reason| corrupt(format!("{label} model: {reason}")))?;
        }
        Ok(())
    }

    /// Encoded and standardised row; its width must match both the persisted
    /// feature columns and the fitted scaler.
    pub fn scaled_features<S: FeatureSource>(&self, source: &S) -> Result<Vec<f64>, TrendError> {
        let raw = self.encoder.encode_for_width(source, self.feature_columns.len())?;
        if raw.len() != self.scaler.n_features() {
            return Err(TrendError::SchemaMismatch {
                expected: self.scaler.n_features(),
                actual: raw.len(),
            });
        }
        Ok(self.scaler.transform_row(&raw))
    }

    pub fn predict<S: FeatureSource>(&self, source: &S) -> Result<TrendScore, TrendError> {
        let features = self.scaled_features(source)?;

        Ok(TrendScore::from_components(
            self.popularity.predict(&features),
            self.engagement.predict(&features),
            self.trend_class.predict(&features),
        ))
    }
}

/// File-backed bundle storage, one `<name>.json` per model.
#[derive(Clone, Debug)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.json"))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).is_file()
    }

    /// Writes to a temporary sibling first so readers never observe a partial file.
    pub fn save(&self, bundle: &ArtifactBundle) -> Result<PathBuf, TrendError> {
        fs::create_dir_all(&self.root).map_err(|source| io_error(&self.root, source))?;

        let path = self.path_for(&bundle.name);
        let staging = self.root.join(format!("{}.json.tmp", bundle.name));
        let payload = serde_json::to_vec_pretty(bundle)?;
        fs::write(&staging, payload).map_err(|source| io_error(&staging, source))?;
        fs::rename(&staging, &path).map_err(|source| io_error(&path, source))?;

        tracing::info!(
            event_name = "predictor.bundle.saved",
            model = %bundle.name,
            path = %path.display(),
            "artifact bundle saved"
        );
        Ok(path)
    }

    pub fn load(&self, name: &str) -> Result<ArtifactBundle, TrendError> {
        let path = self.path_for(name);
        if !path.is_file() {
            return Err(TrendError::ModelNotTrained { name: name.to_string() });
        }

        let payload = fs::read(&path).map_err(|source| io_error(&path, source))?;
        let bundle: ArtifactBundle = serde_json::from_slice(&payload)?;
        if bundle.name != name {
            return Err(TrendError::CorruptBundle {
                name: name.to_string(),
                reason: format!("file holds bundle `{}`", bundle.name),
            });
        }
        bundle.validate()?;
        Ok(bundle)
    }
}

fn io_error(path: &Path, source: std::io::Error) -> TrendError {
    TrendError::ArtifactIo { path: path.to_path_buf(), source }
}
