use std::sync::{Arc, PoisonError, RwLock};

use super::bundle::{ArtifactBundle, ArtifactStore};
use crate::domain::trend::TrendScore;
use crate::errors::TrendError;
use crate::features::FeatureSource;

/// Shared handle to the installed trend bundle.
///
/// Readers clone the `Arc` and keep predicting against it while `install`
/// swaps in a replacement.
#[derive(Debug)]
pub struct ModelRegistry {
    name: String,
    current: RwLock<Option<Arc<ArtifactBundle>>>,
}

impl ModelRegistry {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), current: RwLock::new(None) }
    }

    pub fn with_bundle(bundle: ArtifactBundle) -> Self {
        let registry = Self::new(bundle.name.clone());
        registry.install(bundle);
        registry
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replaces the installed bundle, returning the previous one.
    pub fn install(&self, bundle: ArtifactBundle) -> Option<Arc<ArtifactBundle>> {
        let next = Arc::new(bundle);
        let mut slot = self.current.write().unwrap_or_else(PoisonError::into_inner);
        tracing::info!(
            event_name = "predictor.registry.installed",
            model = %next.name,
            trained_at = %next.trained_at,
            "trend bundle installed"
        );
        slot.replace(next)
    }

    /// Loads and validates from the store before touching the installed pointer.
    pub fn load_from_store(&self, store: &ArtifactStore) -> Result<Arc<ArtifactBundle>, TrendError> {
        let bundle = store.load(&self.name)?;
        self.install(bundle);
        self.current()
    }

    pub fn is_installed(&self) -> bool {
        self.current.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    pub fn current(&self) -> Result<Arc<ArtifactBundle>, TrendError> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(Arc::clone)
            .ok_or_else(|| TrendError::ModelNotTrained { name: self.name.clone() })
    }

    pub fn predict<S: FeatureSource>(&self, source: &S) -> Result<TrendScore, TrendError> {
        self.current()?.predict(source)
    }
}
