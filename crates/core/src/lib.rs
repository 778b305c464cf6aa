pub mod config;
pub mod context;
pub mod domain;
pub mod errors;
pub mod features;
pub mod ml;
pub mod predictor;
pub mod thresholds;

pub use context::{
    canonical_segment_id, ContextAssembler, ContextError, ContextTables, IngredientRecommender,
    MarketInsights, SegmentCatalog, SegmentIngredientRecommender,
};
pub use domain::context::{GrowthTrend, MarketContext, Season, SeasonalContext};
pub use domain::recipe::{
    Difficulty, DraftIngredient, GenerationStage, Ingredient, IngredientCategory, Language,
    ParsedRecipeDraft, Recipe,
};
pub use domain::trend::{HistoricalRecord, TrendLevel, TrendScore};
pub use errors::{ApplicationError, DomainError, InterfaceError, TrainingError, TrendError};
pub use features::{FeatureEncoder, FeatureSchema, FeatureSource, PredictionContext};
pub use predictor::{
    ArtifactBundle, ArtifactStore, ModelRegistry, TrainingOptions, TrendTrainer,
};
pub use thresholds::{EnhancedTrendCalculator, ThresholdConfig, ThresholdError};
