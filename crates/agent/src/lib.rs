//! Recipe generation runtime.
//!
//! This crate turns a trend signal plus seasonal and market context into a
//! complete recipe:
//! - builds the generation prompt (`prompt`)
//! - calls the configured generator through [`llm::LlmClient`]
//! - extracts a draft from free-form output (`parser`, `normalize`)
//! - escalates through the stage machine until a draft is complete (`orchestrator`)
//! - tags ingredients and assembles the final [`Recipe`](bakecast_core::Recipe) (`runtime`)
//! - scans a date horizon and scores one recipe per upcoming event (`forecast`, `analytics`)
//!
//! # Safety Principle
//!
//! The generator is never trusted. Anything it returns is parsed defensively,
//! and the deterministic template stage guarantees a usable recipe even when
//! every generator call fails.

pub mod analytics;
pub mod categorize;
pub mod forecast;
pub mod llm;
pub mod normalize;
pub mod orchestrator;
pub mod parser;
pub mod prompt;
pub mod runtime;
pub mod template;

pub use analytics::{viral_potential, RecipeAnalytics};
pub use forecast::{EventRecipe, Forecast, ForecastPoint, ForecastRequest, ForecastSummary};
pub use orchestrator::{
    next_stage, AttemptOutcome, AuxiliaryOutput, GenerationAttempt, GenerationOrchestrator,
};
pub use parser::{ParseOutcome, ParseTier, RecipeParser};
pub use runtime::{GeneratedRecipe, RecipeRequest, RecipeRuntime, RuntimeSetupError, TrendInsight};
