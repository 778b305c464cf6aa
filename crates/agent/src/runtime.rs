use std::sync::Arc;

use bakecast_core::config::AppConfig;
use bakecast_core::context::{ContextAssembler, ContextError, MarketInsights};
use bakecast_core::domain::context::{MarketContext, SeasonalContext};
use bakecast_core::domain::recipe::{GenerationStage, Language, ParsedRecipeDraft, Recipe};
use bakecast_core::domain::trend::{TrendLevel, TrendScore};
use bakecast_core::errors::TrendError;
use bakecast_core::predictor::{ArtifactStore, ModelRegistry};
use bakecast_core::thresholds::{EnhancedTrendCalculator, ThresholdError};
use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::analytics::{viral_potential, RecipeAnalytics};
use crate::categorize::classify;
use crate::forecast::{
    clamp_horizon, occasion, rank_events, representative_point, trend_text, weekly_dates,
    EventRecipe, Forecast, ForecastPoint, ForecastRequest, ForecastSummary,
};
use crate::llm::{GenerationError, GenerationOptions, HttpLlmClient, LlmClient, LlmEnhancer, LlmTranslator};
use crate::orchestrator::{
    AuxiliaryOutput, GenerationAttempt, GenerationOrchestrator, OrchestrationRequest,
};

pub const DEFAULT_FALLBACK_TREND_STRENGTH: f64 = 0.5;

#[derive(Debug, Error)]
pub enum RuntimeSetupError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Thresholds(#[from] ThresholdError),
    #[error(transparent)]
    Generator(#[from] GenerationError),
    #[error(transparent)]
    Model(#[from] TrendError),
}

/// Predicted and re-weighted trend signal for one date and segment.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrendInsight {
    pub seasonal: SeasonalContext,
    pub market: MarketContext,
    pub score: TrendScore,
    pub enhanced_strength: f64,
    pub level: TrendLevel,
    pub is_trending: bool,
    pub is_viral: bool,
    pub recommended_ingredients: Vec<String>,
    pub market_insights: MarketInsights,
}

#[derive(Clone, Debug, Default)]
pub struct RecipeRequest {
    pub date: Option<NaiveDate>,
    pub segment: String,
    pub trend: Option<String>,
    pub occasion: Option<String>,
    pub ingredients: Option<String>,
    pub language: Option<Language>,
    pub auxiliary_output: Option<AuxiliaryOutput>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GeneratedRecipe {
    pub correlation_id: Uuid,
    pub recipe: Recipe,
    pub attempts: Vec<GenerationAttempt>,
    /// False when the trend model was unavailable and the fallback strength was used.
    pub model_scored: bool,
}

/// Request-scoped facade over context, prediction and generation.
pub struct RecipeRuntime {
    assembler: Arc<ContextAssembler>,
    registry: Arc<ModelRegistry>,
    calculator: EnhancedTrendCalculator,
    orchestrator: GenerationOrchestrator,
    language: Language,
    fallback_trend_strength: f64,
}

impl RecipeRuntime {
    pub fn new(
        assembler: Arc<ContextAssembler>,
        registry: Arc<ModelRegistry>,
        calculator: EnhancedTrendCalculator,
        orchestrator: GenerationOrchestrator,
    ) -> Self {
        Self {
            assembler,
            registry,
            calculator,
            orchestrator,
            language: Language::default(),
            fallback_trend_strength: DEFAULT_FALLBACK_TREND_STRENGTH,
        }
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn with_fallback_trend_strength(mut self, strength: f64) -> Self {
        self.fallback_trend_strength = strength;
        self
    }

    /// Wires every component from configuration. A missing bundle leaves the
    /// registry empty; a corrupt one is an error.
    pub fn from_config(config: &AppConfig) -> Result<Self, RuntimeSetupError> {
        let assembler = ContextAssembler::from_optional_path(config.context.tables_path.as_deref())?;
        let calculator = EnhancedTrendCalculator::from_optional_path(config.thresholds.path.as_deref())?;

        let registry = ModelRegistry::new(config.model.name.clone());
        match registry.load_from_store(&ArtifactStore::new(&config.model.artifact_dir)) {
            Ok(_) => {}
            Err(TrendError::ModelNotTrained { name }) => warn!(
                event_name = "runtime.model.missing",
                model = %name,
                "no trained bundle found; predictions will be unavailable"
            ),
            Err(error) => return Err(error.into()),
        }

        let client: Arc<dyn LlmClient> = Arc::new(HttpLlmClient::from_config(&config.llm)?);
        let options = GenerationOptions::from(&config.llm);
        let language = config.generation.language;
        let orchestrator = GenerationOrchestrator::new(Arc::clone(&client))
            .with_options(options)
            .with_translator(Arc::new(LlmTranslator::new(
                Arc::clone(&client),
                config.llm.max_output_tokens,
            )))
            .with_enhancer(Arc::new(LlmEnhancer::new(client, language, options)))
            .with_enhance_primary(config.generation.enhance_primary);

        Ok(Self::new(Arc::new(assembler), Arc::new(registry), calculator, orchestrator)
            .with_language(language)
            .with_fallback_trend_strength(config.generation.fallback_trend_strength))
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    pub fn assembler(&self) -> &Arc<ContextAssembler> {
        &self.assembler
    }

    /// Fails with `ModelNotTrained` when no bundle is installed.
    pub fn predict(&self, date: NaiveDate, segment: &str) -> Result<TrendInsight, TrendError> {
        let (seasonal, market) = self.assembler.assemble(date, segment);
        self.insight(seasonal, market, segment, None)
    }

    fn insight(
        &self,
        seasonal: SeasonalContext,
        market: MarketContext,
        segment: &str,
        topic: Option<&str>,
    ) -> Result<TrendInsight, TrendError> {
        let mut features = self.assembler.prediction_context(&seasonal, &market);
        features.topic = topic.map(str::to_string);
        let score = self.registry.predict(&features)?;
        let enhanced_strength = self.calculator.enhanced_strength(&score, &seasonal, segment);
        let recommended_ingredients =
            self.assembler.recommended_ingredients(&seasonal, &market, score.overall_strength);
        let market_insights = self.assembler.market_insights(&seasonal, &market);

        Ok(TrendInsight {
            level: self.calculator.level(enhanced_strength),
            is_trending: self.calculator.is_trending(enhanced_strength),
            is_viral: self.calculator.is_viral(enhanced_strength),
            recommended_ingredients,
            market_insights,
            seasonal,
            market,
            score,
            enhanced_strength,
        })
    }

    /// Always yields a complete recipe; an untrained model only lowers the signal quality.
    pub async fn generate(&self, request: RecipeRequest) -> GeneratedRecipe {
        let date = request.date.unwrap_or_else(|| Utc::now().date_naive());
        let language = request.language.unwrap_or(self.language);
        let (seasonal, market) = self.assembler.assemble(date, &request.segment);

        let trend_strength =
            match self.insight(
                seasonal.clone(),
                market.clone(),
                &request.segment,
                request.trend.as_deref(),
            ) {
                Ok(insight) => Some(insight.score.overall_strength),
                Err(error) => {
                    warn!(
                        event_name = "runtime.trend.fallback",
                        error = %error,
                        fallback = self.fallback_trend_strength,
                        "trend prediction unavailable; using fallback strength"
                    );
                    None
                }
            };

        let result = self
            .orchestrator
            .run(&OrchestrationRequest {
                seasonal: seasonal.clone(),
                market: market.clone(),
                trend_strength: trend_strength.unwrap_or(self.fallback_trend_strength),
                trend: request.trend.clone(),
                occasion: request.occasion.clone(),
                ingredients: request.ingredients.clone(),
                language,
                auxiliary_output: request.auxiliary_output,
            })
            .await;

        let recipe = build_recipe(RecipeParts {
            draft: result.draft,
            seasonal: &seasonal,
            market: &market,
            trend: request.trend.as_deref(),
            occasion: request.occasion.as_deref(),
            language,
            produced_by: result.produced_by,
            trend_strength,
        });
        info!(
            event_name = "runtime.recipe.generated",
            correlation_id = %result.correlation_id,
            recipe_id = %recipe.id,
            stage = %recipe.produced_by,
            "recipe ready"
        );

        GeneratedRecipe {
            correlation_id: result.correlation_id,
            recipe,
            attempts: result.attempts,
            model_scored: trend_strength.is_some(),
        }
    }
}

impl RecipeRuntime {
    /// Scans the horizon week by week, ranks the events it meets and generates
    /// one scored recipe per top event. Never fails; an untrained model falls
    /// back to the configured strength.
    pub async fn forecast(&self, request: ForecastRequest) -> Forecast {
        let start = request.start.unwrap_or_else(|| Utc::now().date_naive());
        let horizon_days = clamp_horizon(request.horizon_days);
        let points: Vec<ForecastPoint> = weekly_dates(start, horizon_days)
            .into_iter()
            .map(|date| self.forecast_point(date, &request.segment))
            .collect();
        let top_events = rank_events(&points, request.top_k);

        let mut recipes = Vec::with_capacity(top_events.len());
        for event in &top_events {
            let Some(point) = representative_point(&points, event) else {
                continue;
            };
            let generated = self
                .generate(RecipeRequest {
                    date: Some(point.date),
                    segment: request.segment.clone(),
                    trend: Some(trend_text(event, point)),
                    occasion: Some(occasion(event, point)),
                    language: request.language,
                    ..RecipeRequest::default()
                })
                .await;

            let (seasonal, market) = self.assembler.assemble(point.date, &request.segment);
            let analytics = RecipeAnalytics::analyze(&generated.recipe, &seasonal, &market);
            let market_insights = request
                .include_market_analysis
                .then(|| self.assembler.market_insights(&seasonal, &market));
            recipes.push(EventRecipe {
                event: event.clone(),
                date: point.date,
                viral_potential: viral_potential(&analytics, market_insights.as_ref()),
                correlation_id: generated.correlation_id,
                model_scored: generated.model_scored,
                recipe: generated.recipe,
                analytics,
                market_insights,
            });
        }

        let summary = ForecastSummary::from_points(&points);
        info!(
            event_name = "runtime.forecast.completed",
            segment = %request.segment,
            horizon_days,
            points = points.len(),
            events = top_events.len(),
            avg_trend_strength = summary.avg_trend_strength,
            "forecast ready"
        );

        Forecast {
            start,
            end: start.checked_add_signed(Duration::days(i64::from(horizon_days))).unwrap_or(start),
            segment: request.segment,
            points,
            top_events,
            summary,
            recipes,
        }
    }

    fn forecast_point(&self, date: NaiveDate, segment: &str) -> ForecastPoint {
        let (seasonal, market) = self.assembler.assemble(date, segment);
        let scored = match self.insight(seasonal.clone(), market, segment, None) {
            Ok(insight) => Some(insight.score.overall_strength),
            Err(error) => {
                warn!(
                    event_name = "runtime.forecast.fallback",
                    date = %date,
                    error = %error,
                    fallback = self.fallback_trend_strength,
                    "trend prediction unavailable for forecast point"
                );
                None
            }
        };
        ForecastPoint {
            date,
            season: seasonal.season,
            events: seasonal.events,
            trending_flavors: seasonal.trending_flavors,
            trend_strength: scored.unwrap_or(self.fallback_trend_strength),
            model_scored: scored.is_some(),
        }
    }
}

struct RecipeParts<'a> {
    draft: ParsedRecipeDraft,
    seasonal: &'a SeasonalContext,
    market: &'a MarketContext,
    trend: Option<&'a str>,
    occasion: Option<&'a str>,
    language: Language,
    produced_by: GenerationStage,
    trend_strength: Option<f64>,
}

fn trend_context(
    trend: Option<&str>,
    occasion: Option<&str>,
    seasonal: &SeasonalContext,
    segment: &str,
) -> String {
    let trend = trend.map(str::trim).filter(|value| !value.is_empty());
    let occasion = occasion.map(str::trim).filter(|value| !value.is_empty());
    match (trend, occasion) {
        (Some(trend), Some(occasion)) => format!("{trend} | {occasion}"),
        (Some(single), None) | (None, Some(single)) => single.to_string(),
        (None, None) => {
            format!("Generated for {} season targeting {segment}", seasonal.season.key())
        }
    }
}

/// Generator tags first, then the context tags, without duplicates.
fn context_tags(draft_tags: Vec<String>, seasonal: &SeasonalContext, segment: &str) -> Vec<String> {
    let context = [
        seasonal.season.key().to_string(),
        segment.to_string(),
        format!("month_{}", seasonal.month),
        format!("temp_{:.0}C", seasonal.temperature),
    ]
    .into_iter()
    .chain(seasonal.events.iter().cloned());

    let mut tags: Vec<String> = Vec::new();
    for tag in draft_tags.into_iter().chain(context) {
        if !tag.trim().is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

fn build_recipe(parts: RecipeParts<'_>) -> Recipe {
    let RecipeParts { draft, seasonal, market, trend, occasion, language, produced_by, trend_strength } =
        parts;
    let segment = market.segment_id.as_str();

    Recipe {
        id: Uuid::new_v4(),
        title: draft.title,
        description: draft.description,
        ingredients: draft.ingredients.into_iter().map(classify).collect(),
        instructions: draft.instructions,
        prep_time: draft.prep_time,
        cook_time: draft.cook_time,
        servings: draft.servings,
        difficulty: draft.difficulty,
        tags: context_tags(draft.tags, seasonal, segment),
        decoration_tips: draft.decoration_tips,
        marketing_caption: draft.marketing_caption,
        notes: draft.notes,
        trend_context: trend_context(trend, occasion, seasonal, segment),
        user_segment: segment.to_string(),
        language,
        produced_by,
        trend_strength,
        created_at: Utc::now(),
    }
}
