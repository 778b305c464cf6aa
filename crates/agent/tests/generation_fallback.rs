use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bakecast_agent::llm::{GenerationError, GenerationOptions, LlmClient};
use bakecast_agent::{
    AttemptOutcome, ForecastRequest, GenerationOrchestrator, RecipeRequest, RecipeRuntime,
};
use bakecast_core::domain::recipe::{GenerationStage, IngredientCategory, Language};
use bakecast_core::domain::trend::HistoricalRecord;
use bakecast_core::{
    ContextAssembler, EnhancedTrendCalculator, ModelRegistry, ThresholdConfig, TrainingOptions,
    TrendTrainer,
};
use chrono::{Duration, NaiveDate};

struct FixedClient {
    reply: Result<String, GenerationError>,
    calls: AtomicUsize,
}

impl FixedClient {
    fn replying(reply: Result<String, GenerationError>) -> Arc<Self> {
        Arc::new(Self { reply, calls: AtomicUsize::new(0) })
    }
}

#[async_trait]
impl LlmClient for FixedClient {
    async fn generate(
        &self,
        _prompt: &str,
        _options: GenerationOptions,
    ) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone()
    }
}

fn runtime(client: Arc<FixedClient>) -> RecipeRuntime {
    RecipeRuntime::new(
        Arc::new(ContextAssembler::default()),
        Arc::new(ModelRegistry::new("bakery_trend")),
        EnhancedTrendCalculator::new(ThresholdConfig::default()),
        GenerationOrchestrator::new(client),
    )
}

fn history(count: usize) -> Vec<HistoricalRecord> {
    let segments = ["gen_z", "gym_goers", "office_workers"];
    let Some(start) = NaiveDate::from_ymd_opt(2024, 1, 1) else {
        panic!("valid start date");
    };
    (0..count)
        .map(|index| {
            let mut record = HistoricalRecord::new(start + Duration::days(3 * index as i64));
            record.views = Some(200.0 + (index * 37 % 500) as f64);
            record.likes = Some(20.0 + (index * 11 % 90) as f64);
            record.comments = Some((index % 7) as f64);
            record.engagement_rate = Some(1.0 + (index % 6) as f64 * 0.8);
            record.fame_score = Some(index as f64 / count as f64);
            record.segment = Some(segments[index % segments.len()].to_string());
            record.topic = Some(if index % 2 == 0 { "matcha" } else { "pumpkin" }.to_string());
            record
        })
        .collect()
}

fn trained_runtime(client: Arc<FixedClient>) -> RecipeRuntime {
    let bundle = match TrendTrainer::new(TrainingOptions::default()).train(&history(60)) {
        Ok(bundle) => bundle,
        Err(error) => panic!("training should succeed: {error}"),
    };
    RecipeRuntime::new(
        Arc::new(ContextAssembler::default()),
        Arc::new(ModelRegistry::with_bundle(bundle)),
        EnhancedTrendCalculator::new(ThresholdConfig::default()),
        GenerationOrchestrator::new(client),
    )
}

fn request(language: Language) -> RecipeRequest {
    RecipeRequest {
        date: NaiveDate::from_ymd_opt(2025, 10, 20),
        segment: "Gen Z".to_string(),
        trend: Some("Pumpkin Spice".to_string()),
        language: Some(language),
        ..RecipeRequest::default()
    }
}

#[tokio::test]
async fn empty_primary_output_ends_in_template_recipe() {
    let client = FixedClient::replying(Ok(String::new()));
    let generated = runtime(Arc::clone(&client)).generate(request(Language::En)).await;

    assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    assert_eq!(generated.recipe.produced_by, GenerationStage::Template);
    assert!(!generated.recipe.ingredients.is_empty());
    assert!(!generated.recipe.instructions.is_empty());
    assert_eq!(generated.recipe.title, "Pumpkin Spice Special Cake");

    let stages: Vec<_> = generated.attempts.iter().map(|attempt| attempt.stage).collect();
    assert_eq!(stages, vec![GenerationStage::Primary, GenerationStage::Template]);
    assert_eq!(generated.attempts[0].outcome, AttemptOutcome::Incomplete);
}

#[tokio::test]
async fn untrained_model_uses_fallback_strength() {
    let generated =
        runtime(FixedClient::replying(Err(GenerationError::Timeout))).generate(request(Language::Vi)).await;

    assert!(!generated.model_scored);
    assert_eq!(generated.recipe.trend_strength, None);
    assert_eq!(generated.recipe.user_segment, "gen_z");
    assert_eq!(generated.recipe.language, Language::Vi);
    assert_eq!(generated.recipe.trend_context, "Pumpkin Spice");
    assert!(generated.recipe.tags.contains(&"month_10".to_string()));
}

#[tokio::test]
async fn structured_primary_output_is_categorized() {
    let reply = r#"Sure! ```json
{"title": "Bánh Bí Đỏ Quế", "ingredients": ["300g bí đỏ", "200g bột mì", "2 quả trứng"],
 "instructions": ["Hấp bí", "Trộn và nướng"], "difficulty": "dễ"}
```"#;
    let generated =
        runtime(FixedClient::replying(Ok(reply.to_string()))).generate(request(Language::Vi)).await;
    let recipe = generated.recipe;

    assert_eq!(recipe.produced_by, GenerationStage::Primary);
    assert_eq!(recipe.title, "Bánh Bí Đỏ Quế");
    assert_eq!(recipe.ingredients.len(), 3);
    assert_eq!(recipe.ingredients[1].category, IngredientCategory::Dry);
    assert_eq!(recipe.ingredients[2].category, IngredientCategory::DairyEggs);
    assert!(recipe.ingredients[0].seasonal_bucket.is_some());
}

#[test]
fn untrained_prediction_is_an_error() {
    let runtime = runtime(FixedClient::replying(Err(GenerationError::Empty)));
    let Some(date) = NaiveDate::from_ymd_opt(2025, 10, 20) else {
        panic!("valid date");
    };
    assert!(runtime.predict(date, "gen_z").is_err());
}

#[test]
fn gym_goers_prediction_applies_segment_multiplier() {
    let runtime = trained_runtime(FixedClient::replying(Err(GenerationError::Empty)));
    let Some(date) = NaiveDate::from_ymd_opt(2025, 4, 10) else {
        panic!("valid date");
    };
    let insight = match runtime.predict(date, "gym_goers") {
        Ok(insight) => insight,
        Err(error) => panic!("trained runtime should predict: {error}"),
    };

    let calculator = EnhancedTrendCalculator::default();
    let boost =
        calculator.seasonal_boost(&insight.seasonal) + calculator.event_boost(&insight.seasonal.events);
    let expected = (insight.score.overall_strength * 0.9 * (1.0 + boost)).clamp(0.0, 1.0);

    assert_eq!(insight.market.segment_id, "gym");
    assert!((insight.enhanced_strength - expected).abs() < 1e-9);
    assert_eq!(insight.is_trending, calculator.is_trending(expected));

    assert!(insight.recommended_ingredients.contains(&"protein powder".to_string()));
    let boosted = insight.recommended_ingredients.contains(&"viral".to_string());
    assert_eq!(boosted, insight.score.overall_strength > 0.7);
    assert_eq!(insight.market_insights.channel_preferences[0], "Fitness apps");
}

#[tokio::test]
async fn forecast_scores_every_weekly_point_with_the_model() {
    let runtime = trained_runtime(FixedClient::replying(Ok(String::new())));
    let Some(start) = NaiveDate::from_ymd_opt(2025, 9, 20) else {
        panic!("valid date");
    };
    let forecast = runtime
        .forecast(ForecastRequest {
            start: Some(start),
            segment: "gen_z".to_string(),
            horizon_days: 28,
            top_k: 1,
            language: Some(Language::En),
            ..ForecastRequest::default()
        })
        .await;

    assert_eq!(forecast.points.len(), 4);
    for point in &forecast.points {
        let insight = match runtime.predict(point.date, "gen_z") {
            Ok(insight) => insight,
            Err(error) => panic!("trained runtime should predict: {error}"),
        };
        assert!(point.model_scored);
        assert!((point.trend_strength - insight.score.overall_strength).abs() < 1e-12);
    }

    assert_eq!(forecast.top_events, vec!["Halloween".to_string()]);
    assert_eq!(forecast.recipes.len(), 1);
    let event = &forecast.recipes[0];
    assert_eq!(event.date, forecast.points[2].date);
    assert_eq!(event.recipe.produced_by, GenerationStage::Template);
    assert_eq!(event.recipe.trend_context, "Halloween pumpkin cinnamon caramel | Halloween");
    assert!(event.market_insights.is_some());
    assert!((0.0..=1.0).contains(&event.viral_potential));
}

#[tokio::test]
async fn forecast_without_events_uses_regular_season() {
    let client = FixedClient::replying(Err(GenerationError::Timeout));
    let runtime = runtime(Arc::clone(&client));
    let Some(start) = NaiveDate::from_ymd_opt(2025, 4, 1) else {
        panic!("valid date");
    };
    let forecast = runtime
        .forecast(ForecastRequest {
            start: Some(start),
            segment: "kids".to_string(),
            horizon_days: 3,
            include_market_analysis: false,
            ..ForecastRequest::default()
        })
        .await;

    assert_eq!(forecast.points.len(), 1);
    assert!(!forecast.points[0].model_scored);
    assert_eq!(forecast.summary.avg_trend_strength, 0.5);
    assert_eq!(forecast.top_events, vec!["Regular season".to_string()]);
    assert_eq!(forecast.recipes[0].recipe.trend_context, "strawberry green tea sakura | Spring");
    assert!(forecast.recipes[0].market_insights.is_none());
    assert_eq!(client.calls.load(Ordering::SeqCst), 1);
}
