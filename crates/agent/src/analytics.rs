//! Performance estimates for a finished recipe in its market context.

use bakecast_core::context::MarketInsights;
use bakecast_core::domain::context::{MarketContext, PriceSensitivity, Season, SeasonalContext};
use bakecast_core::domain::recipe::{Difficulty, Recipe};
use serde::Serialize;

const VIRAL_TITLE_WORDS: &[&str] = &["trending", "viral", "hot", "new", "special", "unique", "amazing"];
const EVENT_TAGS: &[&str] = &["Halloween", "Christmas", "Valentine", "Tết"];
const VIRAL_INGREDIENTS: &[&str] = &["matcha", "taro", "ube", "brown sugar", "cheese foam"];

/// Neutral score used when an input carries no signal.
const NEUTRAL: f64 = 0.5;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecipeAnalytics {
    pub ingredient_trend_alignment: f64,
    pub timing_optimization: f64,
    pub segment_fit: f64,
    pub viral_elements: Vec<&'static str>,
}

impl RecipeAnalytics {
    pub fn analyze(recipe: &Recipe, seasonal: &SeasonalContext, market: &MarketContext) -> Self {
        Self {
            ingredient_trend_alignment: ingredient_alignment(recipe, &seasonal.trending_flavors),
            timing_optimization: timing_score(seasonal.month, seasonal.season),
            segment_fit: segment_fit(recipe.difficulty, market.price_sensitivity),
            viral_elements: viral_elements(recipe),
        }
    }
}

/// Share of ingredients whose name mentions a trending flavour.
pub fn ingredient_alignment(recipe: &Recipe, trending_flavors: &[String]) -> f64 {
    if trending_flavors.is_empty() {
        return NEUTRAL;
    }
    let flavors: Vec<String> = trending_flavors.iter().map(|flavor| flavor.to_lowercase()).collect();
    let aligned = recipe
        .ingredients
        .iter()
        .filter(|ingredient| {
            let name = ingredient.name.to_lowercase();
            flavors.iter().any(|flavor| name.contains(flavor.as_str()))
        })
        .count();
    (aligned as f64 / recipe.ingredients.len().max(1) as f64).min(1.0)
}

fn peak_months(season: Season) -> [u32; 3] {
    match season {
        Season::Spring => [3, 4, 5],
        Season::Summer => [6, 7, 8],
        Season::Autumn => [9, 10, 11],
        Season::Winter => [12, 1, 2],
    }
}

pub fn timing_score(month: u32, season: Season) -> f64 {
    let peaks = peak_months(season);
    if peaks.contains(&month) {
        0.9
    } else if month.abs_diff(peaks[1]) <= 1 {
        0.7
    } else {
        0.4
    }
}

pub fn segment_fit(difficulty: Difficulty, sensitivity: PriceSensitivity) -> f64 {
    let complexity = match difficulty {
        Difficulty::Easy => 0.8,
        Difficulty::Medium => 0.6,
        Difficulty::Hard => 0.3,
    };
    let price = match sensitivity {
        PriceSensitivity::Low if difficulty == Difficulty::Hard => 0.9,
        PriceSensitivity::Low => 0.6,
        PriceSensitivity::High if difficulty == Difficulty::Easy => 0.9,
        PriceSensitivity::High => 0.4,
        PriceSensitivity::Medium => 0.7,
    };
    (complexity + price) / 2.0
}

pub fn viral_elements(recipe: &Recipe) -> Vec<&'static str> {
    let mut elements = Vec::new();
    let title = recipe.title.to_lowercase();
    if VIRAL_TITLE_WORDS.iter().any(|word| title.contains(word)) {
        elements.push("Viral title keywords");
    }
    if recipe.tags.iter().any(|tag| EVENT_TAGS.contains(&tag.as_str())) {
        elements.push("Seasonal event tie-in");
    }
    if recipe
        .ingredients
        .iter()
        .any(|ingredient| VIRAL_INGREDIENTS.contains(&ingredient.name.to_lowercase().as_str()))
    {
        elements.push("Trending ingredients");
    }
    if recipe.difficulty == Difficulty::Easy {
        elements.push("Easy to make (shareable)");
    }
    elements
}

/// Weighted blend of the analytics and the segment's growth potential, capped at 1.
pub fn viral_potential(analytics: &RecipeAnalytics, insights: Option<&MarketInsights>) -> f64 {
    let growth = insights.map_or(NEUTRAL, |insights| insights.growth_potential);
    let elements = analytics.viral_elements.len() as f64 / 10.0;
    let score = analytics.ingredient_trend_alignment * 0.25
        + analytics.timing_optimization * 0.20
        + analytics.segment_fit * 0.20
        + elements * 0.20
        + growth * 0.15;
    score.min(1.0)
}

#[cfg(test)]
mod tests {
    use bakecast_core::context::{ContextAssembler, MarketInsights};
    use bakecast_core::domain::context::{PriceSensitivity, Season};
    use bakecast_core::domain::recipe::{
        Difficulty, GenerationStage, Ingredient, IngredientCategory, Language, Recipe,
    };
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    use super::{segment_fit, timing_score, viral_potential, RecipeAnalytics};

    fn ingredient(name: &str) -> Ingredient {
        Ingredient {
            name: name.to_string(),
            quantity: "100".to_string(),
            unit: Some("g".to_string()),
            category: IngredientCategory::Other,
            seasonal_bucket: None,
        }
    }

    fn recipe(title: &str, ingredients: &[&str], difficulty: Difficulty, tags: &[&str]) -> Recipe {
        Recipe {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: String::new(),
            ingredients: ingredients.iter().map(|name| ingredient(name)).collect(),
            instructions: vec!["Bake".to_string()],
            prep_time: "20 minutes".to_string(),
            cook_time: "30 minutes".to_string(),
            servings: "8 servings".to_string(),
            difficulty,
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
            decoration_tips: String::new(),
            marketing_caption: String::new(),
            notes: String::new(),
            trend_context: String::new(),
            user_segment: "gen_z".to_string(),
            language: Language::En,
            produced_by: GenerationStage::Template,
            trend_strength: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn timing_rewards_peak_months() {
        assert_eq!(timing_score(10, Season::Autumn), 0.9);
        assert_eq!(timing_score(1, Season::Winter), 0.9);
        assert_eq!(timing_score(8, Season::Autumn), 0.4);
        assert_eq!(timing_score(3, Season::Summer), 0.4);
    }

    #[test]
    fn segment_fit_blends_complexity_and_price() {
        assert!((segment_fit(Difficulty::Easy, PriceSensitivity::High) - 0.85).abs() < 1e-9);
        assert!((segment_fit(Difficulty::Hard, PriceSensitivity::Low) - 0.6).abs() < 1e-9);
        assert!((segment_fit(Difficulty::Medium, PriceSensitivity::Medium) - 0.65).abs() < 1e-9);
    }

    #[test]
    fn halloween_matcha_recipe_scores_every_factor() {
        let Some(date) = NaiveDate::from_ymd_opt(2025, 10, 20) else {
            panic!("valid date");
        };
        let (seasonal, market) = ContextAssembler::default().assemble(date, "gen_z");
        let recipe = recipe(
            "Special Pumpkin Matcha Cake",
            &["pumpkin puree", "matcha", "flour", "sugar"],
            Difficulty::Easy,
            &["Halloween"],
        );

        let analytics = RecipeAnalytics::analyze(&recipe, &seasonal, &market);
        assert_eq!(
            analytics.viral_elements,
            vec![
                "Viral title keywords",
                "Seasonal event tie-in",
                "Trending ingredients",
                "Easy to make (shareable)"
            ]
        );
        assert_eq!(analytics.timing_optimization, 0.9);
        assert!(analytics.ingredient_trend_alignment > 0.0);

        let insights = MarketInsights::derive(&seasonal, &market);
        let expected = analytics.ingredient_trend_alignment * 0.25
            + 0.9 * 0.20
            + analytics.segment_fit * 0.20
            + 0.4 * 0.20
            + insights.growth_potential * 0.15;
        let score = viral_potential(&analytics, Some(&insights));
        assert!((score - expected).abs() < 1e-9);
        assert!(score <= 1.0);
    }

    #[test]
    fn missing_insights_use_neutral_growth() {
        let analytics = RecipeAnalytics {
            ingredient_trend_alignment: 1.0,
            timing_optimization: 1.0,
            segment_fit: 1.0,
            viral_elements: Vec::new(),
        };
        assert!((viral_potential(&analytics, None) - 0.725).abs() < 1e-9);
    }
}
