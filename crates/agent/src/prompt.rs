use bakecast_core::domain::context::{MarketContext, SeasonalContext};
use bakecast_core::domain::recipe::Language;

/// JSON shape every generation prompt asks for.
const RECIPE_SCHEMA: &str = r#"{
  "title": "...",
  "description": "...",
  "ingredients": [{"name": "...", "quantity": "...", "unit": "..."}],
  "instructions": ["Step 1: ...", "Step 2: ..."],
  "prep_time": "...",
  "cook_time": "...",
  "servings": "...",
  "difficulty": "easy|medium|hard",
  "tags": ["..."],
  "decoration_tips": "...",
  "marketing_caption": "...",
  "notes": "..."
}"#;

/// Inputs for the primary generation prompt.
#[derive(Clone, Debug)]
pub struct PromptContext<'a> {
    pub seasonal: &'a SeasonalContext,
    pub market: &'a MarketContext,
    pub trend_strength: f64,
    pub trend: Option<&'a str>,
    pub occasion: Option<&'a str>,
    pub ingredients: Option<&'a str>,
    pub language: Language,
}

fn joined(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        empty.to_string()
    } else {
        items.join(", ")
    }
}

/// A titled block of `- ` bullets followed by a blank line.
fn section(title: &str, bullets: &[String]) -> String {
    let mut block = format!("{title}\n");
    for bullet in bullets {
        block.push_str("- ");
        block.push_str(bullet);
        block.push('\n');
    }
    block.push('\n');
    block
}

pub fn primary_prompt(context: &PromptContext<'_>) -> String {
    let seasonal = context.seasonal;
    let market = context.market;

    let market_situation = section(
        "MARKET SITUATION",
        &[
            format!("Season: {} (month {})", seasonal.season, seasonal.month),
            format!("Temperature: {:.0}°C", seasonal.temperature),
            format!("Events: {}", joined(&seasonal.events, "none")),
            format!("Trending flavors: {}", joined(&seasonal.trending_flavors, "varied")),
            format!("Popular occasions: {}", joined(&seasonal.popular_occasions, "everyday")),
            format!("Demand factor: {:.1}", seasonal.demand_factor),
        ],
    );

    let customer_segment = section(
        "CUSTOMER SEGMENT",
        &[
            format!("Segment: {}", market.description),
            format!("Market potential: {:.1}/1.0", market.market_potential),
            format!("Competition: {:.1}/1.0", market.competition_level),
            format!("Growth trend: {:?}", market.growth_trend),
            format!("Preferred flavors: {}", joined(&market.preferred_flavors, "varied")),
            format!("Price sensitivity: {:?}", market.price_sensitivity),
            format!("Purchase frequency: {:?}", market.purchase_frequency),
        ],
    );

    let mut signal = vec![
        format!("Predicted trend strength: {:.2}/1.0", context.trend_strength),
        format!("Trend keywords: {}", context.trend.unwrap_or("none")),
        format!("Occasion: {}", context.occasion.unwrap_or("everyday sales")),
    ];
    if let Some(ingredients) = context.ingredients {
        signal.push(format!("Build the recipe around these ingredients: {ingredients}"));
    }

    format!(
        "You are a professional pastry chef and bakery marketing specialist.\n\
         Create one creative, practical recipe a small bakery can produce.\n\n\
         {market_situation}{customer_segment}{trend_signal}\
         Write every field in {language}. Use exact quantities with units (g, ml, tsp).\n\
         Respond with JSON only, in exactly this shape:\n{RECIPE_SCHEMA}\n",
        trend_signal = section("TREND SIGNAL", &signal),
        language = context.language.display_name(),
    )
}

pub fn translation_prompt(text: &str, source: Language, target: Language) -> String {
    format!(
        "Translate the following text from {} to {} accurately and naturally. \
         Keep any JSON structure and keys unchanged.\n\n{text}\n\nReturn only the translation.",
        source.display_name(),
        target.display_name()
    )
}

pub fn enhancement_prompt(raw: &str, language: Language) -> String {
    format!(
        "The text below is a rough bakery recipe. Rewrite it as a complete recipe in {}, \
         filling in missing quantities, steps and a descriptive title.\n\
         Respond with JSON only, in exactly this shape:\n{RECIPE_SCHEMA}\n\nRECIPE:\n{raw}",
        language.display_name()
    )
}

#[cfg(test)]
mod tests {
    use bakecast_core::context::ContextAssembler;
    use bakecast_core::domain::recipe::Language;
    use chrono::NaiveDate;

    use super::{primary_prompt, translation_prompt, PromptContext};

    #[test]
    fn primary_prompt_embeds_context_and_score() {
        let Some(date) = NaiveDate::from_ymd_opt(2024, 10, 31) else {
            panic!("valid date");
        };
        let (seasonal, market) = ContextAssembler::default().assemble(date, "gen_z");
        let prompt = primary_prompt(&PromptContext {
            seasonal: &seasonal,
            market: &market,
            trend_strength: 0.62,
            trend: Some("labubu spooky"),
            occasion: None,
            ingredients: Some("pumpkin, flour"),
            language: Language::En,
        });

        assert!(prompt.contains("Season: Autumn (month 10)"));
        assert!(prompt.contains("Halloween"));
        assert!(prompt.contains("0.62/1.0"));
        assert!(prompt.contains("labubu spooky"));
        assert!(prompt.contains("pumpkin, flour"));
        assert!(prompt.contains("\"ingredients\""));
    }

    #[test]
    fn sections_are_separated_and_optional_ingredients_are_omitted() {
        let Some(date) = NaiveDate::from_ymd_opt(2024, 4, 2) else {
            panic!("valid date");
        };
        let (seasonal, market) = ContextAssembler::default().assemble(date, "kids");
        let prompt = primary_prompt(&PromptContext {
            seasonal: &seasonal,
            market: &market,
            trend_strength: 0.3,
            trend: None,
            occasion: Some("birthday"),
            ingredients: None,
            language: Language::Vi,
        });

        assert!(prompt.contains("\n\nCUSTOMER SEGMENT\n- Segment: "));
        assert!(prompt.contains("\n\nTREND SIGNAL\n- Predicted trend strength: 0.30/1.0\n"));
        assert!(prompt.contains("- Occasion: birthday\n\nWrite every field in Tiếng Việt."));
        assert!(!prompt.contains("Build the recipe around"));
        assert!(prompt.ends_with("}\n"));
    }

    #[test]
    fn translation_prompt_names_both_languages() {
        let prompt = translation_prompt("Bánh bí đỏ", Language::Vi, Language::En);
        assert!(prompt.contains("Tiếng Việt"));
        assert!(prompt.contains("English"));
        assert!(prompt.contains("Bánh bí đỏ"));
    }
}
