use std::fmt;

use crate::domain::context::{MarketContext, SeasonalContext};

/// Raw trend strength above which the social boosters are added.
pub const BOOSTER_THRESHOLD: f64 = 0.7;

const TREND_BOOSTERS: &[&str] = &["viral", "trending", "instagram-worthy", "aesthetic"];

const SEGMENT_INGREDIENTS: &[(&str, &[&str])] = &[
    ("gen_z", &["matcha", "taro", "ube", "brown sugar", "cheese foam"]),
    ("millennials", &["vanilla bean", "dark chocolate", "salted caramel", "artisan coffee"]),
    ("gym", &["protein powder", "oats", "greek yogurt", "berries", "nuts"]),
    ("kids", &["strawberry", "vanilla", "colorful sprinkles", "mild chocolate"]),
];

/// Strategy the context assembler uses to suggest ingredients for a context.
pub trait IngredientRecommender: fmt::Debug + Send + Sync {
    fn recommend(
        &self,
        seasonal: &SeasonalContext,
        market: &MarketContext,
        trend_strength: f64,
    ) -> Vec<String>;
}

/// Season flavours, then the segment's signature ingredients, then boosters
/// for strong trends. First occurrence wins.
#[derive(Clone, Copy, Debug, Default)]
pub struct SegmentIngredientRecommender;

impl SegmentIngredientRecommender {
    pub fn segment_ingredients(segment_id: &str) -> &'static [&'static str] {
        SEGMENT_INGREDIENTS
            .iter()
            .find(|(id, _)| *id == segment_id)
            .map(|(_, ingredients)| *ingredients)
            .unwrap_or(&[])
    }
}

impl IngredientRecommender for SegmentIngredientRecommender {
    fn recommend(
        &self,
        seasonal: &SeasonalContext,
        market: &MarketContext,
        trend_strength: f64,
    ) -> Vec<String> {
        let boosters: &[&str] = if trend_strength > BOOSTER_THRESHOLD { TREND_BOOSTERS } else { &[] };
        let candidates = seasonal
            .trending_flavors
            .iter()
            .map(String::as_str)
            .chain(Self::segment_ingredients(&market.segment_id).iter().copied())
            .chain(boosters.iter().copied());

        let mut picked: Vec<String> = Vec::new();
        for candidate in candidates {
            let candidate = candidate.trim();
            if !candidate.is_empty() && !picked.iter().any(|seen| seen.eq_ignore_ascii_case(candidate)) {
                picked.push(candidate.to_string());
            }
        }
        picked
    }
}
