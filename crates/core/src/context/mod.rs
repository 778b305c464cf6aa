//! Seasonal and market context derived from a date and a customer segment.

mod insights;
mod recommend;
mod tables;

pub use insights::{
    buying_triggers, channel_preferences, growth_potential, market_size, price_elasticity,
    MarketInsights,
};
pub use recommend::{IngredientRecommender, SegmentIngredientRecommender, BOOSTER_THRESHOLD};
pub use tables::{
    month_events, month_temperature, CompetitionLevel, ContextError, ContextTables,
    PotentialLevel, SeasonProfile, SegmentProfile, MONTH_TEMPERATURES,
};

use std::path::Path;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};

use crate::domain::context::{
    GrowthTrend, MarketContext, PriceSensitivity, PurchaseFrequency, Season, SeasonalContext,
};
use crate::features::PredictionContext;

const SEGMENT_ALIASES: &[(&str, &str)] = &[
    ("genz", "gen_z"),
    ("gen_z", "gen_z"),
    ("millennial", "millennials"),
    ("millennials", "millennials"),
    ("gym", "gym"),
    ("gym_goers", "gym"),
    ("kid", "kids"),
    ("kids", "kids"),
    ("health", "health"),
    ("health_conscious", "health"),
];

/// Lowercases, folds spaces and hyphens to `_`, then resolves known aliases.
pub fn canonical_segment_id(raw: &str) -> String {
    let folded: String = raw
        .trim()
        .to_lowercase()
        .chars()
        .map(|ch| if ch == ' ' || ch == '-' { '_' } else { ch })
        .collect();

    SEGMENT_ALIASES
        .iter()
        .find(|(alias, _)| *alias == folded)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(folded)
}

/// Resolves segment identifiers against the loaded profiles.
#[derive(Clone, Debug)]
pub struct SegmentCatalog {
    tables: Arc<ContextTables>,
}

impl SegmentCatalog {
    pub fn new(tables: Arc<ContextTables>) -> Self {
        Self { tables }
    }

    pub fn profile(&self, segment: &str) -> Option<&SegmentProfile> {
        self.tables.segment(&canonical_segment_id(segment))
    }

    pub fn market_context(&self, segment: &str) -> MarketContext {
        let segment_id = canonical_segment_id(segment);
        match self.tables.segment(&segment_id) {
            Some(profile) => MarketContext {
                description: profile.description.clone(),
                market_potential: profile.market_potential_score(),
                competition_level: profile.competition_score(),
                growth_trend: profile.growth_trend,
                preferred_flavors: profile.preferred_flavors.clone(),
                price_sensitivity: profile.price_sensitivity,
                purchase_frequency: profile.purchase_frequency,
                segment_id,
            },
            None => MarketContext {
                description: format!("Customers in segment {segment}"),
                market_potential: 0.5,
                competition_level: 0.6,
                growth_trend: GrowthTrend::Moderate,
                preferred_flavors: Vec::new(),
                price_sensitivity: PriceSensitivity::Medium,
                purchase_frequency: PurchaseFrequency::Occasional,
                segment_id,
            },
        }
    }
}

#[derive(Clone, Debug)]
pub struct ContextAssembler {
    tables: Arc<ContextTables>,
    segments: SegmentCatalog,
    recommender: Arc<dyn IngredientRecommender>,
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(Arc::new(ContextTables::default()))
    }
}

impl ContextAssembler {
    pub fn new(tables: Arc<ContextTables>) -> Self {
        let segments = SegmentCatalog::new(Arc::clone(&tables));
        Self { tables, segments, recommender: Arc::new(SegmentIngredientRecommender) }
    }

    pub fn with_recommender(mut self, recommender: Arc<dyn IngredientRecommender>) -> Self {
        self.recommender = recommender;
        self
    }

    /// Built-in tables unless a table document path is given.
    pub fn from_optional_path(path: Option<&Path>) -> Result<Self, ContextError> {
        match path {
            Some(path) => Ok(Self::new(Arc::new(ContextTables::from_path(path)?))),
            None => Ok(Self::default()),
        }
    }

    pub fn segments(&self) -> &SegmentCatalog {
        &self.segments
    }

    pub fn assemble(&self, date: NaiveDate, segment: &str) -> (SeasonalContext, MarketContext) {
        (self.seasonal_context(date), self.segments.market_context(segment))
    }

    pub fn seasonal_context(&self, date: NaiveDate) -> SeasonalContext {
        let month = date.month();
        let season = Season::from_month(month);
        let profile = self.tables.season(season);

        SeasonalContext {
            date,
            season,
            month,
            temperature: self.tables.temperature(month),
            events: self.tables.events(month).to_vec(),
            trending_flavors: profile.map(|p| p.trending_flavors.clone()).unwrap_or_default(),
            popular_occasions: profile.map(|p| p.popular_occasions.clone()).unwrap_or_default(),
            demand_factor: profile.map(SeasonProfile::demand_factor).unwrap_or(1.0),
        }
    }

    pub fn recommended_ingredients(
        &self,
        seasonal: &SeasonalContext,
        market: &MarketContext,
        trend_strength: f64,
    ) -> Vec<String> {
        self.recommender.recommend(seasonal, market, trend_strength)
    }

    pub fn market_insights(&self, seasonal: &SeasonalContext, market: &MarketContext) -> MarketInsights {
        MarketInsights::derive(seasonal, market)
    }

    /// Feature source for the trend predictor built from assembled contexts.
    pub fn prediction_context(
        &self,
        seasonal: &SeasonalContext,
        market: &MarketContext,
    ) -> PredictionContext {
        PredictionContext {
            temperature: seasonal.temperature,
            bakery_demand_factor: seasonal.demand_factor,
            market_potential: market.market_potential,
            competition_level: market.competition_level,
            growth_trend_score: market.growth_trend.score(),
            segment: market.segment_id.clone(),
            ..PredictionContext::for_date(seasonal.date)
        }
    }
}
