use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::context::canonical_segment_id;
use crate::domain::context::Season;
use crate::domain::trend::HistoricalRecord;

/// Value used for a categorical field that is absent from a row.
pub const MISSING_CATEGORY: &str = "unknown";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalField {
    Topic,
    Segment,
    Season,
}

impl CategoricalField {
    pub const ALL: [CategoricalField; 3] =
        [CategoricalField::Topic, CategoricalField::Segment, CategoricalField::Season];

    pub fn key(self) -> &'static str {
        match self {
            Self::Topic => "topic",
            Self::Segment => "segment",
            Self::Season => "season",
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            Self::Topic => "topic_encoded",
            Self::Segment => "segment_encoded",
            Self::Season => "season_encoded",
        }
    }

    pub fn from_column(column: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.column() == column)
    }
}

/// Anything the encoder can read named features from.
pub trait FeatureSource {
    fn numeric(&self, column: &str) -> Option<f64>;
    fn categorical(&self, field: CategoricalField) -> Option<String>;
}

fn calendar_value(date: NaiveDate, column: &str) -> Option<f64> {
    match column {
        "month" => Some(f64::from(date.month())),
        "day_of_year" => Some(f64::from(date.ordinal())),
        "weekday" => Some(f64::from(date.weekday().num_days_from_monday())),
        _ => None,
    }
}

impl FeatureSource for HistoricalRecord {
    fn numeric(&self, column: &str) -> Option<f64> {
        if let Some(value) = calendar_value(self.published_at, column) {
            return Some(value);
        }
        match column {
            "views" => self.views,
            "likes" => self.likes,
            "comments" => self.comments,
            "engagement_rate" => self.engagement_rate,
            "days_since_published" => self.days_since_published,
            "food_type_count" => self.food_type_count,
            "pastry_type_count" => self.pastry_type_count,
            "fame_score" => self.fame_score,
            "temperature_celsius" => self.temperature_celsius,
            "rainfall_probability" => self.rainfall_probability,
            "bakery_demand_factor" => self.bakery_demand_factor,
            "cold_drink_demand" => self.cold_drink_demand,
            "hot_beverage_demand" => self.hot_beverage_demand,
            "ice_cream_demand" => self.ice_cream_demand,
            "tourism_factor" => self.tourism_factor,
            "market_potential" => self.market_potential,
            "competition_level" => self.competition_level,
            "growth_trend_score" => self.growth_trend_score,
            _ => None,
        }
    }

    fn categorical(&self, field: CategoricalField) -> Option<String> {
        match field {
            CategoricalField::Topic => self.topic.clone(),
            CategoricalField::Segment => self.segment.as_deref().map(canonical_segment_id),
            CategoricalField::Season => {
                Some(Season::from_month(self.published_at.month()).as_str().to_string())
            }
        }
    }
}

/// Inference-time situation. Fields left at their defaults describe an average day.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PredictionContext {
    pub month: u32,
    pub day_of_year: u32,
    pub weekday: u32,
    pub temperature: f64,
    pub rainfall_probability: f64,
    pub bakery_demand_factor: f64,
    pub cold_drink_demand: f64,
    pub hot_beverage_demand: f64,
    pub ice_cream_demand: f64,
    pub tourism_factor: f64,
    pub market_potential: f64,
    pub competition_level: f64,
    pub growth_trend_score: f64,
    pub segment: String,
    pub season: Season,
    pub topic: Option<String>,
}

impl Default for PredictionContext {
    fn default() -> Self {
        Self {
            month: 1,
            day_of_year: 1,
            weekday: 0,
            temperature: 25.0,
            rainfall_probability: 0.3,
            bakery_demand_factor: 1.0,
            cold_drink_demand: 0.5,
            hot_beverage_demand: 0.5,
            ice_cream_demand: 0.5,
            tourism_factor: 1.0,
            market_potential: 0.7,
            competition_level: 0.6,
            growth_trend_score: 1.0,
            segment: String::new(),
            season: Season::Winter,
            topic: None,
        }
    }
}

impl PredictionContext {
    /// Calendar fields for `date`; everything else keeps its default.
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            month: date.month(),
            day_of_year: date.ordinal(),
            weekday: date.weekday().num_days_from_monday(),
            season: Season::from_month(date.month()),
            ..Self::default()
        }
    }
}

impl FeatureSource for PredictionContext {
    fn numeric(&self, column: &str) -> Option<f64> {
        match column {
            "month" => Some(f64::from(self.month)),
            "day_of_year" => Some(f64::from(self.day_of_year)),
            "weekday" => Some(f64::from(self.weekday)),
            "temperature_celsius" => Some(self.temperature),
            "rainfall_probability" => Some(self.rainfall_probability),
            "bakery_demand_factor" => Some(self.bakery_demand_factor),
            "cold_drink_demand" => Some(self.cold_drink_demand),
            "hot_beverage_demand" => Some(self.hot_beverage_demand),
            "ice_cream_demand" => Some(self.ice_cream_demand),
            "tourism_factor" => Some(self.tourism_factor),
            "market_potential" => Some(self.market_potential),
            "competition_level" => Some(self.competition_level),
            "growth_trend_score" => Some(self.growth_trend_score),
            _ => None,
        }
    }

    fn categorical(&self, field: CategoricalField) -> Option<String> {
        match field {
            CategoricalField::Topic => self.topic.clone(),
            CategoricalField::Segment => {
                Some(self.segment.as_str()).filter(|s| !s.is_empty()).map(canonical_segment_id)
            }
            CategoricalField::Season => Some(self.season.as_str().to_string()),
        }
    }
}
