use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const POPULARITY_WEIGHT: f64 = 0.4;
pub const ENGAGEMENT_WEIGHT: f64 = 0.3;
pub const TREND_CLASS_WEIGHT: f64 = 0.3;

/// Regressor outputs plus their bounded weighted combination.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrendScore {
    pub popularity: f64,
    pub engagement: f64,
    pub trend_class: f64,
    pub overall_strength: f64,
}

impl TrendScore {
    pub fn from_components(popularity: f64, engagement: f64, trend_class: f64) -> Self {
        let weighted = POPULARITY_WEIGHT * popularity
            + ENGAGEMENT_WEIGHT * engagement
            + TREND_CLASS_WEIGHT * trend_class;
        let overall_strength = if weighted.is_finite() { weighted.clamp(0.0, 1.0) } else { 0.0 };
        Self { popularity, engagement, trend_class, overall_strength }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendLevel {
    Weak,
    HasPotential,
    ModeratelyTrending,
    StronglyTrending,
    HighlyViral,
    ExtremelyViral,
}

impl TrendLevel {
    pub fn from_strength(strength: f64) -> Self {
        if strength >= 0.9 {
            Self::ExtremelyViral
        } else if strength >= 0.75 {
            Self::HighlyViral
        } else if strength >= 0.6 {
            Self::StronglyTrending
        } else if strength >= 0.45 {
            Self::ModeratelyTrending
        } else if strength >= 0.35 {
            Self::HasPotential
        } else {
            Self::Weak
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Weak => "weak",
            Self::HasPotential => "has potential",
            Self::ModeratelyTrending => "moderately trending",
            Self::StronglyTrending => "strongly trending",
            Self::HighlyViral => "highly viral",
            Self::ExtremelyViral => "extremely viral",
        }
    }
}

impl fmt::Display for TrendLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One historical engagement observation for a bakery post.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRecord {
    pub published_at: NaiveDate,
    #[serde(default)]
    pub views: Option<f64>,
    #[serde(default)]
    pub likes: Option<f64>,
    #[serde(default)]
    pub comments: Option<f64>,
    #[serde(default)]
    pub engagement_rate: Option<f64>,
    #[serde(default)]
    pub days_since_published: Option<f64>,
    #[serde(default)]
    pub food_type_count: Option<f64>,
    #[serde(default)]
    pub pastry_type_count: Option<f64>,
    #[serde(default)]
    pub fame_score: Option<f64>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub segment: Option<String>,
    #[serde(default)]
    pub temperature_celsius: Option<f64>,
    #[serde(default)]
    pub rainfall_probability: Option<f64>,
    #[serde(default)]
    pub bakery_demand_factor: Option<f64>,
    #[serde(default)]
    pub cold_drink_demand: Option<f64>,
    #[serde(default)]
    pub hot_beverage_demand: Option<f64>,
    #[serde(default)]
    pub ice_cream_demand: Option<f64>,
    #[serde(default)]
    pub tourism_factor: Option<f64>,
    #[serde(default)]
    pub market_potential: Option<f64>,
    #[serde(default)]
    pub competition_level: Option<f64>,
    #[serde(default)]
    pub growth_trend_score: Option<f64>,
}

impl HistoricalRecord {
    pub fn new(published_at: NaiveDate) -> Self {
        Self {
            published_at,
            views: None,
            likes: None,
            comments: None,
            engagement_rate: None,
            days_since_published: None,
            food_type_count: None,
            pastry_type_count: None,
            fame_score: None,
            topic: None,
            segment: None,
            temperature_celsius: None,
            rainfall_probability: None,
            bakery_demand_factor: None,
            cold_drink_demand: None,
            hot_beverage_demand: None,
            ice_cream_demand: None,
            tourism_factor: None,
            market_potential: None,
            competition_level: None,
            growth_trend_score: None,
        }
    }

    /// `ln(1 + views)`.
    pub fn popularity_target(&self) -> f64 {
        self.views.unwrap_or(0.0).max(0.0).ln_1p()
    }

    pub fn engagement_target(&self) -> f64 {
        self.engagement_rate.unwrap_or(0.0)
    }

    pub fn trend_class_target(&self) -> f64 {
        self.fame_score.unwrap_or(0.0)
    }
}
