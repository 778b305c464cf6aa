use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Spring, Season::Summer, Season::Autumn, Season::Winter];

    pub fn from_month(month: u32) -> Self {
        match month {
            3..=5 => Self::Spring,
            6..=8 => Self::Summer,
            9..=11 => Self::Autumn,
            _ => Self::Winter,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Spring => "Spring",
            Self::Summer => "Summer",
            Self::Autumn => "Autumn",
            Self::Winter => "Winter",
        }
    }

    /// Lowercase key used by threshold documents and table files.
    pub fn key(self) -> &'static str {
        match self {
            Self::Spring => "spring",
            Self::Summer => "summer",
            Self::Autumn => "autumn",
            Self::Winter => "winter",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthTrend {
    Strong,
    Moderate,
    Stable,
    Declining,
}

impl GrowthTrend {
    /// Binary growth signal fed to the regressors.
    pub fn score(self) -> f64 {
        match self {
            Self::Strong | Self::Moderate => 1.0,
            Self::Stable | Self::Declining => 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSensitivity {
    Low,
    Medium,
    High,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseFrequency {
    Rare,
    Occasional,
    Regular,
    Frequent,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeasonalContext {
    pub date: NaiveDate,
    pub season: Season,
    pub month: u32,
    pub temperature: f64,
    pub events: Vec<String>,
    pub trending_flavors: Vec<String>,
    pub popular_occasions: Vec<String>,
    pub demand_factor: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketContext {
    pub segment_id: String,
    pub description: String,
    pub market_potential: f64,
    pub competition_level: f64,
    pub growth_trend: GrowthTrend,
    pub preferred_flavors: Vec<String>,
    pub price_sensitivity: PriceSensitivity,
    pub purchase_frequency: PurchaseFrequency,
}
