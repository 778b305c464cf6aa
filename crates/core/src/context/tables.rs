use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::context::{GrowthTrend, PriceSensitivity, PurchaseFrequency, Season};

/// Average temperature in °C, indexed by `month - 1`.
pub const MONTH_TEMPERATURES: [f64; 12] =
    [18.0, 22.0, 25.0, 28.0, 30.0, 32.0, 33.0, 32.0, 29.0, 26.0, 23.0, 20.0];

const FEBRUARY_EVENTS: &[&str] = &["Lunar New Year (Tet)", "Valentine", "Spring arrives"];
const SUMMER_EVENTS: &[&str] = &["Summer", "Travel", "School holidays"];
const OCTOBER_EVENTS: &[&str] = &["Halloween", "Spooky month", "Harvest"];
const DECEMBER_EVENTS: &[&str] = &["Christmas", "New Year", "Winter"];

pub fn month_temperature(month: u32) -> f64 {
    let index = month.clamp(1, 12) as usize - 1;
    MONTH_TEMPERATURES[index]
}

/// Months without a mapped festival return an empty list.
pub fn month_events(month: u32) -> &'static [&'static str] {
    match month {
        2 => FEBRUARY_EVENTS,
        6..=8 => SUMMER_EVENTS,
        10 => OCTOBER_EVENTS,
        12 => DECEMBER_EVENTS,
        _ => &[],
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeasonProfile {
    #[serde(default)]
    pub trending_flavors: Vec<String>,
    #[serde(default)]
    pub popular_occasions: Vec<String>,
    #[serde(default)]
    pub average_orders: Option<f64>,
}

impl SeasonProfile {
    /// Orders relative to a 100-order baseline; missing or negative figures read as baseline.
    pub fn demand_factor(&self) -> f64 {
        match self.average_orders {
            Some(orders) if orders.is_finite() && orders >= 0.0 => orders / 100.0,
            _ => 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PotentialLevel {
    Low,
    Medium,
    High,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompetitionLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SegmentProfile {
    pub display_name: String,
    pub description: String,
    pub market_potential: PotentialLevel,
    pub competition: CompetitionLevel,
    pub growth_trend: GrowthTrend,
    #[serde(default)]
    pub preferred_flavors: Vec<String>,
    pub price_sensitivity: PriceSensitivity,
    pub purchase_frequency: PurchaseFrequency,
}

impl SegmentProfile {
    pub fn market_potential_score(&self) -> f64 {
        match self.market_potential {
            PotentialLevel::High => 0.8,
            PotentialLevel::Low | PotentialLevel::Medium => 0.5,
        }
    }

    pub fn competition_score(&self) -> f64 {
        match self.competition {
            CompetitionLevel::VeryHigh => 0.9,
            CompetitionLevel::Low | CompetitionLevel::Medium | CompetitionLevel::High => 0.6,
        }
    }
}

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("could not read context tables `{path}`: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("could not parse context tables `{path}`: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },
    #[error("context tables are missing a profile for season {0}")]
    MissingSeason(Season),
    #[error("context tables reference month {0}; months run from 1 to 12")]
    InvalidMonth(u32),
}

/// Lookup tables behind the context assembler. Loaded once and then shared read-only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContextTables {
    pub seasons: BTreeMap<Season, SeasonProfile>,
    pub segments: BTreeMap<String, SegmentProfile>,
    #[serde(default = "builtin_month_temperatures")]
    pub month_temperatures: BTreeMap<u32, f64>,
    #[serde(default = "builtin_month_events")]
    pub month_events: BTreeMap<u32, Vec<String>>,
}

fn builtin_month_temperatures() -> BTreeMap<u32, f64> {
    (1..=12).map(|month| (month, month_temperature(month))).collect()
}

fn builtin_month_events() -> BTreeMap<u32, Vec<String>> {
    (1..=12)
        .map(|month| (month, strings(month_events(month))))
        .filter(|(_, events)| !events.is_empty())
        .collect()
}

impl ContextTables {
    pub fn from_path(path: &Path) -> Result<Self, ContextError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| ContextError::Read { path: path.to_path_buf(), source })?;
        let tables: Self = serde_json::from_str(&raw)
            .map_err(|source| ContextError::Parse { path: path.to_path_buf(), source })?;

        if let Some(season) = Season::ALL.into_iter().find(|season| !tables.seasons.contains_key(season)) {
            return Err(ContextError::MissingSeason(season));
        }
        let months = tables.month_temperatures.keys().chain(tables.month_events.keys());
        if let Some(month) = months.copied().find(|month| !(1..=12).contains(month)) {
            return Err(ContextError::InvalidMonth(month));
        }

        Ok(tables)
    }

    /// Table temperature for the month, or the built-in calendar value when unlisted.
    pub fn temperature(&self, month: u32) -> f64 {
        self.month_temperatures.get(&month).copied().unwrap_or_else(|| month_temperature(month))
    }

    /// Months without an entry have no events.
    pub fn events(&self, month: u32) -> &[String] {
        self.month_events.get(&month).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn season(&self, season: Season) -> Option<&SeasonProfile> {
        self.seasons.get(&season)
    }

    pub fn segment(&self, canonical_id: &str) -> Option<&SegmentProfile> {
        self.segments.get(canonical_id)
    }
}

impl Default for ContextTables {
    fn default() -> Self {
        let seasons = [
            (
                Season::Spring,
                season_profile(
                    &["strawberry", "green tea", "sakura", "lychee"],
                    &["Women's Day", "Birthday", "Spring picnic"],
                    110.0,
                ),
            ),
            (
                Season::Summer,
                season_profile(
                    &["mango", "coconut", "passion fruit", "lemon"],
                    &["Children's Day", "Travel", "Graduation"],
                    95.0,
                ),
            ),
            (
                Season::Autumn,
                season_profile(
                    &["pumpkin", "cinnamon", "caramel", "lotus seed"],
                    &["Mid-Autumn Festival", "Halloween", "Teachers' Day"],
                    120.0,
                ),
            ),
            (
                Season::Winter,
                season_profile(
                    &["chocolate", "gingerbread", "orange", "peppermint"],
                    &["Christmas", "New Year", "Lunar New Year"],
                    140.0,
                ),
            ),
        ]
        .into_iter()
        .collect();

        let segments = [
            (
                "gen_z",
                SegmentProfile {
                    display_name: "Gen Z".to_string(),
                    description: "Gen Z (18-25): bright colours, Instagram-worthy, TikTok-viral, \
                                  price-aware"
                        .to_string(),
                    market_potential: PotentialLevel::High,
                    competition: CompetitionLevel::VeryHigh,
                    growth_trend: GrowthTrend::Strong,
                    preferred_flavors: strings(&["matcha", "salted egg", "brown sugar boba"]),
                    price_sensitivity: PriceSensitivity::High,
                    purchase_frequency: PurchaseFrequency::Frequent,
                },
            ),
            (
                "millennials",
                SegmentProfile {
                    display_name: "Millennials".to_string(),
                    description: "Millennials (26-40): organic ingredients, refined design, \
                                  willing to pay for premium"
                        .to_string(),
                    market_potential: PotentialLevel::High,
                    competition: CompetitionLevel::High,
                    growth_trend: GrowthTrend::Moderate,
                    preferred_flavors: strings(&["earl grey", "dark chocolate", "salted caramel"]),
                    price_sensitivity: PriceSensitivity::Low,
                    purchase_frequency: PurchaseFrequency::Regular,
                },
            ),
            (
                "gym",
                SegmentProfile {
                    display_name: "Gym-goers".to_string(),
                    description: "Gym enthusiasts: high protein, low carb, low sugar, clear \
                                  nutrition facts"
                        .to_string(),
                    market_potential: PotentialLevel::Medium,
                    competition: CompetitionLevel::Medium,
                    growth_trend: GrowthTrend::Strong,
                    preferred_flavors: strings(&["peanut butter", "banana", "oat"]),
                    price_sensitivity: PriceSensitivity::Medium,
                    purchase_frequency: PurchaseFrequency::Regular,
                },
            ),
            (
                "kids",
                SegmentProfile {
                    display_name: "Kids".to_string(),
                    description: "Kids and parents: food safety, bright colours, cute shapes, \
                                  mild sweetness, no preservatives"
                        .to_string(),
                    market_potential: PotentialLevel::High,
                    competition: CompetitionLevel::Medium,
                    growth_trend: GrowthTrend::Stable,
                    preferred_flavors: strings(&["strawberry", "vanilla", "milk"]),
                    price_sensitivity: PriceSensitivity::Medium,
                    purchase_frequency: PurchaseFrequency::Occasional,
                },
            ),
            (
                "health",
                SegmentProfile {
                    display_name: "Health-conscious".to_string(),
                    description: "Health-conscious: organic, low sugar, gluten-free where \
                                  possible, natural ingredients"
                        .to_string(),
                    market_potential: PotentialLevel::Medium,
                    competition: CompetitionLevel::Low,
                    growth_trend: GrowthTrend::Strong,
                    preferred_flavors: strings(&["black sesame", "whole wheat", "honey"]),
                    price_sensitivity: PriceSensitivity::Low,
                    purchase_frequency: PurchaseFrequency::Regular,
                },
            ),
        ]
        .into_iter()
        .map(|(id, profile)| (id.to_string(), profile))
        .collect();

        Self {
            seasons,
            segments,
            month_temperatures: builtin_month_temperatures(),
            month_events: builtin_month_events(),
        }
    }
}

fn season_profile(flavors: &[&str], occasions: &[&str], average_orders: f64) -> SeasonProfile {
    SeasonProfile {
        trending_flavors: strings(flavors),
        popular_occasions: strings(occasions),
        average_orders: Some(average_orders),
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}
