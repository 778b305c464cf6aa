use serde::Serialize;

use crate::domain::context::{GrowthTrend, MarketContext, PriceSensitivity, SeasonalContext};

const DEFAULT_CHANNELS: &[&str] = &["Online", "Social media", "Local stores"];

const SEGMENT_CHANNELS: &[(&str, &[&str])] = &[
    ("gen_z", &["Instagram", "TikTok", "Grab Food", "Online delivery"]),
    ("millennials", &["Facebook", "Website", "Delivery apps", "Email"]),
    ("gym", &["Fitness apps", "Instagram", "Health websites", "Gym partnerships"]),
    ("kids", &["Facebook (parents)", "Local stores", "School networks", "Family referrals"]),
    ("health", &["Health food stores", "Organic shops", "Wellness websites", "Instagram"]),
];

const PRICE_TRIGGERS: &[&str] = &["Discounts", "Promotions", "Bundle deals", "Limited time offers"];

/// Go-to-market view of one segment at one point in the calendar.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MarketInsights {
    pub market_size: &'static str,
    pub competition_density: f64,
    pub growth_potential: f64,
    pub seasonal_multiplier: f64,
    pub price_elasticity: f64,
    pub channel_preferences: Vec<String>,
    pub buying_triggers: Vec<String>,
}

impl MarketInsights {
    pub fn derive(seasonal: &SeasonalContext, market: &MarketContext) -> Self {
        Self {
            market_size: market_size(market.market_potential),
            competition_density: market.competition_level,
            growth_potential: growth_potential(market.growth_trend),
            seasonal_multiplier: seasonal.demand_factor,
            price_elasticity: price_elasticity(market.price_sensitivity),
            channel_preferences: channel_preferences(&market.segment_id),
            buying_triggers: buying_triggers(seasonal, market),
        }
    }
}

pub fn market_size(potential: f64) -> &'static str {
    if potential > 0.8 {
        "Large (High potential)"
    } else if potential > 0.6 {
        "Medium (Moderate potential)"
    } else {
        "Small (Limited potential)"
    }
}

pub fn growth_potential(trend: GrowthTrend) -> f64 {
    match trend {
        GrowthTrend::Strong => 0.9,
        GrowthTrend::Moderate => 0.7,
        GrowthTrend::Stable => 0.5,
        GrowthTrend::Declining => 0.3,
    }
}

pub fn price_elasticity(sensitivity: PriceSensitivity) -> f64 {
    match sensitivity {
        PriceSensitivity::Low => 0.3,
        PriceSensitivity::Medium => 0.6,
        PriceSensitivity::High => 0.9,
    }
}

pub fn channel_preferences(segment_id: &str) -> Vec<String> {
    let channels = SEGMENT_CHANNELS
        .iter()
        .find(|(id, _)| *id == segment_id)
        .map(|(_, channels)| *channels)
        .unwrap_or(DEFAULT_CHANNELS);
    channels.iter().map(|channel| channel.to_string()).collect()
}

/// Upcoming events, then segment motivations, then price levers for price-sensitive segments.
pub fn buying_triggers(seasonal: &SeasonalContext, market: &MarketContext) -> Vec<String> {
    let mut triggers: Vec<String> =
        seasonal.events.iter().map(|event| format!("Upcoming {event}")).collect();

    let segment = market.segment_id.as_str();
    let motivations: &[&str] = if segment.contains("gen") {
        &["Viral trends", "FOMO", "Social media posts", "Peer influence"]
    } else if segment.contains("gym") {
        &["Fitness goals", "Cheat day", "Pre/post workout", "Health benefits"]
    } else if segment.contains("kids") {
        &["Birthday parties", "School events", "Achievements", "Special occasions"]
    } else {
        &[]
    };
    triggers.extend(motivations.iter().map(|trigger| trigger.to_string()));

    if market.price_sensitivity == PriceSensitivity::High {
        triggers.extend(PRICE_TRIGGERS.iter().map(|trigger| trigger.to_string()));
    }
    triggers
}
