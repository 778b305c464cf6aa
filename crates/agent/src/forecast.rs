//! Horizon scan: weekly trend points, event ranking and one recipe per top event.

use bakecast_core::context::MarketInsights;
use bakecast_core::domain::context::Season;
use bakecast_core::domain::recipe::{Language, Recipe};
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use uuid::Uuid;

use crate::analytics::RecipeAnalytics;

pub const MIN_HORIZON_DAYS: u32 = 7;
pub const MAX_HORIZON_DAYS: u32 = 90;
pub const DEFAULT_HORIZON_DAYS: u32 = 30;
pub const DEFAULT_TOP_K: usize = 3;
pub const STEP_DAYS: u32 = 7;

/// Stands in for an event when no point in the window has one.
pub const REGULAR_SEASON: &str = "Regular season";

/// Trending flavours folded into the trend text of each event.
const TREND_FLAVORS: usize = 3;

#[derive(Clone, Debug)]
pub struct ForecastRequest {
    pub start: Option<NaiveDate>,
    pub segment: String,
    pub horizon_days: u32,
    pub top_k: usize,
    pub language: Option<Language>,
    pub include_market_analysis: bool,
}

impl Default for ForecastRequest {
    fn default() -> Self {
        Self {
            start: None,
            segment: String::new(),
            horizon_days: DEFAULT_HORIZON_DAYS,
            top_k: DEFAULT_TOP_K,
            language: None,
            include_market_analysis: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub season: Season,
    pub events: Vec<String>,
    pub trending_flavors: Vec<String>,
    pub trend_strength: f64,
    /// False when the fallback strength stood in for the model.
    pub model_scored: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ForecastSummary {
    pub avg_trend_strength: f64,
    pub seasons_in_window: Vec<Season>,
}

impl ForecastSummary {
    pub fn from_points(points: &[ForecastPoint]) -> Self {
        let avg = if points.is_empty() {
            0.0
        } else {
            points.iter().map(|point| point.trend_strength).sum::<f64>() / points.len() as f64
        };
        let mut seasons: Vec<Season> = points.iter().map(|point| point.season).collect();
        seasons.sort_by_key(|season| season.as_str());
        seasons.dedup();
        Self { avg_trend_strength: (avg * 1000.0).round() / 1000.0, seasons_in_window: seasons }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EventRecipe {
    pub event: String,
    pub date: NaiveDate,
    pub viral_potential: f64,
    pub correlation_id: Uuid,
    pub model_scored: bool,
    pub recipe: Recipe,
    pub analytics: RecipeAnalytics,
    pub market_insights: Option<MarketInsights>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Forecast {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub segment: String,
    pub points: Vec<ForecastPoint>,
    pub top_events: Vec<String>,
    pub summary: ForecastSummary,
    pub recipes: Vec<EventRecipe>,
}

pub fn clamp_horizon(days: u32) -> u32 {
    days.clamp(MIN_HORIZON_DAYS, MAX_HORIZON_DAYS)
}

/// Scan dates at offsets 0, 7, 14, ... strictly below the clamped horizon.
pub fn weekly_dates(start: NaiveDate, horizon_days: u32) -> Vec<NaiveDate> {
    (0..clamp_horizon(horizon_days))
        .step_by(STEP_DAYS as usize)
        .filter_map(|offset| start.checked_add_signed(Duration::days(i64::from(offset))))
        .collect()
}

/// Events ordered by summed strength across the window. Ties keep the order
/// in which events first appear.
pub fn rank_events(points: &[ForecastPoint], top_k: usize) -> Vec<String> {
    let mut scores: Vec<(&str, f64)> = Vec::new();
    for point in points {
        for event in &point.events {
            match scores.iter_mut().find(|(seen, _)| *seen == event.as_str()) {
                Some((_, score)) => *score += point.trend_strength,
                None => scores.push((event.as_str(), point.trend_strength)),
            }
        }
    }
    scores.sort_by(|left, right| right.1.total_cmp(&left.1));

    let ranked: Vec<String> =
        scores.into_iter().take(top_k.max(1)).map(|(event, _)| event.to_string()).collect();
    if ranked.is_empty() {
        vec![REGULAR_SEASON.to_string()]
    } else {
        ranked
    }
}

/// First point carrying `event`, else the first point of the window.
pub fn representative_point<'a>(points: &'a [ForecastPoint], event: &str) -> Option<&'a ForecastPoint> {
    points
        .iter()
        .find(|point| point.events.iter().any(|candidate| candidate == event))
        .or_else(|| points.first())
}

pub fn trend_text(event: &str, point: &ForecastPoint) -> String {
    let flavors = point.trending_flavors.iter().take(TREND_FLAVORS).map(String::as_str);
    let words: Vec<&str> = if event == REGULAR_SEASON {
        flavors.collect()
    } else {
        std::iter::once(event).chain(flavors).collect()
    };
    let text = words.join(" ");
    if text.trim().is_empty() {
        "seasonal".to_string()
    } else {
        text
    }
}

pub fn occasion(event: &str, point: &ForecastPoint) -> String {
    if event == REGULAR_SEASON {
        point.season.as_str().to_string()
    } else {
        event.to_string()
    }
}

#[cfg(test)]
mod tests {
    use bakecast_core::domain::context::Season;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    use super::{
        occasion, rank_events, representative_point, trend_text, weekly_dates, ForecastPoint,
        ForecastSummary, REGULAR_SEASON,
    };

    fn date(month: u32, day: u32) -> NaiveDate {
        let Some(date) = NaiveDate::from_ymd_opt(2025, month, day) else {
            panic!("valid date");
        };
        date
    }

    fn point(day: u32, season: Season, events: &[&str], strength: f64) -> ForecastPoint {
        ForecastPoint {
            date: date(10, day),
            season,
            events: events.iter().map(|event| event.to_string()).collect(),
            trending_flavors: vec!["pumpkin".into(), "cinnamon".into(), "caramel".into(), "lotus".into()],
            trend_strength: strength,
            model_scored: true,
        }
    }

    #[test]
    fn horizon_is_clamped_and_stepped_weekly() {
        assert_eq!(weekly_dates(date(10, 1), 30).len(), 5);
        assert_eq!(weekly_dates(date(10, 1), 1), vec![date(10, 1)]);
        assert_eq!(weekly_dates(date(10, 1), 400).len(), 13);
        assert_eq!(weekly_dates(date(10, 1), 14), vec![date(10, 1), date(10, 8)]);
    }

    #[test]
    fn events_rank_by_summed_strength_with_stable_ties() {
        let points = vec![
            point(1, Season::Autumn, &["Mid-Autumn Festival", "Teachers' Day"], 0.4),
            point(8, Season::Autumn, &["Halloween"], 0.5),
            point(15, Season::Autumn, &["Halloween", "Teachers' Day"], 0.5),
        ];

        assert_eq!(rank_events(&points, 2), vec!["Halloween", "Teachers' Day"]);
        assert_eq!(rank_events(&points, 0), vec!["Halloween"]);

        let tied = vec![point(1, Season::Autumn, &["B", "A"], 0.3)];
        assert_eq!(rank_events(&tied, 5), vec!["B", "A"]);
    }

    #[test]
    fn window_without_events_is_regular_season() {
        let points = vec![point(1, Season::Summer, &[], 0.6)];
        let ranked = rank_events(&points, 3);
        assert_eq!(ranked, vec![REGULAR_SEASON]);

        let Some(representative) = representative_point(&points, REGULAR_SEASON) else {
            panic!("window has points");
        };
        assert_eq!(trend_text(REGULAR_SEASON, representative), "pumpkin cinnamon caramel");
        assert_eq!(occasion(REGULAR_SEASON, representative), "Summer");
    }

    #[test]
    fn representative_point_is_first_with_event() {
        let points = vec![
            point(1, Season::Autumn, &[], 0.4),
            point(8, Season::Autumn, &["Halloween"], 0.5),
            point(15, Season::Autumn, &["Halloween"], 0.7),
        ];
        let Some(representative) = representative_point(&points, "Halloween") else {
            panic!("event present");
        };
        assert_eq!(representative.date, date(10, 8));
        assert_eq!(trend_text("Halloween", representative), "Halloween pumpkin cinnamon caramel");
    }

    #[test]
    fn summary_rounds_average_and_sorts_seasons() {
        let points = vec![
            point(1, Season::Winter, &[], 0.5),
            point(8, Season::Autumn, &[], 0.6),
            point(15, Season::Autumn, &[], 0.6001),
        ];
        let summary = ForecastSummary::from_points(&points);
        assert_eq!(summary.avg_trend_strength, 0.567);
        assert_eq!(summary.seasons_in_window, vec![Season::Autumn, Season::Winter]);
    }
}
