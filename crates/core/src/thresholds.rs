//! Seasonal, segment and event re-weighting of raw trend strength.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::context::canonical_segment_id;
use crate::domain::context::SeasonalContext;
use crate::domain::trend::{TrendLevel, TrendScore};

#[derive(Debug, Error)]
pub enum ThresholdError {
    #[error("could not read threshold document `{path}`: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("could not parse threshold document `{path}`: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },
    #[error("threshold document is invalid: {0}")]
    Invalid(String),
}

/// Threshold document. Keys are lowercase; missing sections fall back to the built-in values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub seasonal_boost: BTreeMap<String, f64>,
    pub month_boost: BTreeMap<u32, f64>,
    pub base_threshold: f64,
    pub viral_threshold: f64,
    pub trend_multipliers: BTreeMap<String, f64>,
    pub event_boosts: BTreeMap<String, f64>,
}

fn table<K: Ord + Clone>(entries: &[(K, f64)]) -> BTreeMap<K, f64> {
    entries.iter().cloned().collect()
}

fn named(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
    entries.iter().map(|(key, value)| (key.to_string(), *value)).collect()
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            seasonal_boost: named(&[
                ("autumn", 0.15),
                ("back_to_school", 0.15),
                ("christmas", 0.4),
                ("halloween", 0.3),
                ("spring", 0.1),
                ("summer", 0.2),
                ("tet", 0.35),
                ("valentine", 0.25),
                ("winter", 0.2),
            ]),
            month_boost: table(&[
                (1, 0.35),
                (2, 0.25),
                (6, 0.2),
                (7, 0.2),
                (8, 0.15),
                (9, 0.15),
                (10, 0.3),
                (12, 0.4),
            ]),
            base_threshold: 0.35,
            viral_threshold: 0.75,
            trend_multipliers: named(&[
                ("baby_boomers", 0.8),
                ("gen_x", 0.95),
                ("gen_z", 1.3),
                ("gym_goers", 0.9),
                ("health_conscious", 0.85),
                ("kids", 1.1),
                ("millennials", 1.15),
                ("office_workers", 1.0),
                ("teenagers", 1.25),
                ("young_adults", 1.2),
            ]),
            event_boosts: named(&[
                ("birthday", 0.2),
                ("christmas", 0.5),
                ("graduation", 0.2),
                ("halloween", 0.4),
                ("tet", 0.45),
                ("valentine", 0.3),
                ("wedding", 0.25),
            ]),
        }
    }
}

impl ThresholdConfig {
    pub fn from_path(path: &Path) -> Result<Self, ThresholdError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| ThresholdError::Read { path: path.to_path_buf(), source })?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|source| ThresholdError::Parse { path: path.to_path_buf(), source })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ThresholdError> {
        if !(0.0..=1.0).contains(&self.base_threshold) {
            return Err(ThresholdError::Invalid("base_threshold must be within [0, 1]".into()));
        }
        if !(0.0..=1.0).contains(&self.viral_threshold) {
            return Err(ThresholdError::Invalid("viral_threshold must be within [0, 1]".into()));
        }
        if self.viral_threshold < self.base_threshold {
            return Err(ThresholdError::Invalid(
                "viral_threshold must not be below base_threshold".into(),
            ));
        }
        if let Some((segment, _)) =
            self.trend_multipliers.iter().find(|(_, value)| !value.is_finite() || **value < 0.0)
        {
            return Err(ThresholdError::Invalid(format!(
                "trend multiplier for `{segment}` must be a non-negative number"
            )));
        }
        Ok(())
    }
}

/// Enhanced trend strength on top of the predictor's raw score.
#[derive(Clone, Debug, Default)]
pub struct EnhancedTrendCalculator {
    config: Arc<ThresholdConfig>,
}

impl EnhancedTrendCalculator {
    pub fn new(config: ThresholdConfig) -> Self {
        Self { config: Arc::new(config) }
    }

    /// Built-in thresholds unless a document path is given.
    pub fn from_optional_path(path: Option<&Path>) -> Result<Self, ThresholdError> {
        match path {
            Some(path) => Ok(Self::new(ThresholdConfig::from_path(path)?)),
            None => Ok(Self::default()),
        }
    }

    pub fn config(&self) -> &ThresholdConfig {
        &self.config
    }

    /// `min(1, base * multiplier * (1 + seasonal_boost + event_boost))`.
    pub fn enhanced_strength(
        &self,
        score: &TrendScore,
        seasonal: &SeasonalContext,
        segment: &str,
    ) -> f64 {
        let boost = self.seasonal_boost(seasonal) + self.event_boost(&seasonal.events);
        let enhanced = score.overall_strength * self.segment_multiplier(segment) * (1.0 + boost);
        if enhanced.is_finite() {
            enhanced.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn seasonal_boost(&self, seasonal: &SeasonalContext) -> f64 {
        let season = self.config.seasonal_boost.get(seasonal.season.key()).copied().unwrap_or(0.0);
        let month = self.config.month_boost.get(&seasonal.month).copied().unwrap_or(0.0);
        season + month
    }

    /// Each event contributes the first boost whose key it contains, in key order.
    pub fn event_boost(&self, events: &[String]) -> f64 {
        events
            .iter()
            .filter_map(|event| {
                let event = event.to_lowercase();
                self.config
                    .event_boosts
                    .iter()
                    .find(|(key, _)| event.contains(key.as_str()))
                    .map(|(_, boost)| *boost)
            })
            .sum()
    }

    /// Exact segment key first, then any key sharing its canonical form; 1.0 when none is listed.
    pub fn segment_multiplier(&self, segment: &str) -> f64 {
        let lowered = segment.trim().to_lowercase();
        if let Some(multiplier) = self.config.trend_multipliers.get(&lowered) {
            return *multiplier;
        }
        let canonical = canonical_segment_id(&lowered);
        self.config
            .trend_multipliers
            .iter()
            .find(|(key, _)| canonical_segment_id(key) == canonical)
            .map(|(_, multiplier)| *multiplier)
            .unwrap_or(1.0)
    }

    pub fn is_trending(&self, strength: f64) -> bool {
        strength >= self.config.base_threshold
    }

    pub fn is_viral(&self, strength: f64) -> bool {
        strength >= self.config.viral_threshold
    }

    pub fn level(&self, strength: f64) -> TrendLevel {
        TrendLevel::from_strength(strength)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use chrono::NaiveDate;
    use tempfile::TempDir;

    use super::{EnhancedTrendCalculator, ThresholdConfig, ThresholdError};
    use crate::context::ContextAssembler;
    use crate::domain::context::SeasonalContext;
    use crate::domain::trend::{TrendLevel, TrendScore};

    fn seasonal(month: u32) -> SeasonalContext {
        let Some(date) = NaiveDate::from_ymd_opt(2024, month, 15) else {
            panic!("valid date");
        };
        ContextAssembler::default().seasonal_context(date)
    }

    fn score(strength: f64) -> TrendScore {
        TrendScore { popularity: 0.0, engagement: 0.0, trend_class: 0.0, overall_strength: strength }
    }

    #[test]
    fn october_gen_z_gets_season_month_and_halloween_boosts() {
        let calculator = EnhancedTrendCalculator::default();
        let october = seasonal(10);

        assert!((calculator.seasonal_boost(&october) - 0.45).abs() < 1e-9);
        assert!((calculator.event_boost(&october.events) - 0.4).abs() < 1e-9);

        let enhanced = calculator.enhanced_strength(&score(0.2), &october, "gen_z");
        assert!((enhanced - 0.2 * 1.3 * 1.85).abs() < 1e-9);
        assert_eq!(calculator.level(enhanced), TrendLevel::ModeratelyTrending);
        assert!(calculator.is_trending(enhanced));
        assert!(!calculator.is_viral(enhanced));
    }

    #[test]
    fn enhanced_strength_is_capped_at_one() {
        let calculator = EnhancedTrendCalculator::default();
        let enhanced = calculator.enhanced_strength(&score(0.9), &seasonal(12), "GenZ");
        assert_eq!(enhanced, 1.0);
    }

    #[test]
    fn unlisted_segment_and_quiet_month_leave_score_alone() {
        let calculator = EnhancedTrendCalculator::default();
        let enhanced = calculator.enhanced_strength(&score(0.4), &seasonal(4), "retirees");
        assert!((enhanced - 0.4 * 1.1).abs() < 1e-9);
    }

    #[test]
    fn segment_aliases_share_their_multiplier() {
        let calculator = EnhancedTrendCalculator::default();

        assert_eq!(calculator.segment_multiplier("gym_goers"), 0.9);
        assert_eq!(calculator.segment_multiplier("gym"), 0.9);
        assert_eq!(calculator.segment_multiplier("Health Conscious"), 0.85);
        assert_eq!(calculator.segment_multiplier("health"), 0.85);
        assert_eq!(calculator.segment_multiplier("astronauts"), 1.0);
    }

    #[test]
    fn lunar_new_year_event_matches_tet_boost() {
        let calculator = EnhancedTrendCalculator::default();
        let events = vec!["Lunar New Year (Tet)".to_string(), "Valentine".to_string()];
        assert!((calculator.event_boost(&events) - 0.75).abs() < 1e-9);
    }

    #[test]
    fn partial_document_keeps_remaining_defaults() -> Result<(), String> {
        let dir = TempDir::new().map_err(|error| error.to_string())?;
        let path = dir.path().join("thresholds.json");
        fs::write(&path, r#"{"base_threshold": 0.4, "month_boost": {"10": 0.5}}"#)
            .map_err(|error| error.to_string())?;

        let config = ThresholdConfig::from_path(&path).map_err(|error| error.to_string())?;
        assert_eq!(config.base_threshold, 0.4);
        assert_eq!(config.month_boost.get(&10), Some(&0.5));
        assert_eq!(config.viral_threshold, 0.75);
        assert_eq!(config.trend_multipliers.get("gen_z"), Some(&1.3));
        Ok(())
    }

    #[test]
    fn inverted_thresholds_are_rejected() {
        let config = ThresholdConfig { base_threshold: 0.8, viral_threshold: 0.5, ..Default::default() };
        assert!(matches!(config.validate(), Err(ThresholdError::Invalid(_))));
    }
}
