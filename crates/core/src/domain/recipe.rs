use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::context::Season;

/// Titles that generators emit when they could not name the recipe.
pub const PLACEHOLDER_TITLES: &[&str] = &["Untitled Recipe", "Generated Recipe"];

pub const DEFAULT_TITLE: &str = "Untitled Recipe";
pub const DEFAULT_QUANTITY: &str = "1";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    #[default]
    Vi,
    En,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Self::Vi => "vi",
            Self::En => "en",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Vi => "Tiếng Việt",
            Self::En => "English",
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "vi" | "vietnamese" => Ok(Self::Vi),
            "en" | "english" => Ok(Self::En),
            other => Err(format!("unsupported language `{other}` (expected vi|en)")),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    const EASY_KEYWORDS: &'static [&'static str] = &["easy", "dễ", "đơn giản", "simple"];
    const HARD_KEYWORDS: &'static [&'static str] = &["hard", "khó", "phức tạp", "difficult"];

    /// Maps a free-text descriptor onto the closed enum, defaulting to medium.
    pub fn from_descriptor(descriptor: &str) -> Self {
        let lowered = descriptor.to_lowercase();
        if Self::EASY_KEYWORDS.iter().any(|keyword| lowered.contains(keyword)) {
            Self::Easy
        } else if Self::HARD_KEYWORDS.iter().any(|keyword| lowered.contains(keyword)) {
            Self::Hard
        } else {
            Self::Medium
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngredientCategory {
    Dry,
    DairyEggs,
    Fruits,
    Flavorings,
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftIngredient {
    pub name: String,
    pub quantity: String,
    pub unit: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParsedRecipeDraft {
    pub title: String,
    pub description: String,
    pub ingredients: Vec<DraftIngredient>,
    pub instructions: Vec<String>,
    pub prep_time: String,
    pub cook_time: String,
    pub servings: String,
    pub difficulty: Difficulty,
    pub tags: Vec<String>,
    pub decoration_tips: String,
    pub marketing_caption: String,
    pub notes: String,
}

impl ParsedRecipeDraft {
    pub fn has_placeholder_title(&self) -> bool {
        let title = self.title.trim();
        title.is_empty()
            || PLACEHOLDER_TITLES.iter().any(|placeholder| placeholder.eq_ignore_ascii_case(title))
    }

    /// Structural completeness; the only signal that governs stage escalation.
    pub fn is_complete(&self) -> bool {
        !self.has_placeholder_title()
            && !self.ingredients.is_empty()
            && !self.instructions.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStage {
    Primary,
    EnhancedTranslate,
    Template,
}

impl GenerationStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::EnhancedTranslate => "enhanced_translate",
            Self::Template => "template",
        }
    }
}

impl fmt::Display for GenerationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub quantity: String,
    pub unit: Option<String>,
    pub category: IngredientCategory,
    pub seasonal_bucket: Option<Season>,
}

/// Canonical recipe returned to callers. Built once per request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Vec<String>,
    pub prep_time: String,
    pub cook_time: String,
    pub servings: String,
    pub difficulty: Difficulty,
    pub tags: Vec<String>,
    pub decoration_tips: String,
    pub marketing_caption: String,
    pub notes: String,
    pub trend_context: String,
    pub user_segment: String,
    pub language: Language,
    pub produced_by: GenerationStage,
    pub trend_strength: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::{Difficulty, DraftIngredient, Language, ParsedRecipeDraft};

    fn draft(title: &str, ingredients: usize, instructions: usize) -> ParsedRecipeDraft {
        ParsedRecipeDraft {
            title: title.to_string(),
            description: String::new(),
            ingredients: (0..ingredients)
                .map(|index| DraftIngredient {
                    name: format!("ingredient {index}"),
                    quantity: "1".to_string(),
                    unit: None,
                })
                .collect(),
            instructions: (0..instructions).map(|index| format!("step {index}")).collect(),
            prep_time: String::new(),
            cook_time: String::new(),
            servings: String::new(),
            difficulty: Difficulty::Medium,
            tags: Vec::new(),
            decoration_tips: String::new(),
            marketing_caption: String::new(),
            notes: String::new(),
        }
    }

    #[test]
    fn completeness_requires_title_ingredients_and_steps() {
        assert!(draft("Matcha Cake", 1, 1).is_complete());
        assert!(!draft("Matcha Cake", 0, 1).is_complete());
        assert!(!draft("Matcha Cake", 1, 0).is_complete());
        assert!(!draft("   ", 1, 1).is_complete());
    }

    #[test]
    fn placeholder_titles_are_incomplete_regardless_of_case() {
        assert!(!draft("Untitled Recipe", 2, 2).is_complete());
        assert!(!draft("generated recipe", 2, 2).is_complete());
    }

    #[test]
    fn difficulty_keywords_cover_both_languages() {
        assert_eq!(Difficulty::from_descriptor("Easy"), Difficulty::Easy);
        assert_eq!(Difficulty::from_descriptor("Rất dễ làm"), Difficulty::Easy);
        assert_eq!(Difficulty::from_descriptor("đơn giản"), Difficulty::Easy);
        assert_eq!(Difficulty::from_descriptor("khó"), Difficulty::Hard);
        assert_eq!(Difficulty::from_descriptor("phức tạp"), Difficulty::Hard);
        assert_eq!(Difficulty::from_descriptor("intermediate"), Difficulty::Medium);
        assert_eq!(Difficulty::from_descriptor(""), Difficulty::Medium);
    }

    #[test]
    fn language_parses_codes_and_names() {
        assert_eq!("vi".parse::<Language>(), Ok(Language::Vi));
        assert_eq!("English".parse::<Language>(), Ok(Language::En));
        assert!("fr".parse::<Language>().is_err());
    }
}
