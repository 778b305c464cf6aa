//! Canonical recipe shape from loosely typed generator output.

use bakecast_core::domain::recipe::{
    Difficulty, DraftIngredient, Language, ParsedRecipeDraft, DEFAULT_QUANTITY, DEFAULT_TITLE,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

lazy_static! {
    /// Leading quantity, optional unit from a closed vocabulary, then the ingredient name.
    static ref INGREDIENT_LINE: Option<Regex> = Regex::new(
        r"(?i)^(?P<qty>\d+[/,.]?\d*)\s*(?:(?P<unit>grams?|gr|g|kilograms?|kg|mg|ml|liters?|lít|l|teaspoons?|tablespoons?|tsp|tbsp|cups?|ounces?|oz|lbs?|muỗng|muong|thìa|chén|cốc)\b)?\s*(?P<name>.*)$"
    )
    .ok();
}

/// Placeholder values for fields the generator left out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LocalizedDefaults {
    pub prep_time: &'static str,
    pub cook_time: &'static str,
    pub servings: &'static str,
}

pub fn defaults_for(language: Language) -> LocalizedDefaults {
    match language {
        Language::Vi => {
            LocalizedDefaults { prep_time: "30 phút", cook_time: "25 phút", servings: "8 phần" }
        }
        Language::En => LocalizedDefaults {
            prep_time: "30 minutes",
            cook_time: "25 minutes",
            servings: "8 servings",
        },
    }
}

/// An empty, incomplete draft carrying the localized defaults.
pub fn default_draft(language: Language) -> ParsedRecipeDraft {
    let defaults = defaults_for(language);
    ParsedRecipeDraft {
        title: DEFAULT_TITLE.to_string(),
        description: String::new(),
        ingredients: Vec::new(),
        instructions: Vec::new(),
        prep_time: defaults.prep_time.to_string(),
        cook_time: defaults.cook_time.to_string(),
        servings: defaults.servings.to_string(),
        difficulty: Difficulty::Medium,
        tags: Vec::new(),
        decoration_tips: String::new(),
        marketing_caption: String::new(),
        notes: String::new(),
    }
}

/// Parses one free-text ingredient line such as `- 200g bột mì`.
pub fn parse_ingredient_line(line: &str) -> DraftIngredient {
    let cleaned = line.trim().trim_start_matches(['-', '*', '•', '+']).trim();
    let fallback = || DraftIngredient {
        name: cleaned.to_string(),
        quantity: DEFAULT_QUANTITY.to_string(),
        unit: None,
    };

    let Some(captures) = INGREDIENT_LINE.as_ref().and_then(|pattern| pattern.captures(cleaned))
    else {
        return fallback();
    };
    let Some(quantity) = captures.name("qty").map(|m| m.as_str()) else {
        return fallback();
    };

    let name = captures.name("name").map(|m| m.as_str().trim()).unwrap_or_default();
    let quantity = if quantity.contains(',') && !quantity.contains('/') {
        quantity.replace(',', ".")
    } else {
        quantity.to_string()
    };

    DraftIngredient {
        name: if name.is_empty() { cleaned.to_string() } else { name.to_string() },
        quantity,
        unit: captures.name("unit").map(|m| m.as_str().to_lowercase()),
    }
}

/// Builds a draft from a decoded JSON object. Anything but an object, or an
/// object that sets no recipe field, yields `None`.
pub fn draft_from_value(value: &Value, language: Language) -> Option<ParsedRecipeDraft> {
    let object = value.as_object()?;
    let defaults = defaults_for(language);

    let draft = ParsedRecipeDraft {
        title: text_field(object, "title").unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        description: text_field(object, "description").unwrap_or_default(),
        ingredients: ingredients(object.get("ingredients")),
        instructions: string_list(object.get("instructions")),
        prep_time: text_field(object, "prep_time").unwrap_or_else(|| defaults.prep_time.into()),
        cook_time: text_field(object, "cook_time").unwrap_or_else(|| defaults.cook_time.into()),
        servings: text_field(object, "servings").unwrap_or_else(|| defaults.servings.into()),
        difficulty: text_field(object, "difficulty")
            .map(|value| Difficulty::from_descriptor(&value))
            .unwrap_or_default(),
        tags: string_list(object.get("tags")),
        decoration_tips: text_field(object, "decoration_tips").unwrap_or_default(),
        marketing_caption: text_field(object, "marketing_caption").unwrap_or_default(),
        notes: text_field(object, "notes").unwrap_or_default(),
    };
    Some(draft).filter(|draft| *draft != default_draft(language))
}

fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        _ => return None,
    };
    Some(text).filter(|text| !text.is_empty())
}

fn text_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object.get(key).and_then(scalar_text)
}

/// Arrays keep their non-empty scalar entries; a bare string is split on lines and commas.
fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_text).collect(),
        Some(Value::String(text)) => text
            .split(['\n', ','])
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn ingredients(value: Option<&Value>) -> Vec<DraftIngredient> {
    let Some(Value::Array(items)) = value else {
        return string_list(value).iter().map(|line| parse_ingredient_line(line)).collect();
    };

    items
        .iter()
        .filter_map(|item| match item {
            Value::Object(fields) => {
                let name = text_field(fields, "name")?;
                Some(DraftIngredient {
                    name,
                    quantity: text_field(fields, "quantity")
                        .unwrap_or_else(|| DEFAULT_QUANTITY.to_string()),
                    unit: text_field(fields, "unit"),
                })
            }
            Value::String(line) if !line.trim().is_empty() => Some(parse_ingredient_line(line)),
            _ => None,
        })
        .collect()
}
