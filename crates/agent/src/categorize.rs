//! Keyword tagging of ingredient names for category and seasonal bucket.

use bakecast_core::domain::context::Season;
use bakecast_core::domain::recipe::{DraftIngredient, Ingredient, IngredientCategory};

const CATEGORY_KEYWORDS: &[(IngredientCategory, &[&str])] = &[
    (IngredientCategory::Dry, &["flour", "bột", "sugar", "đường", "salt", "muối", "baking"]),
    (
        IngredientCategory::DairyEggs,
        &["egg", "trứng", "milk", "sữa", "butter", "bơ", "cream"],
    ),
    (IngredientCategory::Fruits, &["fruit", "trái cây", "berry", "strawberry", "dâu"]),
    (IngredientCategory::Flavorings, &["chocolate", "socola", "cocoa", "vanilla"]),
];

const SEASONAL_KEYWORDS: &[(Season, &[&str])] = &[
    (Season::Spring, &["strawberry", "dâu", "sakura", "green tea", "trà xanh"]),
    (
        Season::Summer,
        &["mango", "xoài", "coconut", "dừa", "lemon", "chanh", "passion fruit"],
    ),
    (
        Season::Autumn,
        &["pumpkin", "bí đỏ", "cinnamon", "quế", "apple", "táo", "caramel"],
    ),
    (
        Season::Winter,
        &["chocolate", "socola", "gingerbread", "peppermint", "orange", "cam"],
    ),
];

fn first_hit<T: Copy>(name: &str, table: &[(T, &[&str])]) -> Option<T> {
    let lowered = name.to_lowercase();
    table
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| lowered.contains(keyword)))
        .map(|(tag, _)| *tag)
}

pub fn categorize(name: &str) -> IngredientCategory {
    first_hit(name, CATEGORY_KEYWORDS).unwrap_or(IngredientCategory::Other)
}

pub fn seasonal_bucket(name: &str) -> Option<Season> {
    first_hit(name, SEASONAL_KEYWORDS)
}

/// Attaches category and seasonal bucket to a parsed ingredient.
pub fn classify(draft: DraftIngredient) -> Ingredient {
    let category = categorize(&draft.name);
    let seasonal_bucket = seasonal_bucket(&draft.name);
    Ingredient {
        name: draft.name,
        quantity: draft.quantity,
        unit: draft.unit,
        category,
        seasonal_bucket,
    }
}
