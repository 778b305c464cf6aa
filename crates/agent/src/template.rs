//! Deterministic last-resort recipe. Never calls a generator and is always complete.

use bakecast_core::domain::context::Season;
use bakecast_core::domain::recipe::{Difficulty, DraftIngredient, Language, ParsedRecipeDraft};

/// (name, quantity, unit) rows of the base sponge, per language.
const VI_INGREDIENTS: &[(&str, &str, &str)] = &[
    ("bột mì đa dụng", "250", "g"),
    ("đường cát trắng", "120", "g"),
    ("trứng gà", "3", "quả"),
    ("bơ lạt", "100", "g"),
    ("sữa tươi không đường", "80", "ml"),
    ("tinh chất vanilla", "5", "ml"),
    ("baking powder", "1", "muỗng cà phê"),
    ("muối", "1/4", "muỗng cà phê"),
];

const EN_INGREDIENTS: &[(&str, &str, &str)] = &[
    ("all-purpose flour", "250", "g"),
    ("white sugar", "120", "g"),
    ("eggs", "3", "pieces"),
    ("unsalted butter", "100", "g"),
    ("fresh milk", "80", "ml"),
    ("vanilla extract", "5", "ml"),
    ("baking powder", "1", "teaspoon"),
    ("salt", "1/4", "teaspoon"),
];

const VI_STEPS: &[&str] = &[
    "Bước 1: Làm nóng lò ở 175°C, lót giấy nến vào khuôn tròn 20cm.",
    "Bước 2: Rây bột mì, baking powder và muối vào tô lớn, trộn đều.",
    "Bước 3: Đánh bông bơ với đường 3-4 phút đến khi hỗn hợp xốp nhẹ.",
    "Bước 4: Cho từng quả trứng vào, đánh đều sau mỗi lần, thêm vanilla.",
    "Bước 5: Cho xen kẽ bột khô và sữa vào hỗn hợp bơ, trộn nhẹ bằng phới dẹt.",
    "Bước 6: Đổ bột vào khuôn, nướng 35-40 phút đến khi xiên tăm rút ra khô.",
    "Bước 7: Để bánh nguội 10 phút trong khuôn rồi lật ra rack cho nguội hẳn.",
];

const EN_STEPS: &[&str] = &[
    "Step 1: Preheat the oven to 175°C and line a 20cm round pan with parchment.",
    "Step 2: Sift flour, baking powder and salt into a large bowl and mix.",
    "Step 3: Cream butter with sugar for 3-4 minutes until light and fluffy.",
    "Step 4: Beat in the eggs one at a time, then add the vanilla.",
    "Step 5: Alternate the dry mix and milk into the butter mixture, folding gently.",
    "Step 6: Pour into the pan and bake 35-40 minutes until a toothpick comes out clean.",
    "Step 7: Cool 10 minutes in the pan, then turn out onto a rack to cool completely.",
];

/// Parameters of a template recipe.
#[derive(Clone, Debug)]
pub struct TemplateRequest<'a> {
    pub trend: Option<&'a str>,
    pub segment: &'a str,
    pub occasion: Option<&'a str>,
    pub season: Season,
    pub language: Language,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

pub fn template_recipe(request: &TemplateRequest<'_>) -> ParsedRecipeDraft {
    let trend = non_blank(request.trend).unwrap_or(request.season.as_str());
    let segment = request.segment.trim();
    let (ingredients, steps) = match request.language {
        Language::Vi => (VI_INGREDIENTS, VI_STEPS),
        Language::En => (EN_INGREDIENTS, EN_STEPS),
    };
    let occasion = non_blank(request.occasion).unwrap_or(match request.language {
        Language::Vi => "hàng ngày",
        Language::En => "everyday",
    });

    let ingredients = ingredients
        .iter()
        .map(|(name, quantity, unit)| DraftIngredient {
            name: name.to_string(),
            quantity: quantity.to_string(),
            unit: Some(unit.to_string()),
        })
        .collect();
    let instructions = steps.iter().map(|step| step.to_string()).collect();
    let tags = vec![trend.to_string(), segment.to_string(), occasion.to_string(), "homemade".into()];

    match request.language {
        Language::Vi => ParsedRecipeDraft {
            title: format!("Bánh {trend} Đặc Biệt"),
            description: format!(
                "Bánh ngọt bắt trend {trend} dành cho {segment}, mềm mịn và thơm, hợp cho dịp {occasion}."
            ),
            ingredients,
            instructions,
            prep_time: "25 phút".to_string(),
            cook_time: "40 phút ở 175°C".to_string(),
            servings: "8-10 phần".to_string(),
            difficulty: Difficulty::Medium,
            tags,
            decoration_tips: format!(
                "Trang trí theo phong cách {trend} với kem tươi, trái cây hoặc chocolate."
            ),
            marketing_caption: format!(
                "Bánh {trend} đặc biệt dành cho {segment}, món quà hoàn hảo cho dịp {occasion}!"
            ),
            notes: "Để nguyên liệu ở nhiệt độ phòng và không trộn bột quá kỹ.".to_string(),
        },
        Language::En => ParsedRecipeDraft {
            title: format!("{trend} Special Cake"),
            description: format!(
                "A soft, fragrant {trend} cake designed for {segment}, a good fit for {occasion}."
            ),
            ingredients,
            instructions,
            prep_time: "25 minutes".to_string(),
            cook_time: "40 minutes at 175°C".to_string(),
            servings: "8-10 servings".to_string(),
            difficulty: Difficulty::Medium,
            tags,
            decoration_tips: format!(
                "Decorate in {trend} style with fresh cream, fruit or chocolate."
            ),
            marketing_caption: format!(
                "Special {trend} cake for {segment}, the perfect gift for {occasion}!"
            ),
            notes: "Bring ingredients to room temperature and do not overmix the batter.".to_string(),
        },
    }
}
