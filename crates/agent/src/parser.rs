//! Two-tier recipe extraction from free-form generator output.
//!
//! The structured tier looks for a JSON object (fenced, bare, or embedded in
//! prose). The heuristic tier reads labeled sections in Vietnamese or English.
//! Both tiers are pure and never panic; text neither tier understands yields
//! [`ParseOutcome::Empty`].

use bakecast_core::domain::recipe::{Language, ParsedRecipeDraft};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::normalize::{default_draft, draft_from_value, parse_ingredient_line};

lazy_static! {
    static ref CODE_FENCE: Option<Regex> = Regex::new(r"(?i)```(?:json)?").ok();

    /// A section header: optional markdown decoration, a known label, then `:` or end of line.
    static ref SECTION_HEADER: Option<Regex> = Regex::new(
        r"(?i)^[\s#*>\d.)\-]*(?P<label>tên bánh|title|mô tả|description|nguyên liệu|ingredients|cách làm|instructions|method|thời gian|time)\s*\**\s*(?P<colon>:)?\s*\**\s*(?P<rest>.*)$"
    )
    .ok();

    static ref DURATION: Option<Regex> =
        Regex::new(r"(?i)(\d+(?:\s*[-–]\s*\d+)?)\s*(phút|giờ|minutes?|mins?|hours?|hrs?)").ok();

    static ref SERVINGS: Option<Regex> =
        Regex::new(r"(?i)(\d+(?:\s*[-–]\s*\d+)?)\s*(phần|người|servings?|people|pieces?)").ok();
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseTier {
    Structured,
    Heuristic,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ParseOutcome {
    Parsed { draft: ParsedRecipeDraft, tier: ParseTier },
    Empty,
}

impl ParseOutcome {
    pub fn tier(&self) -> Option<ParseTier> {
        match self {
            Self::Parsed { tier, .. } => Some(*tier),
            Self::Empty => None,
        }
    }

    /// The parsed draft, or the default incomplete draft for `language`.
    pub fn into_draft(self, language: Language) -> ParsedRecipeDraft {
        match self {
            Self::Parsed { draft, .. } => draft,
            Self::Empty => default_draft(language),
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RecipeParser {
    language: Language,
}

impl RecipeParser {
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn parse(&self, raw: &str) -> ParseOutcome {
        if let Some(draft) = structured_tier(raw, self.language) {
            return ParseOutcome::Parsed { draft, tier: ParseTier::Structured };
        }
        if let Some(draft) = heuristic_tier(raw, self.language) {
            return ParseOutcome::Parsed { draft, tier: ParseTier::Heuristic };
        }
        ParseOutcome::Empty
    }
}

/// Strips code fences, then tries a direct decode and finally every balanced
/// `{...}` span, largest first. Only JSON objects that set a recipe field are
/// accepted.
pub fn structured_tier(raw: &str, language: Language) -> Option<ParsedRecipeDraft> {
    let text = match CODE_FENCE.as_ref() {
        Some(fence) => fence.replace_all(raw, "").into_owned(),
        None => raw.to_string(),
    };
    let text = text.trim();

    if text.starts_with('{') {
        if let Some(draft) = decode_object(text, language) {
            return Some(draft);
        }
    }

    let mut candidates = object_candidates(text);
    candidates.sort_by_key(|candidate| std::cmp::Reverse(candidate.len()));
    candidates.into_iter().find_map(|candidate| decode_object(candidate, language))
}

fn decode_object(text: &str, language: Language) -> Option<ParsedRecipeDraft> {
    let value: Value = serde_json::from_str(text).ok()?;
    draft_from_value(&value, language)
}

/// Top-level balanced-brace spans, ignoring braces inside JSON strings.
fn object_candidates(text: &str) -> Vec<&str> {
    let mut candidates = Vec::new();
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;
    let mut escaped = false;

    for (index, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    start = Some(index);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(begin) = start.take() {
                        candidates.push(&text[begin..=index]);
                    }
                }
            }
            _ => {}
        }
    }
    candidates
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Section {
    Title,
    Description,
    Ingredients,
    Instructions,
    Time,
}

impl Section {
    fn from_label(label: &str) -> Option<Self> {
        match label.to_lowercase().as_str() {
            "tên bánh" | "title" => Some(Self::Title),
            "mô tả" | "description" => Some(Self::Description),
            "nguyên liệu" | "ingredients" => Some(Self::Ingredients),
            "cách làm" | "instructions" | "method" => Some(Self::Instructions),
            "thời gian" | "time" => Some(Self::Time),
            _ => None,
        }
    }
}

fn header(line: &str) -> Option<(Section, String)> {
    let captures = SECTION_HEADER.as_ref()?.captures(line)?;
    let rest = captures.name("rest").map(|m| m.as_str().trim()).unwrap_or_default();
    // Without a colon the label has to stand alone, otherwise "Time to bake" would be a header.
    if captures.name("colon").is_none() && !rest.is_empty() {
        return None;
    }
    let section = Section::from_label(captures.name("label")?.as_str())?;
    Some((section, rest.trim_matches('*').trim().to_string()))
}

fn strip_bullet(line: &str) -> &str {
    line.trim().trim_start_matches(['-', '*', '•', '+']).trim()
}

/// Reads labeled sections. Text without any recognised header is not a recipe.
pub fn heuristic_tier(raw: &str, language: Language) -> Option<ParsedRecipeDraft> {
    let mut draft = default_draft(language);
    let mut section = None;
    let mut title = None;
    let mut description: Vec<String> = Vec::new();

    for line in raw.lines() {
        let (content, is_header) = match header(line) {
            Some((next, rest)) => {
                section = Some(next);
                (rest, true)
            }
            None => (strip_bullet(line).to_string(), false),
        };
        if content.is_empty() {
            continue;
        }

        match section {
            Some(Section::Title) if title.is_none() => title = Some(content),
            Some(Section::Description) => description.push(content),
            Some(Section::Ingredients) => draft.ingredients.push(parse_ingredient_line(&content)),
            Some(Section::Instructions) => draft.instructions.push(content),
            Some(Section::Time) => apply_timing(&mut draft, &content),
            Some(Section::Title) if !is_header => description.push(content),
            _ => {}
        }
    }

    section?;
    if let Some(title) = title {
        draft.title = title;
    }
    draft.description = description.join(" ");
    Some(draft)
}

fn first_match(pattern: &Option<Regex>, text: &str) -> Option<String> {
    let captures = pattern.as_ref()?.captures(text)?;
    Some(format!("{} {}", captures.get(1)?.as_str(), captures.get(2)?.as_str()))
}

/// Each comma or semicolon separated clause may carry one timing fact.
fn apply_timing(draft: &mut ParsedRecipeDraft, line: &str) {
    for clause in line.split([',', ';']) {
        let lowered = clause.to_lowercase();
        let duration = first_match(&DURATION, clause);
        if lowered.contains("chuẩn bị") || lowered.contains("prep") {
            if let Some(duration) = duration {
                draft.prep_time = duration;
            }
        } else if lowered.contains("nướng") || lowered.contains("cook") || lowered.contains("bake") {
            if let Some(duration) = duration {
                draft.cook_time = duration;
            }
        } else if let Some(servings) = first_match(&SERVINGS, clause) {
            draft.servings = servings;
        }
    }
}
