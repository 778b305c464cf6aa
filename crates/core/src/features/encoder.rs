use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::source::{CategoricalField, FeatureSource, MISSING_CATEGORY};
use super::{engagement_category, viral_potential, FeatureSchema, ENGAGEMENT_CATEGORY, VIRAL_POTENTIAL};
use crate::errors::TrendError;

/// Code substituted for categories the encoder never saw while fitting.
/// Fitted classes start at 1 so this code is never shared with one.
pub const UNSEEN_CATEGORY_CODE: f64 = 0.0;

/// Sorted vocabulary; a value's code is its one-based position.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn fit<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let classes: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        Self { classes: classes.into_iter().collect() }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn code(&self, value: &str) -> Option<usize> {
        self.classes.binary_search_by(|class| class.as_str().cmp(value)).ok().map(|index| index + 1)
    }
}

/// Fitted categorical vocabularies bound to one feature schema.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureEncoder {
    schema: FeatureSchema,
    encoders: BTreeMap<CategoricalField, LabelEncoder>,
}

impl FeatureEncoder {
    pub fn fit<S: FeatureSource>(schema: FeatureSchema, corpus: &[S]) -> Self {
        let encoders = schema
            .categorical_fields()
            .into_iter()
            .map(|field| {
                let encoder = LabelEncoder::fit(corpus.iter().map(|row| category_value(row, field)));
                (field, encoder)
            })
            .collect();
        Self { schema, encoders }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn vocabulary(&self, field: CategoricalField) -> Option<&LabelEncoder> {
        self.encoders.get(&field)
    }

    /// Every categorical column in the schema has a fitted vocabulary.
    pub fn covers_schema(&self) -> bool {
        self.schema.categorical_fields().iter().all(|field| self.encoders.contains_key(field))
    }

    /// Encodes one row in schema order. Deterministic for a given row.
    pub fn encode<S: FeatureSource>(&self, source: &S) -> Vec<f64> {
        self.schema.columns().iter().map(|column| self.column_value(source, column)).collect()
    }

    /// Encodes one row for a consumer fitted on `expected` columns.
    pub fn encode_for_width<S: FeatureSource>(
        &self,
        source: &S,
        expected: usize,
    ) -> Result<Vec<f64>, TrendError> {
        let vector = self.encode(source);
        if vector.len() != expected {
            return Err(TrendError::SchemaMismatch { expected, actual: vector.len() });
        }
        Ok(vector)
    }

    fn column_value<S: FeatureSource>(&self, source: &S, column: &str) -> f64 {
        if let Some(field) = CategoricalField::from_column(column) {
            return self.encode_category(source, field);
        }
        match column {
            VIRAL_POTENTIAL => viral_potential(
                finite_or_zero(source.numeric("likes")),
                finite_or_zero(source.numeric("views")),
            ),
            ENGAGEMENT_CATEGORY => {
                engagement_category(finite_or_zero(source.numeric("engagement_rate")))
            }
            _ => finite_or_zero(source.numeric(column)),
        }
    }

    fn encode_category<S: FeatureSource>(&self, source: &S, field: CategoricalField) -> f64 {
        let value = category_value(source, field);
        match self.encoders.get(&field).and_then(|encoder| encoder.code(&value)) {
            Some(code) => code as f64,
            None => {
                tracing::warn!(
                    event_name = "features.category.unseen",
                    field = field.key(),
                    value = %value,
                    "category not seen during fitting; using sentinel code"
                );
                UNSEEN_CATEGORY_CODE
            }
        }
    }
}

fn category_value<S: FeatureSource>(source: &S, field: CategoricalField) -> String {
    source
        .categorical(field)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| MISSING_CATEGORY.to_string())
}

fn finite_or_zero(value: Option<f64>) -> f64 {
    value.filter(|value| value.is_finite()).unwrap_or(0.0)
}
