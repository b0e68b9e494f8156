//! Missing-value vocabulary shared by inference, nodata detection, the schema
//! document and the built-in validator.
//!
//! Membership is case-sensitive: `NA` and `na` are both listed explicitly,
//! while `Na` is an ordinary string.

use serde::{Deserialize, Serialize};

pub const DEFAULT_MISSING_TOKENS: &[&str] = &[
    "",
    "NA",
    "N/A",
    "na",
    "n/a",
    "NULL",
    "null",
    "nan",
    "NaN",
    "-999",
    "-999.0",
    "-999.000000",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MissingValues {
    tokens: Vec<String>,
}

impl Default for MissingValues {
    fn default() -> Self {
        Self::new(DEFAULT_MISSING_TOKENS.iter().map(|t| t.to_string()))
    }
}

impl MissingValues {
    /// Builds a vocabulary from `tokens`, dropping duplicates but keeping the
    /// first-seen order.
    pub fn new<I>(tokens: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for token in tokens {
            if !unique.contains(&token) {
                unique.push(token);
            }
        }
        Self { tokens: unique }
    }

    pub fn contains(&self, value: &str) -> bool {
        self.tokens.iter().any(|token| token == value)
    }

    /// True when `value` is empty or a listed token.
    pub fn is_missing(&self, value: &str) -> bool {
        value.is_empty() || self.contains(value)
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }
}
