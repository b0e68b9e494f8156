//! Column type inference and per-column profiling.
//!
//! A column is reduced to its *pruned* values (trimmed, with missing tokens
//! removed) and every pruned value is tested against three hypotheses:
//! integer, number and datetime. The first surviving hypothesis in the order
//! integer, number, datetime wins; otherwise the column is a string. An empty
//! pruned set carries no evidence and is also a string.

use std::{fmt, sync::LazyLock};

use chrono::NaiveDateTime;
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    datetime::{DateParser, format_iso},
    missing::MissingValues,
    schema::ConstraintValue,
};

static INTEGER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+$").expect("valid integer pattern"));
static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+(\.\d+)?$").expect("valid number pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Integer,
    Number,
    Datetime,
    String,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::Number => "number",
            ColumnType::Datetime => "datetime",
            ColumnType::String => "string",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inferred profile of one column, serialized into the FIELDS block.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnProfile {
    pub name: String,
    pub column_type: ColumnType,
    pub min: Option<ConstraintValue>,
    pub max: Option<ConstraintValue>,
    pub missing_count: usize,
    pub description: String,
    /// At least one value and none of them missing.
    pub complete: bool,
}

#[derive(Debug, Clone)]
struct TypeCandidate {
    possible_integer: bool,
    possible_number: bool,
    possible_datetime: bool,
}

impl TypeCandidate {
    fn new() -> Self {
        Self {
            possible_integer: true,
            possible_number: true,
            possible_datetime: true,
        }
    }

    fn update(&mut self, value: &str, dates: &dyn DateParser) {
        let integer = INTEGER_RE.is_match(value);
        if !integer {
            self.possible_integer = false;
        }
        if !integer && !NUMBER_RE.is_match(value) {
            self.possible_number = false;
        }
        if self.possible_datetime && !dates.is_datetime(value) {
            self.possible_datetime = false;
        }
    }

    fn decide(&self) -> ColumnType {
        if self.possible_integer {
            ColumnType::Integer
        } else if self.possible_number {
            ColumnType::Number
        } else if self.possible_datetime {
            ColumnType::Datetime
        } else {
            ColumnType::String
        }
    }
}

/// Trims every cell and keeps only the values that are not missing.
pub fn prune<'a, I>(values: I, missing: &MissingValues) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    values
        .into_iter()
        .map(str::trim)
        .filter(|value| !missing.is_missing(value))
        .collect()
}

pub fn infer_column_type<'a, I>(
    values: I,
    missing: &MissingValues,
    dates: &dyn DateParser,
) -> ColumnType
where
    I: IntoIterator<Item = &'a str>,
{
    decide_pruned(&prune(values, missing), dates)
}

fn decide_pruned(pruned: &[&str], dates: &dyn DateParser) -> ColumnType {
    if pruned.is_empty() {
        return ColumnType::String;
    }
    let mut candidate = TypeCandidate::new();
    for value in pruned {
        candidate.update(value, dates);
    }
    candidate.decide()
}

pub fn parse_integer(value: &str) -> Option<i64> {
    value.parse().ok()
}

pub fn parse_number(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Numeric min/max over `pruned`; any value that fails the cast drops both
/// bounds.
pub fn numeric_bounds(
    pruned: &[&str],
    column_type: ColumnType,
) -> Option<(ConstraintValue, ConstraintValue)> {
    match column_type {
        ColumnType::Integer => {
            let parsed = pruned
                .iter()
                .map(|v| parse_integer(v))
                .collect::<Option<Vec<_>>>()?;
            let min = parsed.iter().copied().min()?;
            let max = parsed.iter().copied().max()?;
            Some((ConstraintValue::Integer(min), ConstraintValue::Integer(max)))
        }
        ColumnType::Number => {
            let parsed = pruned
                .iter()
                .map(|v| parse_number(v))
                .collect::<Option<Vec<_>>>()?;
            let min = parsed.iter().copied().reduce(f64::min)?;
            let max = parsed.iter().copied().reduce(f64::max)?;
            Some((ConstraintValue::Float(min), ConstraintValue::Float(max)))
        }
        _ => None,
    }
}

/// Earliest and latest instants among the values `dates` can parse;
/// unparsable values are skipped.
pub fn datetime_bounds(
    pruned: &[&str],
    dates: &dyn DateParser,
) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let parsed = pruned
        .iter()
        .filter_map(|v| dates.parse(v))
        .collect::<Vec<_>>();
    let min = parsed.iter().min().copied()?;
    let max = parsed.iter().max().copied()?;
    Some((min, max))
}

pub fn profile_column(
    name: &str,
    values: &[&str],
    missing: &MissingValues,
    dates: &dyn DateParser,
) -> ColumnProfile {
    let pruned = prune(values.iter().copied(), missing);
    let column_type = decide_pruned(&pruned, dates);
    let (min, max) = match column_type {
        ColumnType::Integer | ColumnType::Number => match numeric_bounds(&pruned, column_type) {
            Some((min, max)) => (Some(min), Some(max)),
            None => {
                debug!("Column '{name}': numeric bounds unavailable");
                (None, None)
            }
        },
        ColumnType::Datetime => match datetime_bounds(&pruned, dates) {
            Some((min, max)) => (
                Some(ConstraintValue::Text(format_iso(&min))),
                Some(ConstraintValue::Text(format_iso(&max))),
            ),
            None => (None, None),
        },
        ColumnType::String => (None, None),
    };
    let missing_count = values.len() - pruned.len();
    debug!(
        "Column '{name}' inferred as {column_type} ({} value(s), {missing_count} missing)",
        values.len()
    );
    ColumnProfile {
        name: name.to_string(),
        column_type,
        min,
        max,
        missing_count,
        description: String::new(),
        complete: !values.is_empty() && missing_count == 0,
    }
}
