//! Validation schema model and its JSON persistence.
//!
//! A [`ValidationSchema`] is rebuilt on demand, either from freshly computed
//! [`ColumnProfile`]s during enrichment or from the FIELDS block of a parsed
//! iCSV file, and handed to a [`crate::validator::TableValidator`]. The JSON
//! layout follows the table-schema convention (`fields`, `missingValues`).

use std::{fmt, fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{
    icsv::FieldLists,
    infer::{ColumnProfile, ColumnType},
    missing::MissingValues,
};

/// Bound value of a `minimum`/`maximum` constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConstraintValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl ConstraintValue {
    /// Interprets a FIELDS `min`/`max` entry: text containing `.` is tried as a
    /// float, anything else as an integer, and values failing both stay text.
    pub fn parse_bound(raw: &str) -> Self {
        let parsed = if raw.contains('.') {
            raw.parse::<f64>().ok().map(ConstraintValue::Float)
        } else {
            raw.parse::<i64>().ok().map(ConstraintValue::Integer)
        };
        parsed.unwrap_or_else(|| ConstraintValue::Text(raw.to_string()))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConstraintValue::Integer(v) => Some(*v as f64),
            ConstraintValue::Float(v) => Some(*v),
            ConstraintValue::Text(_) => None,
        }
    }
}

impl fmt::Display for ConstraintValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintValue::Integer(v) => write!(f, "{v}"),
            ConstraintValue::Float(v) => f.write_str(&format_float(*v)),
            ConstraintValue::Text(v) => f.write_str(v),
        }
    }
}

/// Formats a float so that it always reads back as a float: whole values keep
/// a trailing `.0`.
pub fn format_float(value: f64) -> String {
    let mut rendered = value.to_string();
    if rendered.chars().all(|c| c.is_ascii_digit() || c == '-') {
        rendered.push_str(".0");
    }
    rendered
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    Date,
    Datetime,
    Any,
    Other(String),
}

impl FieldType {
    pub fn parse(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "" | "string" => FieldType::String,
            "integer" => FieldType::Integer,
            "number" => FieldType::Number,
            "boolean" => FieldType::Boolean,
            "date" => FieldType::Date,
            "datetime" => FieldType::Datetime,
            "any" => FieldType::Any,
            _ => FieldType::Other(token.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Datetime => "datetime",
            FieldType::Any => "any",
            FieldType::Other(token) => token,
        }
    }
}

impl From<ColumnType> for FieldType {
    fn from(value: ColumnType) -> Self {
        match value {
            ColumnType::Integer => FieldType::Integer,
            ColumnType::Number => FieldType::Number,
            ColumnType::Datetime => FieldType::Datetime,
            ColumnType::String => FieldType::String,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FieldType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let token = String::deserialize(deserializer)?;
        Ok(FieldType::parse(&token))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<ConstraintValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<ConstraintValue>,
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        self.required.is_none() && self.minimum.is_none() && self.maximum.is_none()
    }

    pub fn is_required(&self) -> bool {
        self.required.unwrap_or(false)
    }

    fn into_option(self) -> Option<Self> {
        (!self.is_empty()).then_some(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    #[serde(rename = "type", default = "default_field_type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Constraints>,
}

fn default_field_type() -> FieldType {
    FieldType::String
}

impl SchemaField {
    pub fn constraints(&self) -> Constraints {
        self.constraints.clone().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationSchema {
    pub fields: Vec<SchemaField>,
    #[serde(rename = "missingValues", default)]
    pub missing_values: Vec<String>,
}

impl ValidationSchema {
    /// Schema document written next to a freshly built iCSV file.
    pub fn from_profiles(profiles: &[ColumnProfile], missing: &MissingValues) -> Self {
        let fields = profiles
            .iter()
            .map(|profile| {
                let constraints = Constraints {
                    required: profile.complete.then_some(true),
                    minimum: profile.min.clone(),
                    maximum: profile.max.clone(),
                };
                SchemaField {
                    name: profile.name.clone(),
                    field_type: profile.column_type.into(),
                    format: (profile.column_type == ColumnType::Datetime)
                        .then(|| "any".to_string()),
                    description: Some(profile.description.clone()).filter(|d| !d.is_empty()),
                    constraints: constraints.into_option(),
                }
            })
            .collect();
        Self {
            fields,
            missing_values: missing.tokens().to_vec(),
        }
    }

    /// Rebuilds a schema from the FIELDS block of a parsed iCSV file.
    ///
    /// One field per `fields` entry; the matching `types`, `description`,
    /// `min` and `max` entries are used when present and non-empty.
    pub fn from_field_lists(lists: &FieldLists, missing: &MissingValues) -> Self {
        let entry = |key: &str, idx: usize| -> Option<&str> {
            lists
                .get(key)
                .and_then(|values| values.get(idx))
                .map(String::as_str)
                .filter(|value| !value.is_empty())
        };
        let fields = lists
            .get("fields")
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let constraints = Constraints {
                    required: None,
                    minimum: entry("min", idx).map(ConstraintValue::parse_bound),
                    maximum: entry("max", idx).map(ConstraintValue::parse_bound),
                };
                SchemaField {
                    name: name.clone(),
                    field_type: entry("types", idx)
                        .map(FieldType::parse)
                        .unwrap_or(FieldType::String),
                    format: None,
                    description: entry("description", idx).map(str::to_string),
                    constraints: constraints.into_option(),
                }
            })
            .collect();
        Self {
            fields,
            missing_values: missing.tokens().to_vec(),
        }
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    pub fn missing_values(&self) -> MissingValues {
        MissingValues::new(self.missing_values.iter().cloned())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file =
            File::create(path).with_context(|| format!("Creating schema file {path:?}"))?;
        serde_json::to_writer_pretty(file, self).context("Writing schema JSON")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening schema file {path:?}"))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).context("Parsing schema JSON")
    }
}
