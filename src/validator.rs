//! Cell-level validation of a normalized table against a [`ValidationSchema`].
//!
//! The pipeline only talks to the [`TableValidator`] trait. The bundled
//! [`BuiltinValidator`] reports issues with table-schema style codes
//! (`type-error`, `constraint-error`, `missing-cell`, ...). Row numbers count
//! the header as row 1; column numbers start at 1.

use std::{collections::HashMap, fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::Serialize;

use crate::{
    datetime::DateParser,
    infer::{parse_integer, parse_number},
    io_utils,
    missing::MissingValues,
    schema::{ConstraintValue, FieldType, SchemaField, ValidationSchema},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub row: Option<usize>,
    pub column: Option<usize>,
    pub code: String,
    pub message: String,
}

impl Issue {
    fn new(row: Option<usize>, column: Option<usize>, code: &str, message: String) -> Self {
        Self {
            row,
            column,
            code: code.to_string(),
            message,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub issues: Vec<Issue>,
}

impl ValidationReport {
    pub fn from_issues(issues: Vec<Issue>) -> Self {
        Self {
            valid: issues.is_empty(),
            issues,
        }
    }
}

/// Validation capability invoked on a normalized delimited table.
pub trait TableValidator {
    fn validate(
        &self,
        table: &Path,
        delimiter: u8,
        schema: &ValidationSchema,
    ) -> Result<ValidationReport>;
}

#[derive(Debug, Clone, Copy)]
pub struct BuiltinValidator<'a> {
    dates: &'a dyn DateParser,
}

impl<'a> BuiltinValidator<'a> {
    pub fn new(dates: &'a dyn DateParser) -> Self {
        Self { dates }
    }

    /// Checks an already materialized table. `header` is row 1.
    pub fn check_rows(
        &self,
        header: &[String],
        rows: &[Vec<String>],
        schema: &ValidationSchema,
    ) -> ValidationReport {
        let missing = schema.missing_values();
        let mut issues = Vec::new();
        issues.extend(label_issues(header, &schema.fields));
        issues.extend(schema_issues(&schema.fields));

        let field_count = schema.fields.len();
        for (idx, row) in rows.iter().enumerate() {
            let row_number = idx + 2;
            if row.iter().all(|cell| missing.is_missing(cell.trim())) {
                issues.push(Issue::new(
                    Some(row_number),
                    None,
                    "blank-row",
                    format!("Row at position \"{row_number}\" is completely blank"),
                ));
                continue;
            }
            for (col, field) in schema.fields.iter().enumerate() {
                match row.get(col) {
                    Some(cell) => {
                        issues.extend(self.check_cell(cell, field, row_number, col + 1, &missing))
                    }
                    None => issues.push(Issue::new(
                        Some(row_number),
                        Some(col + 1),
                        "missing-cell",
                        format!(
                            "Row at position \"{row_number}\" has a missing cell in field \"{}\" at position \"{}\"",
                            field.name,
                            col + 1
                        ),
                    )),
                }
            }
            for col in field_count..row.len() {
                issues.push(Issue::new(
                    Some(row_number),
                    Some(col + 1),
                    "extra-cell",
                    format!(
                        "Row at position \"{row_number}\" has an extra value in field at position \"{}\"",
                        col + 1
                    ),
                ));
            }
        }
        ValidationReport::from_issues(issues)
    }

    fn check_cell(
        &self,
        cell: &str,
        field: &SchemaField,
        row: usize,
        column: usize,
        missing: &MissingValues,
    ) -> Option<Issue> {
        let constraints = field.constraints();
        let constraint_issue = |name: &str, bound: &dyn std::fmt::Display| {
            Issue::new(
                Some(row),
                Some(column),
                "constraint-error",
                format!(
                    "The cell \"{cell}\" in row \"{row}\" and field \"{}\" at position \"{column}\" does not conform to a constraint: constraint \"{name}\" is \"{bound}\"",
                    field.name
                ),
            )
        };
        let trimmed = cell.trim();
        if missing.is_missing(trimmed) {
            return constraints
                .is_required()
                .then(|| constraint_issue("required", &true));
        }
        let Some(value) = self.parse_cell(trimmed, &field.field_type) else {
            return Some(Issue::new(
                Some(row),
                Some(column),
                "type-error",
                format!(
                    "Type error in the cell \"{cell}\" in row \"{row}\" and field \"{}\" at position \"{column}\": type is \"{}\"",
                    field.name, field.field_type
                ),
            ));
        };
        if let Some(minimum) = &constraints.minimum
            && self.compare(&value, minimum).is_some_and(|o| o.is_lt())
        {
            return Some(constraint_issue("minimum", minimum));
        }
        if let Some(maximum) = &constraints.maximum
            && self.compare(&value, maximum).is_some_and(|o| o.is_gt())
        {
            return Some(constraint_issue("maximum", maximum));
        }
        None
    }

    fn parse_cell(&self, value: &str, field_type: &FieldType) -> Option<CellValue> {
        match field_type {
            FieldType::Integer => parse_integer(value).map(|v| CellValue::Number(v as f64)),
            FieldType::Number => parse_number(value).map(CellValue::Number),
            FieldType::Date | FieldType::Datetime => self.dates.parse(value).map(CellValue::Instant),
            FieldType::Boolean => parse_boolean(value).map(|_| CellValue::Other),
            FieldType::String | FieldType::Any | FieldType::Other(_) => Some(CellValue::Other),
        }
    }

    fn compare(&self, value: &CellValue, bound: &ConstraintValue) -> Option<std::cmp::Ordering> {
        match (value, bound) {
            (CellValue::Number(v), bound) => v.partial_cmp(&bound.as_f64()?),
            (CellValue::Instant(v), ConstraintValue::Text(raw)) => {
                Some(v.cmp(&self.dates.parse(raw.trim())?))
            }
            _ => None,
        }
    }
}

impl TableValidator for BuiltinValidator<'_> {
    fn validate(
        &self,
        table: &Path,
        delimiter: u8,
        schema: &ValidationSchema,
    ) -> Result<ValidationReport> {
        let file = File::open(table).with_context(|| format!("Opening table {table:?}"))?;
        let mut reader = io_utils::open_csv_reader(BufReader::new(file), delimiter, false);
        let mut records = reader.records();
        let header = match records.next() {
            Some(record) => record
                .context("Reading table header")?
                .iter()
                .map(str::to_string)
                .collect::<Vec<_>>(),
            None => Vec::new(),
        };
        let rows = records
            .enumerate()
            .map(|(idx, record)| {
                record
                    .map(|r| r.iter().map(str::to_string).collect::<Vec<_>>())
                    .with_context(|| format!("Reading table row {}", idx + 2))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(self.check_rows(&header, &rows, schema))
    }
}

#[derive(Debug, Clone, Copy)]
enum CellValue {
    Number(f64),
    Instant(NaiveDateTime),
    Other,
}

fn parse_boolean(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

fn label_issues(header: &[String], fields: &[SchemaField]) -> Vec<Issue> {
    let mut issues = Vec::new();
    let mut first_position: HashMap<&str, usize> = HashMap::new();
    for (idx, label) in header.iter().enumerate() {
        let position = idx + 1;
        if let Some(first) = first_position.get(label.as_str()) {
            issues.push(Issue::new(
                None,
                Some(position),
                "duplicate-label",
                format!(
                    "Label \"{label}\" at position \"{position}\" is duplicated to a label: at position \"{first}\""
                ),
            ));
        } else {
            first_position.insert(label.as_str(), position);
        }
        match fields.get(idx) {
            Some(field) if field.name != *label => issues.push(Issue::new(
                None,
                Some(position),
                "incorrect-label",
                format!(
                    "Label \"{label}\" at position \"{position}\" does not match the field name \"{}\"",
                    field.name
                ),
            )),
            Some(_) => {}
            None => issues.push(Issue::new(
                None,
                Some(position),
                "extra-label",
                format!("Label \"{label}\" at position \"{position}\" has no field in the schema"),
            )),
        }
    }
    for (idx, field) in fields.iter().enumerate().skip(header.len()) {
        issues.push(Issue::new(
            None,
            Some(idx + 1),
            "missing-label",
            format!(
                "Field \"{}\" at position \"{}\" has no label in the header",
                field.name,
                idx + 1
            ),
        ));
    }
    issues
}

fn schema_issues(fields: &[SchemaField]) -> Vec<Issue> {
    fields
        .iter()
        .enumerate()
        .filter_map(|(idx, field)| match &field.field_type {
            FieldType::Other(token) => Some(Issue::new(
                None,
                Some(idx + 1),
                "schema-error",
                format!(
                    "Field \"{}\" declares unsupported type \"{token}\"",
                    field.name
                ),
            )),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        datetime::FlexibleDateParser,
        schema::Constraints,
    };

    fn field(name: &str, field_type: FieldType, constraints: Option<Constraints>) -> SchemaField {
        SchemaField {
            name: name.into(),
            field_type,
            format: None,
            description: None,
            constraints,
        }
    }

    fn schema(fields: Vec<SchemaField>) -> ValidationSchema {
        ValidationSchema {
            fields,
            missing_values: MissingValues::default().tokens().to_vec(),
        }
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn conforming_rows_are_valid() {
        let schema = schema(vec![
            field("timestamp", FieldType::Datetime, None),
            field("ta", FieldType::Integer, None),
        ]);
        let report = BuiltinValidator::new(&FlexibleDateParser).check_rows(
            &strings(&["timestamp", "ta"]),
            &[
                strings(&["2020-01-01T00:00:00", "10"]),
                strings(&["2020-01-01T01:00:00", "NA"]),
            ],
            &schema,
        );
        assert!(report.valid, "{:?}", report.issues);
    }

    #[test]
    fn non_numeric_cell_is_a_type_error_on_its_row() {
        let schema = schema(vec![
            field("timestamp", FieldType::Datetime, None),
            field("ta", FieldType::Number, None),
        ]);
        let report = BuiltinValidator::new(&FlexibleDateParser).check_rows(
            &strings(&["timestamp", "ta"]),
            &[
                strings(&["2020-01-01T00:00:00", "10"]),
                strings(&["2020-01-01T01:00:00", "not_a_number"]),
            ],
            &schema,
        );
        assert!(!report.valid);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].code, "type-error");
        assert_eq!(report.issues[0].row, Some(3));
        assert_eq!(report.issues[0].column, Some(2));
    }

    #[test]
    fn bounds_are_enforced() {
        let constraints = Constraints {
            required: None,
            minimum: Some(ConstraintValue::Integer(0)),
            maximum: Some(ConstraintValue::Float(1.5)),
        };
        let dated = Constraints {
            required: None,
            minimum: None,
            maximum: Some(ConstraintValue::Text("2020-01-01T00:00:00".into())),
        };
        let schema = schema(vec![
            field("rh", FieldType::Number, Some(constraints)),
            field("ts", FieldType::Datetime, Some(dated)),
        ]);
        let report = BuiltinValidator::new(&FlexibleDateParser).check_rows(
            &strings(&["rh", "ts"]),
            &[
                strings(&["-1", "2019-12-31"]),
                strings(&["2", "2020-01-02"]),
            ],
            &schema,
        );
        let codes = report
            .issues
            .iter()
            .map(|i| (i.row, i.column, i.code.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(
            codes,
            vec![
                (Some(2), Some(1), "constraint-error"),
                (Some(3), Some(1), "constraint-error"),
                (Some(3), Some(2), "constraint-error"),
            ]
        );
        assert!(report.issues[0].message.contains("minimum"));
        assert!(report.issues[1].message.contains("maximum"));
    }

    #[test]
    fn required_fields_reject_missing_values() {
        let required = Constraints {
            required: Some(true),
            ..Constraints::default()
        };
        let schema = schema(vec![
            field("id", FieldType::Integer, Some(required)),
            field("note", FieldType::String, None),
        ]);
        let report = BuiltinValidator::new(&FlexibleDateParser).check_rows(
            &strings(&["id", "note"]),
            &[strings(&["", "x"])],
            &schema,
        );
        assert_eq!(report.issues.len(), 1);
        assert!(report.issues[0].message.contains("required"));
    }

    #[test]
    fn padded_missing_tokens_count_as_missing() {
        let schema = schema(vec![
            field("id", FieldType::Integer, None),
            field("ta", FieldType::Integer, None),
        ]);
        let report = BuiltinValidator::new(&FlexibleDateParser).check_rows(
            &strings(&["id", "ta"]),
            &[strings(&["1", " NA"]), strings(&["2", " 5 "]), strings(&[" ", " null"])],
            &schema,
        );
        let codes = report
            .issues
            .iter()
            .map(|i| (i.row, i.code.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(codes, vec![(Some(4), "blank-row")]);
    }

    #[test]
    fn structural_problems_use_dedicated_codes() {
        let schema = schema(vec![
            field("a", FieldType::String, None),
            field("a", FieldType::String, None),
        ]);
        let report = BuiltinValidator::new(&FlexibleDateParser).check_rows(
            &strings(&["a", "a"]),
            &[strings(&["", ""]), strings(&["x"]), strings(&["x", "y", "z"])],
            &schema,
        );
        let codes = report
            .issues
            .iter()
            .map(|i| i.code.as_str())
            .collect::<Vec<_>>();
        assert_eq!(
            codes,
            vec!["duplicate-label", "blank-row", "missing-cell", "extra-cell"]
        );
    }

    #[test]
    fn unknown_types_are_schema_errors() {
        let schema = schema(vec![field("g", FieldType::Other("geopoint".into()), None)]);
        let report = BuiltinValidator::new(&FlexibleDateParser).check_rows(
            &strings(&["g"]),
            &[strings(&["1,2"])],
            &schema,
        );
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].code, "schema-error");
    }

    #[test]
    fn mismatched_labels_are_reported() {
        let schema = schema(vec![field("a", FieldType::String, None), field("b", FieldType::String, None)]);
        let report = BuiltinValidator::new(&FlexibleDateParser).check_rows(
            &strings(&["a", "c"]),
            &[],
            &schema,
        );
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].code, "incorrect-label");
    }
}
