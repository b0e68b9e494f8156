//! Plain-text reports written next to a validated iCSV file.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use itertools::Itertools;

use crate::{icsv::MetadataError, validator::Issue};

pub const DATA_OK: &str = "Data validation [OK]";
pub const DATA_ERRORS: &str = "Data validation errors:";
pub const METADATA_OK: &str = "OK: Metadata checks passed.";
pub const METADATA_HINT: &str = "Please fix metadata issues above.";
pub const ABORT_NOTICE: &str = "Validation aborted due to metadata errors. See metadata report.";

const DEFAULT_SUGGESTION: &str =
    "Inspect the flagged value and fix formatting or data entry issues.";

const ERROR_SUGGESTIONS: &[(&str, &str)] = &[
    (
        "type-error",
        "Check that values in this column match the expected type (e.g., numbers, ISO datetimes).",
    ),
    (
        "missing-cell",
        "Consider filling missing values, setting a nodata marker, or making the field optional.",
    ),
    (
        "blank-row",
        "There is an unexpected blank row; remove or investigate formatting issues.",
    ),
    (
        "extra-cell",
        "A row has too many cells: check delimiter or quoting.",
    ),
    (
        "duplicate-label",
        "Duplicate column name: rename columns to unique names.",
    ),
];

pub fn suggestion_for(code: &str) -> &'static str {
    ERROR_SUGGESTIONS
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, suggestion)| *suggestion)
        .unwrap_or(DEFAULT_SUGGESTION)
}

/// Human-readable summary of a data validation run, one line per issue plus an
/// indented suggestion.
pub fn format_report(valid: bool, issues: &[Issue]) -> String {
    if valid {
        return DATA_OK.to_string();
    }
    let mut lines = vec![DATA_ERRORS.to_string()];
    for issue in issues {
        lines.push(format!(
            "  Row {}, Col {} [{}]: {}",
            position(issue.row),
            position(issue.column),
            issue.code,
            issue.message
        ));
        lines.push(format!("    Suggestion: {}", suggestion_for(&issue.code)));
    }
    lines.join("\n")
}

fn position(value: Option<usize>) -> String {
    value.map_or_else(|| "?".to_string(), |v| v.to_string())
}

/// Text of the metadata report: one `ERROR:` line per problem followed by a
/// remediation hint, or the OK marker. Shape warnings are appended either way.
pub fn format_metadata_report(errors: &[MetadataError], warnings: &[String]) -> String {
    let mut text = if errors.is_empty() {
        format!("{METADATA_OK}\n")
    } else {
        format!(
            "{}\n\n{METADATA_HINT}\n",
            errors.iter().map(|e| format!("ERROR: {e}")).join("\n")
        )
    };
    for warning in warnings {
        text.push_str(&format!("WARNING: {warning}\n"));
    }
    text
}

pub fn write_report(path: &Path, text: &str) -> Result<()> {
    let mut contents = text.to_string();
    if !contents.ends_with('\n') {
        contents.push('\n');
    }
    fs::write(path, contents).with_context(|| format!("Writing report {path:?}"))
}
