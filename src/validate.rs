use std::{
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use encoding_rs::UTF_8;
use log::{debug, info, warn};
use tempfile::NamedTempFile;

use crate::{
    icsv::{
        DataSection, KEY_FIELDS, MetadataError, ParsedHeader, check_metadata,
        declared_shape_warnings, parse_header, read_data_section,
    },
    io_utils,
    missing::MissingValues,
    report,
    schema::ValidationSchema,
    validator::{Issue, TableValidator},
};

#[derive(Debug, Clone, Default)]
pub struct ValidateOptions {
    /// Used instead of the schema rebuilt from the FIELDS block.
    pub schema: Option<ValidationSchema>,
    pub missing: MissingValues,
    /// Defaults to `<stem>_data_report.txt` beside the iCSV file.
    pub data_report: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub metadata_report: PathBuf,
    pub data_report: PathBuf,
    pub metadata_errors: Vec<MetadataError>,
    pub issues: Vec<Issue>,
}

pub fn metadata_report_path(icsv: &Path) -> PathBuf {
    io_utils::sibling_path(icsv, "_metadata_report.txt")
}

pub fn data_report_path(icsv: &Path) -> PathBuf {
    io_utils::sibling_path(icsv, "_data_report.txt")
}

/// Validates an iCSV file: metadata gate first, then the DATA section through
/// `validator`. Both reports are always written.
///
/// Metadata errors stop the run before `validator` is called. A validator
/// failure is recorded in the data report and yields an invalid outcome.
pub fn validate_icsv(
    path: &Path,
    options: &ValidateOptions,
    validator: &dyn TableValidator,
) -> Result<ValidationOutcome> {
    let metadata_report = metadata_report_path(path);
    let data_report = options
        .data_report
        .clone()
        .unwrap_or_else(|| data_report_path(path));
    let text = io_utils::read_text(path, UTF_8)?;
    let header = parse_header(&text);
    let metadata_errors = check_metadata(&header);

    let mut outcome = ValidationOutcome {
        valid: false,
        metadata_report,
        data_report,
        metadata_errors,
        issues: Vec::new(),
    };

    if !outcome.metadata_errors.is_empty() {
        for error in &outcome.metadata_errors {
            warn!("Metadata error in {path:?}: {error}");
        }
        report::write_report(
            &outcome.metadata_report,
            &report::format_metadata_report(&outcome.metadata_errors, &[]),
        )?;
        report::write_report(&outcome.data_report, report::ABORT_NOTICE)?;
        return Ok(outcome);
    }

    let delimiter = header
        .delimiter_byte()
        .ok_or_else(|| anyhow!("Declared field_delimiter is not a single character"))?;
    let data = read_data_section(&text, delimiter)
        .with_context(|| format!("Reading DATA section of {path:?}"))?;
    let observed_columns = if data.header.is_empty() {
        header.fields.get(KEY_FIELDS).map_or(0, Vec::len)
    } else {
        data.header.len()
    };
    let warnings = declared_shape_warnings(&header, observed_columns, data.rows.len());
    for warning in &warnings {
        warn!("{warning}");
    }
    report::write_report(
        &outcome.metadata_report,
        &report::format_metadata_report(&[], &warnings),
    )?;

    let schema = match &options.schema {
        Some(schema) => schema.clone(),
        None => ValidationSchema::from_field_lists(&header.fields, &options.missing),
    };
    debug!(
        "Validating {} row(s) against field(s) {:?}",
        data.rows.len(),
        schema.field_names()
    );

    let table = normalized_table(&header, &data, delimiter)?;
    match validator.validate(table.path(), delimiter, &schema) {
        Ok(result) => {
            outcome.valid = result.valid;
            report::write_report(
                &outcome.data_report,
                &report::format_report(result.valid, &result.issues),
            )?;
            outcome.issues = result.issues;
        }
        Err(err) => {
            warn!("Validator failed on {path:?}: {err:#}");
            report::write_report(&outcome.data_report, &format!("Validation failed: {err:#}"))?;
        }
    }
    info!(
        "Validated {path:?}: {} issue(s)",
        outcome.issues.len()
    );
    Ok(outcome)
}

/// Writes the DATA section to a scoped temporary CSV. Rows are padded or
/// truncated to the header width. The file is removed when the handle drops.
fn normalized_table(
    header: &ParsedHeader,
    data: &DataSection,
    delimiter: u8,
) -> Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("devo-")
        .suffix(".csv")
        .tempfile()
        .context("Creating temporary table")?;
    let labels = if data.header.is_empty() {
        header.fields.get(KEY_FIELDS).cloned().unwrap_or_default()
    } else {
        data.header.clone()
    };
    let width = labels.len();
    {
        let mut writer = io_utils::open_csv_writer(file.as_file_mut(), delimiter);
        writer
            .write_record(&labels)
            .context("Writing temporary table header")?;
        for row in &data.rows {
            writer
                .write_record(io_utils::fit_row(row.clone(), width))
                .context("Writing temporary table row")?;
        }
        writer.flush().context("Flushing temporary table")?;
    }
    file.as_file_mut()
        .flush()
        .context("Flushing temporary table")?;
    Ok(file)
}
