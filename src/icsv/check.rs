use thiserror::Error;

use super::{KEY_COLUMNS, KEY_FIELDS, KEY_ROWS, ParsedHeader};

/// A structural problem in the METADATA or FIELDS block. Any of these stops
/// data validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    #[error("Missing required metadata: field_delimiter")]
    MissingDelimiter,
    #[error("Invalid field_delimiter '{0}': expected a single ASCII character")]
    InvalidDelimiter(String),
    #[error("Missing [FIELDS] 'fields' list")]
    MissingFields,
    #[error("Inconsistent count in '{key}': expected {expected}, found {found}")]
    InconsistentCount {
        key: String,
        expected: usize,
        found: usize,
    },
}

/// Runs the metadata gate. An empty result means the header is usable.
///
/// Every FIELDS list other than `fields` must have as many entries as
/// `fields`; an empty list is exempt.
pub fn check_metadata(header: &ParsedHeader) -> Vec<MetadataError> {
    let mut errors = Vec::new();
    match header.field_delimiter() {
        None => errors.push(MetadataError::MissingDelimiter),
        Some(declared) if header.delimiter_byte().is_none() => {
            errors.push(MetadataError::InvalidDelimiter(declared.to_string()))
        }
        Some(_) => {}
    }
    match header.fields.get(KEY_FIELDS) {
        None => errors.push(MetadataError::MissingFields),
        Some(names) => {
            let expected = names.len();
            errors.extend(
                header
                    .fields
                    .iter()
                    .filter(|(key, values)| {
                        key.as_str() != KEY_FIELDS
                            && !values.is_empty()
                            && values.len() != expected
                    })
                    .map(|(key, values)| MetadataError::InconsistentCount {
                        key: key.clone(),
                        expected,
                        found: values.len(),
                    }),
            );
        }
    }
    errors
}

/// Compares the declared `rows`/`columns` with what the DATA section holds.
/// The result is informational and never gates validation.
pub fn declared_shape_warnings(
    header: &ParsedHeader,
    observed_columns: usize,
    observed_rows: usize,
) -> Vec<String> {
    let mut warnings = Vec::new();
    for (key, observed) in [(KEY_COLUMNS, observed_columns), (KEY_ROWS, observed_rows)] {
        let Some(raw) = header.metadata.get(key) else {
            continue;
        };
        match raw.parse::<usize>() {
            Ok(declared) if declared == observed => {}
            Ok(declared) => warnings.push(format!(
                "Declared {key} = {declared} but DATA section has {observed}"
            )),
            Err(_) => warnings.push(format!("Declared {key} '{raw}' is not a count")),
        }
    }
    warnings
}
