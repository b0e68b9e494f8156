//! In-memory materialization of a plain delimited table.

use std::{collections::HashMap, path::Path};

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use log::debug;

use crate::{
    io_utils,
    missing::MissingValues,
    sniff::{self, SNIFF_SAMPLE_LINES},
};

/// Header plus rows, every row holding exactly `header.len()` cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// A table as read from disk together with the facts gathered while reading.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub table: RawTable,
    pub delimiter: u8,
    /// Most frequent missing-value token among the cells as read, if any.
    pub observed_nodata: Option<String>,
}

impl RawTable {
    /// Builds a table from raw records, padding short rows and truncating long
    /// ones to the header width. Header names are trimmed.
    pub fn from_records(header: Vec<String>, records: Vec<Vec<String>>) -> Self {
        let header = header
            .into_iter()
            .map(|name| name.trim().to_string())
            .collect::<Vec<_>>();
        let width = header.len();
        let rows = records
            .into_iter()
            .map(|row| io_utils::fit_row(row, width))
            .collect();
        Self { header, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.header.len()
    }

    pub fn column(&self, index: usize) -> Vec<&str> {
        self.rows
            .iter()
            .map(|row| row.get(index).map(String::as_str).unwrap_or_default())
            .collect()
    }
}

/// Reads `text` as a delimited table; the first record is the header.
pub fn parse_table(
    text: &str,
    delimiter: u8,
    missing: &MissingValues,
) -> Result<(RawTable, Option<String>)> {
    let mut reader = io_utils::open_csv_reader(text.as_bytes(), delimiter, false);
    let mut records = reader.records();
    let header = match records.next() {
        Some(record) => record
            .context("Reading header row")?
            .iter()
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
    };
    let mut rows = Vec::new();
    for (idx, record) in records.enumerate() {
        let record = record.with_context(|| format!("Reading row {}", idx + 2))?;
        rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }
    let observed_nodata = most_frequent_missing_token(&rows, missing);
    Ok((RawTable::from_records(header, rows), observed_nodata))
}

pub fn load_table(
    path: &Path,
    delimiter: Option<u8>,
    encoding: &'static Encoding,
    missing: &MissingValues,
) -> Result<LoadedTable> {
    let text = io_utils::read_text(path, encoding)?;
    let delimiter = delimiter.unwrap_or_else(|| {
        let detected = sniff::detect_delimiter(sniff::sample_lines(&text, SNIFF_SAMPLE_LINES));
        debug!(
            "Detected delimiter '{}' for {path:?}",
            crate::printable_delimiter(detected)
        );
        detected
    });
    let (table, observed_nodata) = parse_table(&text, delimiter, missing)
        .with_context(|| format!("Parsing delimited table {path:?}"))?;
    Ok(LoadedTable {
        table,
        delimiter,
        observed_nodata,
    })
}

/// Counts cells equal to a missing token, exactly as written, and returns the
/// most frequent one. Ties go to the token encountered first.
pub fn most_frequent_missing_token(
    rows: &[Vec<String>],
    missing: &MissingValues,
) -> Option<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut first_seen: Vec<&str> = Vec::new();
    for cell in rows.iter().flatten() {
        if !missing.contains(cell) {
            continue;
        }
        let count = counts.entry(cell.as_str()).or_insert(0);
        if *count == 0 {
            first_seen.push(cell.as_str());
        }
        *count += 1;
    }
    let mut best: Option<(&str, usize)> = None;
    for token in first_seen {
        let count = counts[token];
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((token, count));
        }
    }
    best.map(|(token, _)| token.to_string())
}
