//! I/O helpers for reading input tables and writing delimited output.
//!
//! Input CSV files are read fully into memory and decoded with `encoding_rs`
//! (UTF-8 unless told otherwise). Undecodable byte sequences are replaced
//! instead of aborting the run. Everything written by this crate is UTF-8.

use std::{
    fs,
    io::{Read, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use csv::{QuoteStyle, Terminator};
use encoding_rs::{Encoding, UTF_8};
use log::warn;

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

/// Decodes `bytes`, substituting replacement characters for malformed input.
pub fn decode_lossy(bytes: &[u8], encoding: &'static Encoding) -> String {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        warn!(
            "Input contained byte sequences invalid for {}; they were replaced",
            encoding.name()
        );
    }
    text.into_owned()
}

pub fn read_text(path: &Path, encoding: &'static Encoding) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("Opening input file {path:?}"))?;
    Ok(decode_lossy(&bytes, encoding))
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8, has_headers: bool) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(has_headers)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

pub fn open_csv_writer<W>(writer: W, delimiter: u8) -> csv::Writer<W>
where
    W: Write,
{
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Necessary)
        .double_quote(true)
        .terminator(Terminator::Any(b'\n'));
    builder.from_writer(writer)
}

/// Splits a single line on `delimiter`, keeping delimiters inside quoted
/// cells.
pub fn split_line(line: &str, delimiter: u8) -> Result<Vec<String>> {
    let mut reader = open_csv_reader(line.as_bytes(), delimiter, false);
    match reader.records().next() {
        Some(record) => Ok(record
            .context("Splitting delimited line")?
            .iter()
            .map(str::to_string)
            .collect()),
        None => Ok(Vec::new()),
    }
}

/// Pads `row` with empty cells or truncates it to exactly `width` cells.
pub fn fit_row(mut row: Vec<String>, width: usize) -> Vec<String> {
    row.resize(width, String::new());
    row
}

/// `<dir>/<stem><suffix>` for the given input path.
pub fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{stem}{suffix}"))
}

pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::WINDOWS_1252;

    #[test]
    fn split_line_respects_quotes() {
        let cells = split_line("a|\"b|c\"|d", b'|').expect("split");
        assert_eq!(cells, vec!["a", "b|c", "d"]);
    }

    #[test]
    fn split_line_keeps_empty_cells() {
        let cells = split_line("1;;3;", b';').expect("split");
        assert_eq!(cells, vec!["1", "", "3", ""]);
    }

    #[test]
    fn fit_row_pads_and_truncates() {
        let short = fit_row(vec!["a".into()], 3);
        assert_eq!(short, vec!["a", "", ""]);
        let long = fit_row(vec!["a".into(), "b".into(), "c".into()], 2);
        assert_eq!(long, vec!["a", "b"]);
    }

    #[test]
    fn sibling_paths_share_the_stem() {
        let path = Path::new("/data/station.icsv");
        assert_eq!(
            sibling_path(path, "_data_report.txt"),
            PathBuf::from("/data/station_data_report.txt")
        );
        assert_eq!(
            sibling_path(Path::new("station.csv"), ".icsv"),
            PathBuf::from("station.icsv")
        );
    }

    #[test]
    fn extensions_match_case_insensitively() {
        assert!(has_extension(Path::new("a.CSV"), "csv"));
        assert!(!has_extension(Path::new("a.tsv"), "csv"));
        assert!(!has_extension(Path::new("a"), "csv"));
    }

    #[test]
    fn lossy_decode_honors_encoding() {
        let (encoded, _, _) = WINDOWS_1252.encode("Caf\u{e9}");
        assert_eq!(decode_lossy(&encoded, WINDOWS_1252), "Caf\u{e9}");
        assert_eq!(decode_lossy(&[0x66, 0xff], UTF_8), "f\u{fffd}");
    }

    #[test]
    fn unknown_encoding_is_rejected() {
        assert!(resolve_encoding(Some("klingon")).is_err());
        assert_eq!(resolve_encoding(None).unwrap(), UTF_8);
    }

    #[test]
    fn writer_quotes_only_when_needed() {
        let mut writer = open_csv_writer(Vec::new(), b'|');
        writer.write_record(["a", "b|c", ""]).unwrap();
        let bytes = writer.into_inner().unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "a|\"b|c\"|\n");
    }
}
