use std::path::PathBuf;

use clap::Parser;

use crate::datetime::DateParserKind;

#[derive(Debug, Parser)]
#[command(
    name = "devo",
    author,
    version,
    about = "DEVO: Data Enrichment and Validation Operator",
    long_about = None
)]
pub struct Cli {
    /// Input CSV or iCSV file
    pub infile: PathBuf,
    /// Path to a config file (YAML or JSON)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,
    /// Force the input delimiter (autodetected otherwise)
    #[arg(short = 'd', long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Force the nodata placeholder value
    #[arg(long, allow_hyphen_values = true)]
    pub nodata: Option<String>,
    /// Application profile recorded in the iCSV metadata
    #[arg(long = "app")]
    pub application_profile: Option<String>,
    /// Output iCSV path (CSV input only)
    #[arg(short = 'o', long = "out")]
    pub out: Option<PathBuf>,
    /// Path for the inferred schema JSON (CSV input only)
    #[arg(long = "schema-out")]
    pub schema_out: Option<PathBuf>,
    /// Validate against this schema JSON instead of the FIELDS block
    #[arg(long)]
    pub schema: Option<PathBuf>,
    /// Date recognition strategy used for inference and validation
    #[arg(long = "date-parser", value_enum)]
    pub date_parser: Option<DateParserKind>,
    /// Character encoding of the input CSV (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        ":" | "colon" => Ok(b':'),
        "/" | "slash" => Ok(b'/'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
