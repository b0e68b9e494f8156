pub mod cli;
pub mod config;
pub mod datetime;
pub mod enrich;
pub mod error;
pub mod icsv;
pub mod infer;
pub mod io_utils;
pub mod metadata;
pub mod missing;
pub mod report;
pub mod schema;
pub mod sniff;
pub mod table;
pub mod validate;
pub mod validator;

use std::{env, path::PathBuf, sync::OnceLock};

use anyhow::{Result, anyhow};
use clap::Parser;
use log::{LevelFilter, debug, info, warn};

use crate::{
    cli::Cli,
    config::DevoConfig,
    datetime::DateParserKind,
    enrich::{EnrichOptions, make_icsv_from_csv},
    error::DevoError,
    schema::ValidationSchema,
    validate::{ValidateOptions, ValidationOutcome, validate_icsv},
    validator::BuiltinValidator,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("devo", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    execute(&cli).map(|_| ())
}

/// Runs the pipeline selected by the input extension: `.csv` is enriched and
/// then validated, `.icsv` is validated only.
pub fn execute(cli: &Cli) -> Result<ValidationOutcome> {
    let config = config::load_config(cli.config.as_deref())?;
    let input = &cli.infile;
    if !input.exists() {
        return Err(DevoError::NotFound(input.clone()).into());
    }
    let dates = date_parser_kind(cli, &config).build();
    debug!("Using {} date parser", dates.kind());

    let target: PathBuf = if io_utils::has_extension(input, "csv") {
        let options = enrich_options(cli, &config)?;
        info!("Enriching CSV {input:?}");
        let outcome = make_icsv_from_csv(input, &options).map_err(DevoError::Enrichment)?;
        info!("iCSV written: {:?}", outcome.icsv_path);
        info!("Schema written: {:?}", outcome.schema_path);
        outcome.icsv_path
    } else if io_utils::has_extension(input, "icsv") {
        input.clone()
    } else {
        return Err(DevoError::UnsupportedExtension(input.clone()).into());
    };

    let schema = match &cli.schema {
        Some(path) => Some(ValidationSchema::load(path).map_err(DevoError::Validation)?),
        None => None,
    };
    let options = ValidateOptions {
        schema,
        missing: config.missing_values(),
        data_report: None,
    };
    let validator = BuiltinValidator::new(dates.as_ref());
    info!("Validating iCSV {target:?}");
    let outcome = validate_icsv(&target, &options, &validator).map_err(DevoError::Validation)?;
    if outcome.valid {
        info!("Validation passed. Report: {:?}", outcome.data_report);
    } else {
        warn!("Validation found issues. See: {:?}", outcome.data_report);
        info!("Metadata report: {:?}", outcome.metadata_report);
    }
    Ok(outcome)
}

fn enrich_options(cli: &Cli, config: &DevoConfig) -> Result<EnrichOptions> {
    let configured_delimiter = config
        .field_delimiter
        .as_deref()
        .map(cli::parse_delimiter)
        .transpose()
        .map_err(|err| anyhow!("Invalid field_delimiter in config: {err}"))?;
    Ok(EnrichOptions {
        out_icsv: cli.out.clone().or_else(|| config.out_icsv.clone()),
        schema_out: cli.schema_out.clone().or_else(|| config.schema_out.clone()),
        delimiter: cli.delimiter.or(configured_delimiter),
        nodata: cli.nodata.clone().or_else(|| config.nodata.clone()),
        application_profile: cli
            .application_profile
            .clone()
            .or_else(|| config.application_profile.clone()),
        input_encoding: cli
            .input_encoding
            .clone()
            .or_else(|| config.input_encoding.clone()),
        missing: config.missing_values(),
        date_parser: date_parser_kind(cli, config),
    })
}

/// One date parser choice drives both inference and validation.
fn date_parser_kind(cli: &Cli, config: &DevoConfig) -> DateParserKind {
    cli.date_parser.or(config.date_parser).unwrap_or_default()
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("devo").chain(args.iter().copied()))
            .expect("parse args")
    }

    #[test]
    fn flags_override_config() {
        let config = DevoConfig {
            nodata: Some("-999".into()),
            field_delimiter: Some("tab".into()),
            application_profile: Some("from-config".into()),
            ..DevoConfig::default()
        };
        let options =
            enrich_options(&cli(&["obs.csv", "--nodata", "NA"]), &config).expect("options");
        assert_eq!(options.nodata.as_deref(), Some("NA"));
        assert_eq!(options.delimiter, Some(b'\t'));
        assert_eq!(options.application_profile.as_deref(), Some("from-config"));
    }

    #[test]
    fn bad_configured_delimiter_is_an_error() {
        let config = DevoConfig {
            field_delimiter: Some("::".into()),
            ..DevoConfig::default()
        };
        assert!(enrich_options(&cli(&["obs.csv"]), &config).is_err());
    }

    #[test]
    fn date_parser_flag_wins_over_config() {
        let config = DevoConfig {
            date_parser: Some(DateParserKind::Fixed),
            ..DevoConfig::default()
        };
        assert_eq!(
            date_parser_kind(&cli(&["obs.csv"]), &config),
            DateParserKind::Fixed
        );
        let flagged = cli(&["obs.csv", "--date-parser", "flexible"]);
        assert_eq!(date_parser_kind(&flagged, &config), DateParserKind::Flexible);
        assert_eq!(
            enrich_options(&flagged, &config).expect("options").date_parser,
            DateParserKind::Flexible
        );
        assert_eq!(
            date_parser_kind(&flagged, &config).build().kind(),
            DateParserKind::Flexible
        );
    }

    #[test]
    fn printable_delimiter_escapes_whitespace() {
        assert_eq!(printable_delimiter(b'\t'), "\\t");
        assert_eq!(printable_delimiter(b'|'), "|");
    }
}
