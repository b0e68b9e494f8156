use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use log::{debug, info};

use crate::{
    datetime::DateParserKind,
    icsv::{IcsvWriter, write_icsv},
    infer::{ColumnProfile, profile_column},
    io_utils,
    metadata::{self, MetadataBlock},
    missing::MissingValues,
    printable_delimiter,
    schema::ValidationSchema,
    sniff, table,
};

/// Resolved settings for one CSV to iCSV conversion.
#[derive(Debug, Clone, Default)]
pub struct EnrichOptions {
    /// Defaults to the input path with an `.icsv` extension.
    pub out_icsv: Option<PathBuf>,
    /// Defaults to `<stem>_schema.json` beside the input.
    pub schema_out: Option<PathBuf>,
    /// Skips sniffing when set.
    pub delimiter: Option<u8>,
    pub nodata: Option<String>,
    pub application_profile: Option<String>,
    pub input_encoding: Option<String>,
    pub missing: MissingValues,
    pub date_parser: DateParserKind,
}

#[derive(Debug, Clone)]
pub struct EnrichOutcome {
    pub icsv_path: PathBuf,
    pub schema_path: PathBuf,
    pub delimiter: u8,
    pub nodata: String,
    pub profiles: Vec<ColumnProfile>,
}

pub fn default_icsv_path(input: &Path) -> PathBuf {
    input.with_extension("icsv")
}

pub fn default_schema_path(input: &Path) -> PathBuf {
    io_utils::sibling_path(input, "_schema.json")
}

/// Converts a delimited text file into an iCSV file plus a JSON schema
/// document describing every column.
pub fn make_icsv_from_csv(input: &Path, options: &EnrichOptions) -> Result<EnrichOutcome> {
    let icsv_path = options
        .out_icsv
        .clone()
        .unwrap_or_else(|| default_icsv_path(input));
    let schema_path = options
        .schema_out
        .clone()
        .unwrap_or_else(|| default_schema_path(input));
    let encoding = io_utils::resolve_encoding(options.input_encoding.as_deref())?;
    let dates = options.date_parser.build();

    let loaded = table::load_table(input, options.delimiter, encoding, &options.missing)
        .with_context(|| format!("Loading {input:?}"))?;
    let delimiter = sniff::output_delimiter(loaded.delimiter);
    debug!(
        "Input delimiter '{}', iCSV delimiter '{}'",
        printable_delimiter(loaded.delimiter),
        printable_delimiter(delimiter)
    );
    let nodata = options
        .nodata
        .clone()
        .or(loaded.observed_nodata)
        .unwrap_or_default();
    let table = loaded.table;

    let profiles = table
        .header
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            profile_column(name, &table.column(idx), &options.missing, dates.as_ref())
        })
        .collect::<Vec<_>>();

    let block = MetadataBlock {
        application_profile: options.application_profile.clone(),
        field_delimiter: delimiter,
        rows: table.row_count(),
        columns: table.column_count(),
        created: Utc::now().naive_utc(),
        nodata: nodata.clone(),
        geometry: metadata::detect_geometry_hint(&table.header),
        generator: metadata::default_generator(),
    };
    let metadata_lines = block.lines();
    let fields_lines = metadata::fields_lines(&profiles, delimiter);
    let writer = IcsvWriter {
        metadata_lines: &metadata_lines,
        fields_lines: &fields_lines,
        delimiter,
    };
    write_icsv(&icsv_path, &writer, &table)?;
    info!(
        "iCSV written to {:?} ({} row(s), {} column(s))",
        icsv_path,
        table.row_count(),
        table.column_count()
    );

    ValidationSchema::from_profiles(&profiles, &options.missing)
        .save(&schema_path)
        .with_context(|| format!("Writing schema to {schema_path:?}"))?;
    info!("Schema written to {schema_path:?}");

    Ok(EnrichOutcome {
        icsv_path,
        schema_path,
        delimiter,
        nodata,
        profiles,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{icsv::parse_header, infer::ColumnType};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn default_paths_sit_beside_the_input() {
        let input = Path::new("/data/station.csv");
        assert_eq!(default_icsv_path(input), PathBuf::from("/data/station.icsv"));
        assert_eq!(
            default_schema_path(input),
            PathBuf::from("/data/station_schema.json")
        );
    }

    #[test]
    fn comma_input_becomes_pipe_delimited() {
        let dir = tempdir().expect("temp dir");
        let input = dir.path().join("obs.csv");
        fs::write(&input, "timestamp,ta,rh\n2020-01-01T00:00:00,1.5,80\n2020-01-01T01:00:00,NA,82\n")
            .expect("write input");

        let outcome = make_icsv_from_csv(&input, &EnrichOptions::default()).expect("enrich");
        assert_eq!(outcome.delimiter, b'|');
        assert_eq!(outcome.nodata, "NA");
        let types = outcome
            .profiles
            .iter()
            .map(|p| p.column_type)
            .collect::<Vec<_>>();
        assert_eq!(
            types,
            vec![ColumnType::Datetime, ColumnType::Number, ColumnType::Integer]
        );

        let text = fs::read_to_string(&outcome.icsv_path).expect("read icsv");
        let header = parse_header(&text);
        assert_eq!(header.metadata["field_delimiter"], "|");
        assert_eq!(header.metadata["nodata"], "NA");
        assert_eq!(header.fields["fields"], vec!["timestamp", "ta", "rh"]);
        assert!(text.ends_with("timestamp|ta|rh\n2020-01-01T00:00:00|1.5|80\n2020-01-01T01:00:00|NA|82\n"));
        assert!(outcome.schema_path.exists());
    }

    #[test]
    fn overrides_take_precedence() {
        let dir = tempdir().expect("temp dir");
        let input = dir.path().join("obs.csv");
        fs::write(&input, "a;b\n1;x\n").expect("write input");
        let options = EnrichOptions {
            out_icsv: Some(dir.path().join("custom.icsv")),
            delimiter: Some(b';'),
            nodata: Some("-999".into()),
            application_profile: Some("ACDD".into()),
            ..EnrichOptions::default()
        };

        let outcome = make_icsv_from_csv(&input, &options).expect("enrich");
        assert_eq!(outcome.icsv_path, dir.path().join("custom.icsv"));
        assert_eq!(outcome.delimiter, b';');
        let text = fs::read_to_string(&outcome.icsv_path).expect("read icsv");
        let header = parse_header(&text);
        assert_eq!(header.metadata["nodata"], "-999");
        assert_eq!(header.metadata["application_profile"], "ACDD");
    }
}
