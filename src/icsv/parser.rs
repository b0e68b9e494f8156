//! Two-phase parse of the METADATA and FIELDS blocks.
//!
//! The delimiter used inside FIELDS lists is itself declared in METADATA, so
//! FIELDS values are first split on a literal `|` as a bootstrap. Once the
//! header is read, every bootstrap list is rejoined with `|` and split again on
//! the declared `field_delimiter`. Without a usable declaration the bootstrap
//! split is kept and the metadata gate reports the missing delimiter.

use log::debug;

use super::{
    DATA_MARKER, FIELDS_MARKER, FieldLists, KEY_FIELD_DELIMITER, METADATA_MARKER, MetadataMap,
};

const BOOTSTRAP_DELIMITER: &str = "|";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Metadata,
    Fields,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedHeader {
    pub metadata: MetadataMap,
    pub fields: FieldLists,
}

impl ParsedHeader {
    pub fn field_delimiter(&self) -> Option<&str> {
        self.metadata
            .get(KEY_FIELD_DELIMITER)
            .map(String::as_str)
            .filter(|d| !d.is_empty())
    }

    /// The declared delimiter as a single byte, when it is one ASCII char.
    pub fn delimiter_byte(&self) -> Option<u8> {
        let declared = self.field_delimiter()?;
        match declared.as_bytes() {
            [byte] if byte.is_ascii() => Some(*byte),
            _ => None,
        }
    }
}

/// Reads the METADATA and FIELDS blocks of `text`, stopping at `# [DATA]`.
pub fn parse_header(text: &str) -> ParsedHeader {
    let mut metadata = MetadataMap::new();
    let mut bootstrap = FieldLists::new();
    let mut section: Option<Section> = None;

    for line in text.lines() {
        let marker = line.trim();
        if marker == METADATA_MARKER {
            section = Some(Section::Metadata);
            continue;
        }
        if marker == FIELDS_MARKER {
            section = Some(Section::Fields);
            continue;
        }
        if marker == DATA_MARKER {
            break;
        }
        let Some(current) = section else {
            continue;
        };
        if !line.starts_with('#') {
            continue;
        }
        let content = trim_value(line.trim_start_matches('#'));
        let Some((key, value)) = content.split_once('=') else {
            continue;
        };
        let key = trim_value(key).to_string();
        let value = trim_value(value);
        match current {
            Section::Metadata => {
                metadata.insert(key, value.to_string());
            }
            Section::Fields => {
                bootstrap.insert(key, split_list(value, BOOTSTRAP_DELIMITER));
            }
        }
    }

    let fields = match metadata
        .get(KEY_FIELD_DELIMITER)
        .map(String::as_str)
        .filter(|d| !d.is_empty())
    {
        Some(delimiter) => resplit(bootstrap, delimiter),
        None => {
            debug!("No field_delimiter declared; FIELDS lists stay split on '|'");
            bootstrap
        }
    };
    ParsedHeader { metadata, fields }
}

fn resplit(bootstrap: FieldLists, delimiter: &str) -> FieldLists {
    bootstrap
        .into_iter()
        .map(|(key, values)| {
            let joined = values.join(BOOTSTRAP_DELIMITER);
            (key, split_list(&joined, delimiter))
        })
        .collect()
}

fn split_list(value: &str, delimiter: &str) -> Vec<String> {
    value
        .split(delimiter)
        .map(|part| trim_value(part).to_string())
        .collect()
}

/// Trims spaces and line-ending characters, leaving tabs intact so that a tab
/// delimiter survives.
fn trim_value(value: &str) -> &str {
    value.trim_matches([' ', '\r', '\n'])
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "# iCSV 1.0 UTF-8\n\
        # [METADATA]\n\
        # iCSV_version = 1.0\n\
        # field_delimiter = ;\n\
        # rows = 2\n\
        # columns = 2\n\
        \n\
        # [FIELDS]\n\
        # fields = a;b\n\
        # types = integer;string\n\
        # min = 1;\n\
        # description = x|y;z\n\
        \n\
        # [DATA]\n\
        # fields = ignored\n\
        a;b\n";

    #[test]
    fn metadata_values_are_trimmed() {
        let parsed = parse_header(SAMPLE);
        assert_eq!(parsed.metadata["field_delimiter"], ";");
        assert_eq!(parsed.metadata["rows"], "2");
        assert_eq!(parsed.delimiter_byte(), Some(b';'));
    }

    #[test]
    fn fields_are_resplit_on_declared_delimiter() {
        let parsed = parse_header(SAMPLE);
        assert_eq!(parsed.fields["fields"], vec!["a", "b"]);
        assert_eq!(parsed.fields["min"], vec!["1", ""]);
        assert_eq!(parsed.fields["description"], vec!["x|y", "z"]);
    }

    #[test]
    fn scanning_stops_at_data_marker() {
        let parsed = parse_header(SAMPLE);
        assert_eq!(parsed.fields.len(), 4);
        assert_eq!(parsed.fields["fields"], vec!["a", "b"]);
    }

    #[test]
    fn missing_delimiter_keeps_bootstrap_split() {
        let text = "# [METADATA]\n# rows = 1\n# [FIELDS]\n# fields = a|b;c\n# [DATA]\n";
        let parsed = parse_header(text);
        assert!(parsed.field_delimiter().is_none());
        assert_eq!(parsed.fields["fields"], vec!["a", "b;c"]);
    }

    #[test]
    fn duplicate_keys_keep_last_value() {
        let text = "# [METADATA]\n# rows = 1\n# rows = 5\n";
        assert_eq!(parse_header(text).metadata["rows"], "5");
    }

    #[test]
    fn tab_delimiter_survives_trimming() {
        let text = "# [METADATA]\n# field_delimiter = \t\n# [FIELDS]\n# fields = a\tb\n";
        let parsed = parse_header(text);
        assert_eq!(parsed.delimiter_byte(), Some(b'\t'));
        assert_eq!(parsed.fields["fields"], vec!["a", "b"]);
    }

    #[test]
    fn lines_before_any_block_are_ignored() {
        let text = "# rows = 3\n# [METADATA]\n# columns = 1\n";
        let parsed = parse_header(text);
        assert!(!parsed.metadata.contains_key("rows"));
        assert_eq!(parsed.metadata["columns"], "1");
    }

    #[test]
    fn parsing_is_idempotent() {
        assert_eq!(parse_header(SAMPLE), parse_header(SAMPLE));
    }
}
