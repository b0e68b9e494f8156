//! The iCSV text layout: a signature line, a commented METADATA block, a
//! commented FIELDS block and a DATA block.
//!
//! ```text
//! # iCSV 1.0 UTF-8
//! # [METADATA]
//! # field_delimiter = |
//! # ...
//!
//! # [FIELDS]
//! # fields = timestamp|ta
//! # ...
//!
//! # [DATA]
//! timestamp|ta
//! 2020-01-01T00:00:00|10
//! ```
//!
//! The block markers and line order are the contract between the writer and
//! the parser; the two sides share nothing else.

pub mod check;
pub mod data;
pub mod parser;
pub mod writer;

use std::collections::BTreeMap;

pub use check::{MetadataError, check_metadata, declared_shape_warnings};
pub use data::{DataSection, read_data_section};
pub use parser::{ParsedHeader, parse_header};
pub use writer::{IcsvWriter, write_icsv};

pub const ICSV_VERSION: &str = "1.0";
pub const SIGNATURE_LINE: &str = "# iCSV 1.0 UTF-8";
pub const METADATA_MARKER: &str = "# [METADATA]";
pub const FIELDS_MARKER: &str = "# [FIELDS]";
pub const DATA_MARKER: &str = "# [DATA]";

pub const KEY_FIELD_DELIMITER: &str = "field_delimiter";
pub const KEY_ROWS: &str = "rows";
pub const KEY_COLUMNS: &str = "columns";
pub const KEY_FIELDS: &str = "fields";

/// METADATA entries keyed by name.
pub type MetadataMap = BTreeMap<String, String>;

/// FIELDS entries: each key maps to one value per column.
pub type FieldLists = BTreeMap<String, Vec<String>>;
