//! Assembly of the METADATA and FIELDS blocks of an iCSV file.

use chrono::NaiveDateTime;
use itertools::Itertools;

use crate::{icsv::ICSV_VERSION, infer::ColumnProfile, schema::ConstraintValue};

pub const WGS84_SRID: &str = "EPSG:4326";

/// Column-based geometry hint found in a header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeometryHint {
    pub geometry: String,
    pub srid: Option<String>,
}

/// Looks for a `geometry` column, or else a latitude/longitude pair.
///
/// Matching is case-insensitive. When several latitude or longitude columns
/// exist the last of each wins.
pub fn detect_geometry_hint(header: &[String]) -> Option<GeometryHint> {
    if let Some(name) = header
        .iter()
        .find(|name| name.eq_ignore_ascii_case("geometry"))
    {
        return Some(GeometryHint {
            geometry: format!("column:{name}"),
            srid: None,
        });
    }
    let mut lat = None;
    let mut lon = None;
    for name in header {
        match name.to_lowercase().as_str() {
            "lat" | "latitude" => lat = Some(name),
            "lon" | "lng" | "longitude" => lon = Some(name),
            _ => {}
        }
    }
    match (lat, lon) {
        (Some(lat), Some(lon)) => Some(GeometryHint {
            geometry: format!("column:{lat},{lon}"),
            srid: Some(WGS84_SRID.to_string()),
        }),
        _ => None,
    }
}

/// File-level facts written into the METADATA block.
#[derive(Debug, Clone)]
pub struct MetadataBlock {
    pub application_profile: Option<String>,
    pub field_delimiter: u8,
    pub rows: usize,
    pub columns: usize,
    pub created: NaiveDateTime,
    pub nodata: String,
    pub geometry: Option<GeometryHint>,
    pub generator: String,
}

impl MetadataBlock {
    /// `key = value` lines in their fixed order. Optional entries are left
    /// out when absent or empty.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![format!("iCSV_version = {ICSV_VERSION}")];
        if let Some(profile) = self.application_profile.as_deref().filter(|p| !p.is_empty()) {
            lines.push(format!("application_profile = {profile}"));
        }
        lines.push(format!(
            "field_delimiter = {}",
            self.field_delimiter as char
        ));
        lines.push(format!("rows = {}", self.rows));
        lines.push(format!("columns = {}", self.columns));
        lines.push(format!(
            "creation_date = {}Z",
            self.created.format("%Y-%m-%dT%H:%M:%S%.6f")
        ));
        if !self.nodata.is_empty() {
            lines.push(format!("nodata = {}", self.nodata));
        }
        if let Some(hint) = &self.geometry {
            lines.push(format!("geometry = {}", hint.geometry));
            if let Some(srid) = &hint.srid {
                lines.push(format!("srid = {srid}"));
            }
        }
        lines.push(format!("generator = {}", self.generator));
        lines
    }
}

pub fn default_generator() -> String {
    format!("devo {}", env!("CARGO_PKG_VERSION"))
}

/// FIELDS block lines: one delimiter-joined list per key, in header order.
pub fn fields_lines(profiles: &[ColumnProfile], delimiter: u8) -> Vec<String> {
    let separator = (delimiter as char).to_string();
    let join = |values: Vec<String>| values.iter().join(&separator);
    let render = |value: &Option<ConstraintValue>| {
        value.as_ref().map(ToString::to_string).unwrap_or_default()
    };
    vec![
        format!(
            "fields = {}",
            join(profiles.iter().map(|p| p.name.clone()).collect())
        ),
        format!(
            "types = {}",
            join(
                profiles
                    .iter()
                    .map(|p| p.column_type.to_string())
                    .collect()
            )
        ),
        format!(
            "min = {}",
            join(profiles.iter().map(|p| render(&p.min)).collect())
        ),
        format!(
            "max = {}",
            join(profiles.iter().map(|p| render(&p.max)).collect())
        ),
        format!(
            "missing_count = {}",
            join(
                profiles
                    .iter()
                    .map(|p| p.missing_count.to_string())
                    .collect()
            )
        ),
        format!(
            "description = {}",
            join(profiles.iter().map(|p| p.description.clone()).collect())
        ),
    ]
}
