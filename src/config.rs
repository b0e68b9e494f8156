//! Optional YAML or JSON run configuration.
//!
//! Every key is optional; command-line flags win over configured values.

use std::{fs, path::Path, path::PathBuf};

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::Deserialize;

use crate::{datetime::DateParserKind, missing::MissingValues};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DevoConfig {
    pub out_icsv: Option<PathBuf>,
    pub schema_out: Option<PathBuf>,
    pub field_delimiter: Option<String>,
    pub nodata: Option<String>,
    pub application_profile: Option<String>,
    pub input_encoding: Option<String>,
    pub date_parser: Option<DateParserKind>,
    pub missing_values: Option<Vec<String>>,
}

impl DevoConfig {
    pub fn missing_values(&self) -> MissingValues {
        match &self.missing_values {
            Some(tokens) => MissingValues::new(tokens.iter().cloned()),
            None => MissingValues::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Yaml,
    Json,
}

fn detect_format(path: &Path) -> Option<ConfigFormat> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "yml" | "yaml" => Some(ConfigFormat::Yaml),
        "json" => Some(ConfigFormat::Json),
        _ => None,
    }
}

/// Loads the configuration at `path`.
///
/// No path, a path that does not exist, or an unrecognized extension yield the
/// defaults. A file that exists but fails to parse is an error.
pub fn load_config(path: Option<&Path>) -> Result<DevoConfig> {
    let Some(path) = path else {
        return Ok(DevoConfig::default());
    };
    if !path.exists() {
        warn!("Config file {path:?} not found; using defaults");
        return Ok(DevoConfig::default());
    }
    let Some(format) = detect_format(path) else {
        warn!("Config file {path:?} is neither YAML nor JSON; using defaults");
        return Ok(DevoConfig::default());
    };
    let raw =
        fs::read_to_string(path).with_context(|| format!("Reading config file {path:?}"))?;
    if raw.trim().is_empty() {
        return Ok(DevoConfig::default());
    }
    let config: DevoConfig = match format {
        ConfigFormat::Yaml => serde_yaml::from_str(&raw)
            .with_context(|| format!("Parsing YAML config {path:?}"))?,
        ConfigFormat::Json => serde_json::from_str(&raw)
            .with_context(|| format!("Parsing JSON config {path:?}"))?,
    };
    debug!("Loaded config from {path:?}: {config:?}");
    Ok(config)
}
