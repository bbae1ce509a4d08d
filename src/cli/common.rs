//! Common CLI types shared across commands

use clap::ValueEnum;
use std::collections::BTreeMap;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table (default)
    Table,
    /// JSON array
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Endpoint settings given as `key=value,key=value`
pub type EndpointOptions = BTreeMap<String, String>;

/// Parse `key=value,key=value` endpoint settings.
///
/// An empty string yields an empty map; keys must be non-empty and unique.
pub fn parse_endpoint_options(value: &str) -> Result<EndpointOptions, String> {
    let mut options = EndpointOptions::new();
    for pair in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (key, val) = pair
            .split_once('=')
            .ok_or_else(|| format!("expected key=value, got {:?}", pair))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(format!("missing key in {:?}", pair));
        }
        if options.insert(key.to_string(), val.trim().to_string()).is_some() {
            return Err(format!("duplicate key {:?}", key));
        }
    }
    Ok(options)
}
