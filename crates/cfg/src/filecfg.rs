//! Layering a TOML config file underneath flags and environment variables.
//!
//! Every config struct in this crate derives [`clap::Parser`], so flags and
//! `env = "..."` variables are handled by `clap` directly. This module adds
//! the third, lowest-priority layer: `--config <path>` points at a TOML file
//! whose keys only take effect for fields clap resolved from their built-in
//! default, never for ones a flag or environment variable actually set.

use camino::Utf8Path;
use clap::parser::ValueSource;
use clap::{CommandFactory, FromArgMatches, Parser};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Parse `C` from the command line and environment, then overlay any TOML
/// file named by its `--config` flag onto fields that took their default.
pub fn load<C>(config_path: impl Fn(&C) -> Option<&Utf8Path>) -> Result<C, String>
where
    C: Parser + CommandFactory + FromArgMatches + Serialize + DeserializeOwned,
{
    let matches = C::command().get_matches();
    let cli = C::from_arg_matches(&matches).map_err(|e| e.to_string())?;

    let Some(path) = config_path(&cli) else {
        return Ok(cli);
    };

    let text = std::fs::read_to_string(path).map_err(|e| format!("reading {path}: {e}"))?;
    let file: toml::Value = toml::from_str(&text).map_err(|e| format!("parsing {path}: {e}"))?;
    let toml::Value::Table(file_table) = file else {
        return Err(format!("{path}: expected a TOML table at the top level"));
    };

    let mut merged = serde_json::to_value(&cli).map_err(|e| e.to_string())?;
    let Some(merged_obj) = merged.as_object_mut() else {
        return Ok(cli);
    };

    for (key, value) in file_table {
        let came_from_default = matches
            .value_source(&key)
            .map(|source| source == ValueSource::DefaultValue)
            .unwrap_or(true);
        if !came_from_default {
            continue;
        }
        if let Ok(json_value) = serde_json::to_value(&value) {
            merged_obj.insert(key, json_value);
        }
    }

    serde_json::from_value(merged).map_err(|e| format!("applying {path}: {e}"))
}
