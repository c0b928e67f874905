//! Helpers shared by commands.

use std::path::Path;

use anyhow::Context;
use loudnorm_config::{Settings, settings_path};

/// Settings from `path` if given (the file must exist), otherwise from the
/// user config directory, falling back to defaults.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    match path {
        Some(path) => Settings::load(path)
            .with_context(|| format!("loading settings from {}", path.display())),
        None => Ok(Settings::load_or_default(settings_path())?),
    }
}

/// Parses a decibel value, accepting a leading minus sign.
pub fn parse_db(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .trim()
        .trim_end_matches("dB")
        .trim_end_matches("db")
        .trim()
        .parse()
        .map_err(|_| format!("invalid dB value: '{s}'"))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("dB value must be finite: '{s}'"))
    }
}
