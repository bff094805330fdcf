//! Configuration management.
//!
//! Settings live in `config/*.toml`: the worker executable/script paths and
//! the persisted defaults for the measurement entry fields.

use crate::error::MeasurementError;
use config::Config;
use serde::Deserialize;
use std::path::PathBuf;

/// Application settings loaded from a TOML file.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Default tracing filter (e.g. `info`).
    pub log_level: String,
    /// Worker process location.
    pub worker: WorkerSettings,
    /// Persisted defaults for the measurement parameters.
    #[serde(default)]
    pub defaults: ParamDefaults,
}

/// Paths of the worker executable and the measurement script.
#[derive(Debug, Deserialize, Clone)]
pub struct WorkerSettings {
    /// Worker interpreter or binary (e.g. the venv's `python`).
    pub executable: PathBuf,
    /// Measurement script handed to the interpreter.
    pub script: PathBuf,
}

/// Default values for the measurement parameters, as entered.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ParamDefaults {
    /// Applied voltage in volts.
    pub voltage: String,
    /// Application time in seconds.
    pub time_s: String,
    /// Sample interval in seconds, or `AUTO`.
    pub sample_interval: String,
    /// Current range in amperes, or `AUTO`.
    pub current_range: String,
    /// Integration time in power line cycles.
    pub nplc: String,
    /// Compliance current in amperes.
    pub compliance_current: String,
}

impl Default for ParamDefaults {
    fn default() -> Self {
        Self {
            voltage: "1".to_string(),
            time_s: "3".to_string(),
            sample_interval: "AUTO".to_string(),
            current_range: "1".to_string(),
            nplc: "1".to_string(),
            compliance_current: "1".to_string(),
        }
    }
}

impl Settings {
    /// Loads `config/<name>.toml` (default name: `default`).
    ///
    /// # Errors
    ///
    /// Returns [`MeasurementError::Config`] when the file is missing or
    /// malformed.
    pub fn new(config_name: Option<&str>) -> Result<Self, MeasurementError> {
        let config_path = format!("config/{}", config_name.unwrap_or("default"));
        let s = Config::builder()
            .add_source(config::File::with_name(&config_path))
            .build()
            .map_err(MeasurementError::Config)?;

        s.try_deserialize().map_err(MeasurementError::Config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_defaults_match_the_bench_presets() {
        let defaults = ParamDefaults::default();
        assert_eq!(defaults.voltage, "1");
        assert_eq!(defaults.time_s, "3");
        assert_eq!(defaults.sample_interval, "AUTO");
        assert_eq!(defaults.nplc, "1");
    }
}
