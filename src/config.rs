//! Library configuration and logging setup.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::core::TimeUnit;
use crate::util::{read_file_to_string, Result};

/// Environment variable holding a `tracing` filter directive.
pub const LOG_ENV: &str = "MDAL_LOG";
/// Comma separated driver names to skip.
pub const DISABLED_DRIVERS_ENV: &str = "MDAL_DISABLED_DRIVERS";
/// Unit of dataset times returned by the handle API.
pub const TIME_UNIT_ENV: &str = "MDAL_TIME_UNIT";

/// Settings shared by a [`Session`](crate::api::Session).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Filter used when `MDAL_LOG` is not set.
    pub log_filter: String,
    /// Drivers that are never picked for loading.
    pub disabled_drivers: Vec<String>,
    /// Unit of `dataset_time`.
    pub time_unit: TimeUnit,
    /// Upper bound on meshes open at once, unbounded when `None`.
    pub max_open_meshes: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: "warn".to_string(),
            disabled_drivers: Vec::new(),
            time_unit: TimeUnit::Hours,
            max_open_meshes: None,
        }
    }
}

impl Config {
    /// Read a JSON config file. Missing keys take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = read_file_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Apply `MDAL_*` overrides looked up through `get`. Unparsable values
    /// are logged and ignored.
    pub fn apply_overrides(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(filter) = get(LOG_ENV) {
            self.log_filter = filter;
        }
        if let Some(list) = get(DISABLED_DRIVERS_ENV) {
            self.disabled_drivers = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(unit) = get(TIME_UNIT_ENV) {
            match unit.parse() {
                Ok(unit) => self.time_unit = unit,
                Err(e) => tracing::warn!(value = %unit, error = %e, "ignoring {}", TIME_UNIT_ENV),
            }
        }
    }

    /// Whether `driver` is in the disabled list (case insensitive).
    pub fn is_driver_disabled(&self, driver: &str) -> bool {
        self.disabled_drivers
            .iter()
            .any(|d| d.eq_ignore_ascii_case(driver))
    }

    /// Write the config as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Install a `fmt` subscriber filtered by `MDAL_LOG`, or by
/// `config.log_filter` when the variable is unset. Does nothing if a global
/// subscriber already exists.
pub fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .with(filter)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.log_filter, "warn");
        assert_eq!(config.time_unit, TimeUnit::Hours);
        assert!(config.disabled_drivers.is_empty());
        assert!(config.max_open_meshes.is_none());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            (LOG_ENV, "mdal=debug"),
            (DISABLED_DRIVERS_ENV, "2DM, XMDF ,,"),
            (TIME_UNIT_ENV, "seconds"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.log_filter, "mdal=debug");
        assert_eq!(config.disabled_drivers, vec!["2DM", "XMDF"]);
        assert_eq!(config.time_unit, TimeUnit::Seconds);
        assert!(config.is_driver_disabled("xmdf"));
        assert!(!config.is_driver_disabled("Ugrid"));
    }

    #[test]
    fn test_bad_time_unit_is_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|k| (k == TIME_UNIT_ENV).then(|| "fortnights".to_string()));
        assert_eq!(config.time_unit, TimeUnit::Hours);
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mdal.json");
        std::fs::write(&path, r#"{ "time_unit": "minutes", "max_open_meshes": 2 }"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.time_unit, TimeUnit::Minutes);
        assert_eq!(config.max_open_meshes, Some(2));
        assert_eq!(config.log_filter, "warn");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mdal.json");
        let config = Config {
            disabled_drivers: vec!["GRIB".into()],
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_init_logging_twice() {
        let config = Config::default();
        init_logging(&config);
        init_logging(&config);
    }
}
