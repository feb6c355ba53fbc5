//! Configuration file loading
//!
//! `tailstat` runs fine with no config file at all; a `tailstat.toml` can
//! override display defaults and the path denylist. A missing file falls
//! back to built-in defaults, while an unreadable or invalid file is a hard
//! error so typos do not silently revert to defaults.

use crate::store::PathFilter;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Default rows per ranking table
pub const DEFAULT_TOP_N: usize = 15;

/// Default refresh interval in milliseconds
pub const DEFAULT_REFRESH_MS: u64 = 1000;

/// Floor for the refresh interval; anything faster just burns CPU
const MIN_REFRESH_MS: u64 = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Where the effective configuration came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    File,
    Defaults,
}

impl ConfigSource {
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            ConfigSource::File => "config file",
            ConfigSource::Defaults => "built-in defaults",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DisplayConfig {
    /// Rows per ranking table
    #[serde(default = "default_top_n")]
    pub top: usize,
    #[serde(default = "default_refresh_ms")]
    pub refresh_ms: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            top: DEFAULT_TOP_N,
            refresh_ms: DEFAULT_REFRESH_MS,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    /// Exact-match paths hidden from path rankings
    #[serde(default = "default_excluded")]
    pub excluded: Vec<String>,
    /// Prefix-match paths hidden from path rankings
    #[serde(default = "default_excluded_prefixes")]
    pub excluded_prefixes: Vec<String>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            excluded: default_excluded(),
            excluded_prefixes: default_excluded_prefixes(),
        }
    }
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

fn default_refresh_ms() -> u64 {
    DEFAULT_REFRESH_MS
}

fn default_excluded() -> Vec<String> {
    ["/ahoy/events", "/ahoy/visits", "/robots.txt"]
        .map(String::from)
        .to_vec()
}

fn default_excluded_prefixes() -> Vec<String> {
    ["/system-status-", "/hirefire"].map(String::from).to_vec()
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.display.top == 0 {
            return Err(ConfigError::Invalid(
                "display.top must be at least 1".to_string(),
            ));
        }
        if self.display.refresh_ms < MIN_REFRESH_MS {
            return Err(ConfigError::Invalid(format!(
                "display.refresh_ms must be at least {MIN_REFRESH_MS}"
            )));
        }
        Ok(())
    }

    /// Build the store's path denylist from this config
    #[must_use]
    pub fn path_filter(&self) -> PathFilter {
        PathFilter::new(
            self.paths.excluded.clone(),
            self.paths.excluded_prefixes.clone(),
        )
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let display_path = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: display_path.clone(),
        source,
    })?;

    let config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: display_path,
        source,
    })?;

    config.validate()?;
    Ok(config)
}

/// Load configuration, falling back to defaults when the file is absent
///
/// Only a missing file triggers the fallback; any other failure propagates.
pub fn load_config_with_fallback(path: &Path) -> Result<(Config, ConfigSource), ConfigError> {
    if path.exists() {
        load_config(path).map(|config| (config, ConfigSource::File))
    } else {
        Ok((Config::default(), ConfigSource::Defaults))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("create temp file");
        file.write_all(content.as_bytes()).expect("write config");
        file
    }

    #[test]
    fn defaults_when_file_missing() {
        let (config, source) =
            load_config_with_fallback(Path::new("/nonexistent/tailstat.toml")).unwrap();
        assert_eq!(source, ConfigSource::Defaults);
        assert_eq!(config, Config::default());
        assert_eq!(config.display.top, DEFAULT_TOP_N);
    }

    #[test]
    fn parses_full_config() {
        let file = write_config(
            r#"
[display]
top = 25
refresh_ms = 500

[paths]
excluded = ["/healthz"]
excluded_prefixes = ["/internal-"]
"#,
        );

        let (config, source) = load_config_with_fallback(file.path()).unwrap();
        assert_eq!(source, ConfigSource::File);
        assert_eq!(config.display.top, 25);
        assert_eq!(config.display.refresh_ms, 500);
        assert_eq!(config.paths.excluded, vec!["/healthz"]);

        let filter = config.path_filter();
        assert!(filter.is_excluded("/healthz"));
        assert!(filter.is_excluded("/internal-metrics"));
        assert!(!filter.is_excluded("/robots.txt"));
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let file = write_config("[display]\ntop = 5\n");
        let (config, _) = load_config_with_fallback(file.path()).unwrap();
        assert_eq!(config.display.top, 5);
        assert_eq!(config.display.refresh_ms, DEFAULT_REFRESH_MS);
        assert_eq!(config.paths, PathsConfig::default());
    }

    #[test]
    fn rejects_zero_top() {
        let file = write_config("[display]\ntop = 0\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_too_fast_refresh() {
        let file = write_config("[display]\nrefresh_ms = 10\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_unknown_keys() {
        let file = write_config("[display]\ntpo = 5\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn rejects_malformed_toml() {
        let file = write_config("not [valid toml");
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
