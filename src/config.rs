/// Service configuration.
///
/// Settings come from an optional TOML file (`riverdata.toml` in the working
/// directory unless a path is given) layered over built-in defaults, then
/// environment variables (a `.env` file is honoured by the binary):
///
/// - `RIVERDATA_BASE_URL`     : uv service endpoint
/// - `RIVERDATA_TIMEOUT_SECS` : per-request timeout
/// - `RIVERDATA_MAX_RETRIES`  : retries after a transport failure
/// - `RIVERDATA_OUTPUT`       : snapshot path
/// - `RIVERDATA_REGISTRY`     : site registry TOML path
/// - `RIVERDATA_LOG_FILE`     : append log events to this file
///
/// `RUST_LOG` is read by the log filter directly.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::analysis::statistics::StatisticsOptions;
use crate::analysis::trend::{PREDICTION_COUNT, PredictionOptions};
use crate::ingest::usgs::{FetchOptions, UV_BASE_URL};
use crate::pipeline::PipelineOptions;
use crate::sites::Registry;

pub const DEFAULT_CONFIG_FILE: &str = "riverdata.toml";
pub const DEFAULT_OUTPUT_FILE: &str = "river_data.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// TOML Configuration Structures
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub fetch: FetchConfig,
    pub pipeline: PipelineConfig,
    pub output: OutputConfig,
    pub registry: RegistryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    pub user_agent: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: UV_BASE_URL.to_string(),
            timeout_secs: 30,
            max_retries: 0,
            retry_backoff_ms: 1000,
            user_agent: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Days before the run time where the query window begins.
    pub lookback_days: u32,
    /// Recent values fed to the trend fit, and points forecast.
    pub prediction_count: usize,
    pub value_places: u32,
    pub compare_places: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let prediction = PredictionOptions::default();
        Self {
            lookback_days: 1,
            prediction_count: PREDICTION_COUNT,
            value_places: prediction.value_places,
            compare_places: prediction.compare_places,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_OUTPUT_FILE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(default)]
pub struct RegistryConfig {
    /// Registry TOML; the bundled `sites.toml` when unset.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set.
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl AppConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads `path`, or `riverdata.toml` if present, then applies the
    /// environment and validates.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::read_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::read_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml_str(&text)
    }

    /// Overrides settings from environment-style lookups.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(url) = lookup("RIVERDATA_BASE_URL") {
            self.fetch.base_url = url;
        }
        if let Some(secs) = lookup("RIVERDATA_TIMEOUT_SECS") {
            self.fetch.timeout_secs = parse_env("RIVERDATA_TIMEOUT_SECS", &secs)?;
        }
        if let Some(retries) = lookup("RIVERDATA_MAX_RETRIES") {
            self.fetch.max_retries = parse_env("RIVERDATA_MAX_RETRIES", &retries)?;
        }
        if let Some(path) = lookup("RIVERDATA_OUTPUT") {
            self.output.path = PathBuf::from(path);
        }
        if let Some(path) = lookup("RIVERDATA_REGISTRY") {
            self.registry.path = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup("RIVERDATA_LOG_FILE") {
            self.logging.file = Some(PathBuf::from(path));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch.timeout_secs == 0 {
            return Err(ConfigError::Invalid("fetch.timeout_secs must be at least 1".into()));
        }
        if self.pipeline.prediction_count == 0 {
            return Err(ConfigError::Invalid(
                "pipeline.prediction_count must be at least 1".into(),
            ));
        }
        if self.pipeline.value_places > 28 || self.pipeline.compare_places > 28 {
            return Err(ConfigError::Invalid(
                "pipeline decimal places must be at most 28".into(),
            ));
        }
        if self.output.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("output.path must not be empty".into()));
        }
        Ok(())
    }

    pub fn fetch_options(&self) -> FetchOptions {
        let defaults = FetchOptions::default();
        FetchOptions {
            base_url: self.fetch.base_url.clone(),
            timeout: Duration::from_secs(self.fetch.timeout_secs),
            max_retries: self.fetch.max_retries,
            retry_backoff: Duration::from_millis(self.fetch.retry_backoff_ms),
            user_agent: self.fetch.user_agent.clone().unwrap_or(defaults.user_agent),
        }
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            lookback_days: self.pipeline.lookback_days,
            statistics: StatisticsOptions {
                prediction_count: self.pipeline.prediction_count,
                prediction: PredictionOptions {
                    value_places: self.pipeline.value_places,
                    compare_places: self.pipeline.compare_places,
                },
            },
        }
    }

    /// Loads the configured registry, or the bundled one.
    pub fn registry(&self) -> Result<Registry, ConfigError> {
        match &self.registry.path {
            Some(path) => Registry::load(path),
            None => Registry::builtin(),
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{} has invalid value '{}'", key, value)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
