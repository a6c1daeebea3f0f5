use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::policy::AnalysisPolicy;
use crate::selection::DEFAULT_TOP_N;

pub const CONFIG_FILE_CANDIDATES: [&str; 2] = ["revive.toml", "config/revive.toml"];

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub dataset: DatasetConfig,
    pub analysis: AnalysisConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, Default)]
pub struct DatasetConfig {
    pub path: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct AnalysisConfig {
    pub observation_window_days: i64,
    pub min_active_days: i64,
    pub days_per_month: i64,
    pub loss_decimal_places: u32,
    pub top_n: usize,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub dataset_path: Option<PathBuf>,
    pub log_level: Option<String>,
    pub top_n: Option<usize>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        let policy = AnalysisPolicy::default();
        Self {
            dataset: DatasetConfig::default(),
            analysis: AnalysisConfig {
                observation_window_days: policy.observation_window_days,
                min_active_days: policy.min_active_days,
                days_per_month: policy.days_per_month,
                loss_decimal_places: policy.loss_decimal_places,
                top_n: DEFAULT_TOP_N,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl AnalysisConfig {
    pub fn policy(&self) -> AnalysisPolicy {
        AnalysisPolicy {
            observation_window_days: self.observation_window_days,
            min_active_days: self.min_active_days,
            days_per_month: self.days_per_month,
            loss_decimal_places: self.loss_decimal_places,
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("revive.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(dataset) = patch.dataset {
            if let Some(path) = dataset.path {
                self.dataset.path = Some(path);
            }
        }

        if let Some(analysis) = patch.analysis {
            if let Some(observation_window_days) = analysis.observation_window_days {
                self.analysis.observation_window_days = observation_window_days;
            }
            if let Some(min_active_days) = analysis.min_active_days {
                self.analysis.min_active_days = min_active_days;
            }
            if let Some(days_per_month) = analysis.days_per_month {
                self.analysis.days_per_month = days_per_month;
            }
            if let Some(loss_decimal_places) = analysis.loss_decimal_places {
                self.analysis.loss_decimal_places = loss_decimal_places;
            }
            if let Some(top_n) = analysis.top_n {
                self.analysis.top_n = top_n;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("REVIVE_DATASET_PATH") {
            self.dataset.path = Some(PathBuf::from(value));
        }

        if let Some(value) = read_env("REVIVE_ANALYSIS_OBSERVATION_WINDOW_DAYS") {
            self.analysis.observation_window_days =
                parse_env("REVIVE_ANALYSIS_OBSERVATION_WINDOW_DAYS", &value)?;
        }
        if let Some(value) = read_env("REVIVE_ANALYSIS_MIN_ACTIVE_DAYS") {
            self.analysis.min_active_days = parse_env("REVIVE_ANALYSIS_MIN_ACTIVE_DAYS", &value)?;
        }
        if let Some(value) = read_env("REVIVE_ANALYSIS_DAYS_PER_MONTH") {
            self.analysis.days_per_month = parse_env("REVIVE_ANALYSIS_DAYS_PER_MONTH", &value)?;
        }
        if let Some(value) = read_env("REVIVE_ANALYSIS_LOSS_DECIMAL_PLACES") {
            self.analysis.loss_decimal_places =
                parse_env("REVIVE_ANALYSIS_LOSS_DECIMAL_PLACES", &value)?;
        }
        if let Some(value) = read_env("REVIVE_ANALYSIS_TOP_N") {
            self.analysis.top_n = parse_env("REVIVE_ANALYSIS_TOP_N", &value)?;
        }

        let log_level = read_env("REVIVE_LOGGING_LEVEL").or_else(|| read_env("REVIVE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("REVIVE_LOGGING_FORMAT").or_else(|| read_env("REVIVE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(dataset_path) = overrides.dataset_path {
            self.dataset.path = Some(dataset_path);
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(top_n) = overrides.top_n {
            self.analysis.top_n = top_n;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_analysis(&self.analysis)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    CONFIG_FILE_CANDIDATES.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_analysis(analysis: &AnalysisConfig) -> Result<(), ConfigError> {
    if analysis.observation_window_days < 1 {
        return Err(ConfigError::Validation(
            "analysis.observation_window_days must be at least 1".to_string(),
        ));
    }

    if analysis.min_active_days < 1 || analysis.min_active_days > analysis.observation_window_days
    {
        return Err(ConfigError::Validation(format!(
            "analysis.min_active_days must be in range 1..={}",
            analysis.observation_window_days
        )));
    }

    if analysis.days_per_month < 1 {
        return Err(ConfigError::Validation(
            "analysis.days_per_month must be at least 1".to_string(),
        ));
    }

    if analysis.loss_decimal_places > 10 {
        return Err(ConfigError::Validation(
            "analysis.loss_decimal_places must be in range 0..=10".to_string(),
        ));
    }

    if analysis.top_n == 0 {
        return Err(ConfigError::Validation(
            "analysis.top_n must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    dataset: Option<DatasetPatch>,
    analysis: Option<AnalysisPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatasetPatch {
    path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct AnalysisPatch {
    observation_window_days: Option<i64>,
    min_active_days: Option<i64>,
    days_per_month: Option<i64>,
    loss_decimal_places: Option<u32>,
    top_n: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
