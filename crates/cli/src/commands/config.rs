use std::env;
use std::fs;
use std::path::Path;

use revive_core::config::{resolve_config_path, AppConfig, LoadOptions};
use revive_core::ApplicationError;
use serde::Serialize;
use toml::Value;

use crate::commands::CommandResult;

#[derive(Debug, Serialize)]
struct ConfigEntry {
    key: &'static str,
    value: String,
    source: String,
}

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return CommandResult::from_error("config", ApplicationError::from(error)),
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let dataset_path = config
        .dataset
        .path
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<unset>".to_string());

    let entries: [(&'static str, String, &[&str]); 8] = [
        ("dataset.path", dataset_path, &["REVIVE_DATASET_PATH"]),
        (
            "analysis.observation_window_days",
            config.analysis.observation_window_days.to_string(),
            &["REVIVE_ANALYSIS_OBSERVATION_WINDOW_DAYS"],
        ),
        (
            "analysis.min_active_days",
            config.analysis.min_active_days.to_string(),
            &["REVIVE_ANALYSIS_MIN_ACTIVE_DAYS"],
        ),
        (
            "analysis.days_per_month",
            config.analysis.days_per_month.to_string(),
            &["REVIVE_ANALYSIS_DAYS_PER_MONTH"],
        ),
        (
            "analysis.loss_decimal_places",
            config.analysis.loss_decimal_places.to_string(),
            &["REVIVE_ANALYSIS_LOSS_DECIMAL_PLACES"],
        ),
        ("analysis.top_n", config.analysis.top_n.to_string(), &["REVIVE_ANALYSIS_TOP_N"]),
        (
            "logging.level",
            config.logging.level.clone(),
            &["REVIVE_LOGGING_LEVEL", "REVIVE_LOG_LEVEL"],
        ),
        (
            "logging.format",
            format!("{:?}", config.logging.format),
            &["REVIVE_LOGGING_FORMAT", "REVIVE_LOG_FORMAT"],
        ),
    ];

    let rendered: Vec<ConfigEntry> = entries
        .into_iter()
        .map(|(key, value, env_keys)| ConfigEntry {
            source: field_source(
                key,
                env_keys,
                config_file_doc.as_ref(),
                config_file_path.as_deref(),
            ),
            key,
            value,
        })
        .collect();

    CommandResult::success(
        "config",
        "effective config (source precedence: env > file > default)",
        rendered,
    )
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}
