pub mod config;
pub mod impact;
pub mod report;
pub mod zones;

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use revive_core::config::{AppConfig, ConfigOverrides, LoadOptions};
use revive_core::dataset::{export_file_stem, load_rows_file};
use revive_core::normalize::today;
use revive_core::zone::{filter_zone, zones, ZoneFilter};
use revive_core::ZoneName;
use revive_core::{
    ApplicationError, DeterministicEnrichmentRuntime, EnrichedSku, EnrichmentRuntime,
};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>, data: impl Serialize) -> Self {
        let data = match serde_json::to_value(data) {
            Ok(data) => data,
            Err(error) => {
                return Self::failure(command, "serialization", error.to_string(), 1);
            }
        };
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data: Some(data),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    pub fn from_error(command: &str, error: ApplicationError) -> Self {
        tracing::warn!(
            event_name = "cli.command_failed",
            command,
            error = %error,
            "command failed"
        );
        let interface = error.into_interface(command);
        Self::failure(
            command,
            interface.error_class(),
            interface.to_string(),
            interface.exit_code(),
        )
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Dataset input shared by every analysis command.
#[derive(Debug, Clone, Default)]
pub struct DatasetArgs {
    pub input: Option<PathBuf>,
    pub reference_date: Option<String>,
}

/// Zone view shared by `report` and `impact`.
#[derive(Debug, Clone)]
pub struct ZoneArgs {
    pub zone: String,
    pub brand: Option<String>,
}

impl ZoneArgs {
    fn filter(&self) -> ZoneFilter {
        let filter = ZoneFilter::zone(self.zone.trim());
        match self.brand.as_deref().map(str::trim).filter(|brand| !brand.is_empty()) {
            Some(brand) => filter.with_brand(brand),
            None => filter,
        }
    }
}

pub(crate) struct AnalysisContext {
    pub config: AppConfig,
    pub reference: NaiveDate,
    pub records: Vec<EnrichedSku>,
}

impl AnalysisContext {
    pub fn load(args: &DatasetArgs) -> Result<Self, ApplicationError> {
        let config = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                dataset_path: args.input.clone(),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })?;

        let reference = match args.reference_date.as_deref() {
            Some(raw) => parse_reference_date(raw)?,
            None => today(),
        };

        let path = config.dataset.path.clone().ok_or_else(|| {
            ApplicationError::InvalidRequest(
                "no dataset path; pass --input or set REVIVE_DATASET_PATH".to_string(),
            )
        })?;
        let rows = load_rows_file(&path)?;

        let runtime = DeterministicEnrichmentRuntime::with_policy(config.analysis.policy());
        let records = runtime.enrich(&rows, reference);

        Ok(Self { config, reference, records })
    }

    pub fn zone_view(
        &self,
        args: &ZoneArgs,
    ) -> Result<(ZoneFilter, Vec<EnrichedSku>), ApplicationError> {
        let filter = args.filter();
        if !zones(&self.records).contains(&filter.zone) {
            return Err(ApplicationError::UnknownZone(filter.zone.0.clone()));
        }
        let view = filter_zone(&self.records, &filter);
        Ok((filter, view))
    }
}

fn parse_reference_date(raw: &str) -> Result<NaiveDate, ApplicationError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        ApplicationError::InvalidRequest(format!(
            "reference date `{raw}` must be formatted as YYYY-MM-DD"
        ))
    })
}

/// A directory target gets the default `<prefix>_<zone>.csv` file name.
pub(crate) fn resolve_export_path(path: &Path, prefix: &str, zone: &ZoneName) -> PathBuf {
    if path.is_dir() {
        path.join(format!("{}.csv", export_file_stem(prefix, zone.as_str())))
    } else {
        path.to_path_buf()
    }
}
