use thiserror::Error;

use crate::config::ConfigError;
use crate::dataset::DatasetError;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Configuration(#[from] ConfigError),
    #[error("zone `{0}` has no records in the dataset")]
    UnknownZone(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("dataset unavailable: {message}")]
    DatasetUnavailable { message: String, correlation_id: String },
    #[error("invalid configuration: {message}")]
    Configuration { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::DatasetUnavailable { .. } => {
                "The dataset could not be read. Check the file path and format."
            }
            Self::Configuration { .. } => {
                "The configuration is invalid. Check revive.toml and the REVIVE_* environment \
                 variables."
            }
        }
    }

    pub fn error_class(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => "bad_request",
            Self::DatasetUnavailable { .. } => "dataset",
            Self::Configuration { .. } => "config_validation",
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Configuration { .. } => 2,
            Self::DatasetUnavailable { .. } => 3,
            Self::BadRequest { .. } => 4,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::DatasetUnavailable { correlation_id: id, .. }
            | InterfaceError::Configuration { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let message = value.to_string();
        match value {
            ApplicationError::UnknownZone(_) | ApplicationError::InvalidRequest(_) => {
                Self::BadRequest { message, correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::Dataset(_) => {
                Self::DatasetUnavailable { message, correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::Configuration(_) => {
                Self::Configuration { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}
