use std::path::PathBuf;

use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("not enough usable records to train: need at least {required}, found {available}")]
    InsufficientData { required: usize, available: usize },
    #[error("every feature column was removed as a leak column")]
    NoFeatureColumns,
}

#[derive(Debug, Error)]
pub enum TrendError {
    #[error("trend model `{name}` has not been trained")]
    ModelNotTrained { name: String },
    #[error("feature schema mismatch: expected {expected} columns, encoder produced {actual}")]
    SchemaMismatch { expected: usize, actual: usize },
    #[error("artifact bundle `{name}` failed integrity check: {reason}")]
    CorruptBundle { name: String, reason: String },
    #[error(transparent)]
    Training(#[from] TrainingError),
    #[error("artifact i/o failure at `{path}`: {source}")]
    ArtifactIo { path: PathBuf, source: std::io::Error },
    #[error("artifact serialization failure: {0}")]
    ArtifactFormat(#[from] serde_json::Error),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),
    #[error("artifact failure: {0}")]
    Artifact(String),
    #[error("integration failure: {0}")]
    Integration(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl From<TrendError> for ApplicationError {
    fn from(value: TrendError) -> Self {
        let message = value.to_string();
        match value {
            TrendError::ModelNotTrained { .. } => Self::ModelUnavailable(message),
            TrendError::SchemaMismatch { .. } | TrendError::CorruptBundle { .. } => {
                Self::Configuration(message)
            }
            TrendError::Training(_) => Self::Domain(DomainError::InvalidInput(message)),
            TrendError::ArtifactIo { .. } | TrendError::ArtifactFormat(_) => {
                Self::Artifact(message)
            }
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::ServiceUnavailable { .. } => {
                "The trend model is not ready yet. Train it and retry."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Domain(error) => Self::BadRequest {
                message: error.to_string(),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::ModelUnavailable(message)
            | ApplicationError::Integration(message) => {
                Self::ServiceUnavailable { message, correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::Artifact(message) | ApplicationError::Configuration(message) => {
                Self::Internal { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}
