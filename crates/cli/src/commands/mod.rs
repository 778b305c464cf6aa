pub mod config;
pub mod doctor;
pub mod forecast;
pub mod generate;
pub mod predict;
pub mod train;

use bakecast_core::config::{AppConfig, LoadOptions};
use bakecast_core::errors::{ApplicationError, InterfaceError};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tokio::runtime::Runtime;

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_MODEL_NOT_TRAINED: u8 = 3;
pub const EXIT_RUNTIME_INIT: u8 = 4;
pub const EXIT_DATA_INPUT: u8 = 5;
pub const EXIT_TRAINING: u8 = 6;
pub const EXIT_ARTIFACT: u8 = 7;

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
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::report(command, message, None)
    }

    /// Success payload carrying structured command output under `data`.
    pub fn success_with<T: Serialize>(command: &str, message: impl Into<String>, data: &T) -> Self {
        match serde_json::to_value(data) {
            Ok(value) => Self::report(command, message, Some(value)),
            Err(error) => Self::failure(command, "serialization", error.to_string(), 1),
        }
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

    fn report(command: &str, message: impl Into<String>, data: Option<Value>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }
}

/// Loads and validates configuration, mapping failure to the shared exit code.
pub(crate) fn load_config(command: &str, options: LoadOptions) -> Result<AppConfig, CommandResult> {
    AppConfig::load(options).map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            EXIT_CONFIG,
        )
    })
}

pub(crate) fn async_runtime(command: &str) -> Result<Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            "runtime_init",
            format!("failed to initialize async runtime: {error}"),
            EXIT_RUNTIME_INIT,
        )
    })
}

/// Reports an application failure through its interface classification.
pub(crate) fn interface_failure(
    command: &str,
    error: impl Into<ApplicationError>,
    exit_code: u8,
) -> CommandResult {
    let correlation_id = format!("{command}-{}", Utc::now().timestamp_millis());
    let interface = error.into().into_interface(correlation_id);
    let error_class = match &interface {
        InterfaceError::BadRequest { .. } => "bad_request",
        InterfaceError::ServiceUnavailable { .. } => "service_unavailable",
        InterfaceError::Internal { .. } => "internal",
    };
    CommandResult::failure(
        command,
        error_class,
        format!("{} ({interface})", interface.user_message()),
        exit_code,
    )
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}
