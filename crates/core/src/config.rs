use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::recipe::Language;

pub const DEFAULT_LEAK_COLUMNS: &[&str] = &["views", "fame_score", "engagement_rate"];

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub model: ModelConfig,
    pub generation: GenerationConfig,
    pub context: ContextConfig,
    pub thresholds: ThresholdsConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl LlmConfig {
    /// Configured endpoint root, or the provider default when unset.
    pub fn resolved_base_url(&self) -> String {
        self.base_url
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| self.provider.default_base_url())
            .trim_end_matches('/')
            .to_string()
    }
}

#[derive(Clone, Debug)]
pub struct ModelConfig {
    pub artifact_dir: PathBuf,
    pub name: String,
    pub horizon_days: u32,
    pub leak_columns: Vec<String>,
    pub train_fraction: f64,
    pub seed: u64,
}

#[derive(Clone, Debug)]
pub struct GenerationConfig {
    pub language: Language,
    pub enhance_primary: bool,
    pub fallback_trend_strength: f64,
}

#[derive(Clone, Debug, Default)]
pub struct ContextConfig {
    pub tables_path: Option<PathBuf>,
}

#[derive(Clone, Debug, Default)]
pub struct ThresholdsConfig {
    pub path: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    Gemini,
    #[serde(rename = "openai")]
    OpenAi,
    Ollama,
}

impl LlmProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
            Self::Ollama => "ollama",
        }
    }

    /// Endpoint root used when `llm.base_url` is unset.
    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Ollama => "http://localhost:11434",
        }
    }
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
    pub log_level: Option<String>,
    pub llm_provider: Option<LlmProvider>,
    pub llm_model: Option<String>,
    pub artifact_dir: Option<PathBuf>,
    pub model_name: Option<String>,
    pub language: Option<Language>,
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
        Self {
            llm: LlmConfig {
                provider: LlmProvider::Ollama,
                api_key: None,
                base_url: None,
                model: "llama3.1".to_string(),
                timeout_secs: 60,
                max_retries: 1,
                temperature: 0.7,
                max_output_tokens: 2048,
            },
            model: ModelConfig {
                artifact_dir: PathBuf::from("models"),
                name: "bakery_trend".to_string(),
                horizon_days: 14,
                leak_columns: DEFAULT_LEAK_COLUMNS.iter().map(|column| column.to_string()).collect(),
                train_fraction: 0.8,
                seed: 42,
            },
            generation: GenerationConfig {
                language: Language::Vi,
                enhance_primary: false,
                fallback_trend_strength: 0.5,
            },
            context: ContextConfig::default(),
            thresholds: ThresholdsConfig::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            other => Err(ConfigError::Validation(format!(
                "unsupported llm provider `{other}` (expected gemini|openai|ollama)"
            ))),
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
            config.apply_patch(patch)?;
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("bakecast.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    /// Path of the persisted artifact bundle for the configured model name.
    pub fn bundle_path(&self) -> PathBuf {
        self.model.artifact_dir.join(format!("{}.json", self.model.name))
    }

    fn apply_patch(&mut self, patch: ConfigPatch) -> Result<(), ConfigError> {
        if let Some(llm) = patch.llm {
            if let Some(provider) = llm.provider {
                self.llm.provider = provider;
            }
            if let Some(llm_api_key_value) = llm.api_key {
                self.llm.api_key = Some(secret_value(llm_api_key_value));
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = Some(base_url);
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
            if let Some(max_retries) = llm.max_retries {
                self.llm.max_retries = max_retries;
            }
            if let Some(temperature) = llm.temperature {
                self.llm.temperature = temperature;
            }
            if let Some(max_output_tokens) = llm.max_output_tokens {
                self.llm.max_output_tokens = max_output_tokens;
            }
        }

        if let Some(model) = patch.model {
            if let Some(artifact_dir) = model.artifact_dir {
                self.model.artifact_dir = artifact_dir;
            }
            if let Some(name) = model.name {
                self.model.name = name;
            }
            if let Some(horizon_days) = model.horizon_days {
                self.model.horizon_days = horizon_days;
            }
            if let Some(leak_columns) = model.leak_columns {
                self.model.leak_columns = leak_columns;
            }
            if let Some(train_fraction) = model.train_fraction {
                self.model.train_fraction = train_fraction;
            }
            if let Some(seed) = model.seed {
                self.model.seed = seed;
            }
        }

        if let Some(generation) = patch.generation {
            if let Some(language) = generation.language {
                self.generation.language = language.parse().map_err(ConfigError::Validation)?;
            }
            if let Some(enhance_primary) = generation.enhance_primary {
                self.generation.enhance_primary = enhance_primary;
            }
            if let Some(fallback) = generation.fallback_trend_strength {
                self.generation.fallback_trend_strength = fallback;
            }
        }

        if let Some(context) = patch.context {
            if let Some(tables_path) = context.tables_path {
                self.context.tables_path = Some(tables_path);
            }
        }

        if let Some(thresholds) = patch.thresholds {
            if let Some(path) = thresholds.path {
                self.thresholds.path = Some(path);
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

        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("BAKECAST_LLM_PROVIDER") {
            self.llm.provider = value.parse()?;
        }
        if let Some(value) = read_env("BAKECAST_LLM_API_KEY") {
            self.llm.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("BAKECAST_LLM_BASE_URL") {
            self.llm.base_url = Some(value);
        }
        if let Some(value) = read_env("BAKECAST_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("BAKECAST_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("BAKECAST_LLM_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("BAKECAST_LLM_MAX_RETRIES") {
            self.llm.max_retries = parse_u32("BAKECAST_LLM_MAX_RETRIES", &value)?;
        }
        if let Some(value) = read_env("BAKECAST_LLM_TEMPERATURE") {
            self.llm.temperature = parse_f64("BAKECAST_LLM_TEMPERATURE", &value)? as f32;
        }
        if let Some(value) = read_env("BAKECAST_LLM_MAX_OUTPUT_TOKENS") {
            self.llm.max_output_tokens = parse_u32("BAKECAST_LLM_MAX_OUTPUT_TOKENS", &value)?;
        }

        if let Some(value) = read_env("BAKECAST_MODEL_ARTIFACT_DIR") {
            self.model.artifact_dir = PathBuf::from(value);
        }
        if let Some(value) = read_env("BAKECAST_MODEL_NAME") {
            self.model.name = value;
        }
        if let Some(value) = read_env("BAKECAST_MODEL_HORIZON_DAYS") {
            self.model.horizon_days = parse_u32("BAKECAST_MODEL_HORIZON_DAYS", &value)?;
        }
        if let Some(value) = read_env("BAKECAST_MODEL_LEAK_COLUMNS") {
            self.model.leak_columns = value
                .split(',')
                .map(str::trim)
                .filter(|column| !column.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(value) = read_env("BAKECAST_MODEL_TRAIN_FRACTION") {
            self.model.train_fraction = parse_f64("BAKECAST_MODEL_TRAIN_FRACTION", &value)?;
        }
        if let Some(value) = read_env("BAKECAST_MODEL_SEED") {
            self.model.seed = parse_u64("BAKECAST_MODEL_SEED", &value)?;
        }

        if let Some(value) = read_env("BAKECAST_GENERATION_LANGUAGE") {
            self.generation.language = value.parse().map_err(|_| {
                ConfigError::InvalidEnvOverride {
                    key: "BAKECAST_GENERATION_LANGUAGE".to_string(),
                    value: value.clone(),
                }
            })?;
        }
        if let Some(value) = read_env("BAKECAST_GENERATION_ENHANCE_PRIMARY") {
            self.generation.enhance_primary =
                parse_bool("BAKECAST_GENERATION_ENHANCE_PRIMARY", &value)?;
        }
        if let Some(value) = read_env("BAKECAST_GENERATION_FALLBACK_TREND_STRENGTH") {
            self.generation.fallback_trend_strength =
                parse_f64("BAKECAST_GENERATION_FALLBACK_TREND_STRENGTH", &value)?;
        }

        if let Some(value) = read_env("BAKECAST_CONTEXT_TABLES_PATH") {
            self.context.tables_path = Some(PathBuf::from(value));
        }
        if let Some(value) = read_env("BAKECAST_THRESHOLDS_PATH") {
            self.thresholds.path = Some(PathBuf::from(value));
        }

        let log_level =
            read_env("BAKECAST_LOGGING_LEVEL").or_else(|| read_env("BAKECAST_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("BAKECAST_LOGGING_FORMAT").or_else(|| read_env("BAKECAST_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(llm_provider) = overrides.llm_provider {
            self.llm.provider = llm_provider;
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
        if let Some(artifact_dir) = overrides.artifact_dir {
            self.model.artifact_dir = artifact_dir;
        }
        if let Some(model_name) = overrides.model_name {
            self.model.name = model_name;
        }
        if let Some(language) = overrides.language {
            self.generation.language = language;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_llm(&self.llm)?;
        validate_model(&self.model)?;
        validate_generation(&self.generation)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("bakecast.toml"), PathBuf::from("config/bakecast.toml")]
        .into_iter()
        .find(|path| path.exists())
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

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if llm.max_retries > 5 {
        return Err(ConfigError::Validation("llm.max_retries must be at most 5".to_string()));
    }

    if !(0.0..=2.0).contains(&llm.temperature) {
        return Err(ConfigError::Validation(
            "llm.temperature must be in range 0.0..=2.0".to_string(),
        ));
    }

    if llm.max_output_tokens == 0 {
        return Err(ConfigError::Validation(
            "llm.max_output_tokens must be greater than zero".to_string(),
        ));
    }

    match llm.provider {
        LlmProvider::Gemini | LlmProvider::OpenAi => {
            let missing = llm
                .api_key
                .as_ref()
                .map(|value| value.expose_secret().trim().is_empty())
                .unwrap_or(true);
            if missing {
                return Err(ConfigError::Validation(
                    "llm.api_key is required for gemini/openai providers".to_string(),
                ));
            }
        }
        LlmProvider::Ollama => {
            if llm.resolved_base_url().is_empty() {
                return Err(ConfigError::Validation(
                    "llm.base_url is required for ollama provider".to_string(),
                ));
            }
        }
    }

    if let Some(base_url) = &llm.base_url {
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::Validation(
                "llm.base_url must start with http:// or https://".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_model(model: &ModelConfig) -> Result<(), ConfigError> {
    if model.name.trim().is_empty() {
        return Err(ConfigError::Validation("model.name must not be empty".to_string()));
    }

    if model.name.contains(['/', '\\']) {
        return Err(ConfigError::Validation(
            "model.name must not contain path separators".to_string(),
        ));
    }

    if !(model.train_fraction > 0.0 && model.train_fraction < 1.0) {
        return Err(ConfigError::Validation(
            "model.train_fraction must be strictly between 0 and 1".to_string(),
        ));
    }

    if model.horizon_days > 366 {
        return Err(ConfigError::Validation(
            "model.horizon_days must be in range 0..=366".to_string(),
        ));
    }

    Ok(())
}

fn validate_generation(generation: &GenerationConfig) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&generation.fallback_trend_strength) {
        return Err(ConfigError::Validation(
            "generation.fallback_trend_strength must be in range 0.0..=1.0".to_string(),
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

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.parse::<f64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    llm: Option<LlmPatch>,
    model: Option<ModelPatch>,
    generation: Option<GenerationPatch>,
    context: Option<ContextPatch>,
    thresholds: Option<ThresholdsPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    provider: Option<LlmProvider>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
    temperature: Option<f32>,
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct ModelPatch {
    artifact_dir: Option<PathBuf>,
    name: Option<String>,
    horizon_days: Option<u32>,
    leak_columns: Option<Vec<String>>,
    train_fraction: Option<f64>,
    seed: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct GenerationPatch {
    language: Option<String>,
    enhance_primary: Option<bool>,
    fallback_trend_strength: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct ContextPatch {
    tables_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct ThresholdsPatch {
    path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LlmProvider, LoadOptions, LogFormat};
    use crate::domain::recipe::Language;

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_keep_fourteen_day_horizon_and_leak_columns() -> Result<(), String> {
        let config = AppConfig::default();
        config.validate().map_err(|err| err.to_string())?;

        ensure(config.model.horizon_days == 14, "default horizon should be 14 days")?;
        ensure(
            config.model.leak_columns == vec!["views", "fame_score", "engagement_rate"],
            "default leak columns should be the target proxies",
        )?;
        ensure(
            config.bundle_path() == PathBuf::from("models").join("bakery_trend.json"),
            "bundle path should join artifact dir and model name",
        )
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_BAKECAST_GEMINI_KEY", "gm-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("bakecast.toml");
            fs::write(
                &path,
                r#"
[llm]
provider = "gemini"
api_key = "${TEST_BAKECAST_GEMINI_KEY}"
model = "gemini-1.5-pro"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.llm.provider == LlmProvider::Gemini, "provider should come from file")?;
            ensure(
                config.llm.api_key.as_ref().map(|key| key.expose_secret() == "gm-from-env")
                    == Some(true),
                "api key should be interpolated from environment",
            )?;
            Ok(())
        })();

        clear_vars(&["TEST_BAKECAST_GEMINI_KEY"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("BAKECAST_LOG_LEVEL", "warn");
        env::set_var("BAKECAST_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(&["BAKECAST_LOG_LEVEL", "BAKECAST_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("BAKECAST_MODEL_HORIZON_DAYS", "7");
        env::set_var("BAKECAST_MODEL_LEAK_COLUMNS", "views, likes");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("bakecast.toml");
            fs::write(
                &path,
                r#"
[model]
name = "from_file"
horizon_days = 21
train_fraction = 0.75

[generation]
language = "en"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    model_name: Some("from_override".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.model.name == "from_override", "override model name should win")?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(config.model.horizon_days == 7, "env horizon should win over file")?;
            ensure(
                config.model.leak_columns == vec!["views", "likes"],
                "env leak columns should be split and trimmed",
            )?;
            ensure(config.model.train_fraction == 0.75, "file train fraction should apply")?;
            ensure(config.generation.language == Language::En, "file language should apply")?;
            Ok(())
        })();

        clear_vars(&["BAKECAST_MODEL_HORIZON_DAYS", "BAKECAST_MODEL_LEAK_COLUMNS"]);
        result
    }

    #[test]
    fn provider_switch_without_base_url_uses_provider_endpoint() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("BAKECAST_LLM_API_KEY", "gm-key");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions {
                overrides: ConfigOverrides {
                    llm_provider: Some(LlmProvider::Gemini),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.llm.base_url.is_none(), "base url should stay unset")?;
            ensure(
                config.llm.resolved_base_url()
                    == "https://generativelanguage.googleapis.com/v1beta",
                "gemini should resolve to its own endpoint",
            )?;

            let ollama = AppConfig::default();
            ollama.validate().map_err(|err| err.to_string())?;
            ensure(
                ollama.llm.resolved_base_url() == "http://localhost:11434",
                "ollama should resolve to the local endpoint",
            )
        })();

        clear_vars(&["BAKECAST_LLM_API_KEY"]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("BAKECAST_LLM_PROVIDER", "gemini");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("llm.api_key")
            );
            ensure(has_message, "validation failure should mention llm.api_key")
        })();

        clear_vars(&["BAKECAST_LLM_PROVIDER"]);
        result
    }

    #[test]
    fn invalid_numeric_override_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("BAKECAST_MODEL_TRAIN_FRACTION", "most");

        let result = (|| -> Result<(), String> {
            match AppConfig::load(LoadOptions::default()) {
                Err(ConfigError::InvalidEnvOverride { key, .. }) => ensure(
                    key == "BAKECAST_MODEL_TRAIN_FRACTION",
                    "error should name the offending variable",
                ),
                Err(other) => Err(format!("unexpected error: {other}")),
                Ok(_) => Err("expected invalid override failure".to_string()),
            }
        })();

        clear_vars(&["BAKECAST_MODEL_TRAIN_FRACTION"]);
        result
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("BAKECAST_LLM_PROVIDER", "openai");
        env::set_var("BAKECAST_LLM_API_KEY", "sk-secret-value");
        env::set_var("BAKECAST_LLM_BASE_URL", "https://api.openai.com");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("sk-secret-value"), "debug output should not contain api key")?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )?;
            Ok(())
        })();

        clear_vars(&["BAKECAST_LLM_PROVIDER", "BAKECAST_LLM_API_KEY", "BAKECAST_LLM_BASE_URL"]);
        result
    }
}
