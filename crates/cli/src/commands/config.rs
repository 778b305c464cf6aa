use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use bakecast_core::config::{AppConfig, LoadOptions};
use toml::Value;

/// One rendered configuration entry.
struct Field {
    key: &'static str,
    env_key: &'static str,
    value: String,
}

impl Field {
    fn new(key: &'static str, env_key: &'static str, value: impl Into<String>) -> Self {
        Self { key, env_key, value: value.into() }
    }
}

pub fn run(options: LoadOptions) -> String {
    let explicit_path = options.config_path.clone();
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path(explicit_path.as_deref());
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields(&config) {
        let source = field_source(
            field.key,
            field.env_key,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key, &field.value, source));
    }
    lines.join("\n")
}

fn fields(config: &AppConfig) -> Vec<Field> {
    let optional_path = |path: &Option<PathBuf>| {
        path.as_ref().map(|path| path.display().to_string()).unwrap_or_else(|| "<built-in>".into())
    };
    let api_key = if config.llm.api_key.is_some() { "<redacted>" } else { "<unset>" };

    vec![
        Field::new("llm.provider", "BAKECAST_LLM_PROVIDER", config.llm.provider.as_str()),
        Field::new("llm.model", "BAKECAST_LLM_MODEL", config.llm.model.as_str()),
        Field::new(
            "llm.base_url",
            "BAKECAST_LLM_BASE_URL",
            config.llm.resolved_base_url(),
        ),
        Field::new("llm.api_key", "BAKECAST_LLM_API_KEY", api_key),
        Field::new("llm.timeout_secs", "BAKECAST_LLM_TIMEOUT_SECS", config.llm.timeout_secs.to_string()),
        Field::new("llm.max_retries", "BAKECAST_LLM_MAX_RETRIES", config.llm.max_retries.to_string()),
        Field::new("llm.temperature", "BAKECAST_LLM_TEMPERATURE", config.llm.temperature.to_string()),
        Field::new(
            "llm.max_output_tokens",
            "BAKECAST_LLM_MAX_OUTPUT_TOKENS",
            config.llm.max_output_tokens.to_string(),
        ),
        Field::new(
            "model.artifact_dir",
            "BAKECAST_MODEL_ARTIFACT_DIR",
            config.model.artifact_dir.display().to_string(),
        ),
        Field::new("model.name", "BAKECAST_MODEL_NAME", config.model.name.as_str()),
        Field::new(
            "model.horizon_days",
            "BAKECAST_MODEL_HORIZON_DAYS",
            config.model.horizon_days.to_string(),
        ),
        Field::new(
            "model.leak_columns",
            "BAKECAST_MODEL_LEAK_COLUMNS",
            config.model.leak_columns.join(","),
        ),
        Field::new(
            "model.train_fraction",
            "BAKECAST_MODEL_TRAIN_FRACTION",
            config.model.train_fraction.to_string(),
        ),
        Field::new("model.seed", "BAKECAST_MODEL_SEED", config.model.seed.to_string()),
        Field::new(
            "generation.language",
            "BAKECAST_GENERATION_LANGUAGE",
            config.generation.language.code(),
        ),
        Field::new(
            "generation.enhance_primary",
            "BAKECAST_GENERATION_ENHANCE_PRIMARY",
            config.generation.enhance_primary.to_string(),
        ),
        Field::new(
            "generation.fallback_trend_strength",
            "BAKECAST_GENERATION_FALLBACK_TREND_STRENGTH",
            config.generation.fallback_trend_strength.to_string(),
        ),
        Field::new(
            "context.tables_path",
            "BAKECAST_CONTEXT_TABLES_PATH",
            optional_path(&config.context.tables_path),
        ),
        Field::new("thresholds.path", "BAKECAST_THRESHOLDS_PATH", optional_path(&config.thresholds.path)),
        Field::new("logging.level", "BAKECAST_LOGGING_LEVEL", config.logging.level.as_str()),
        Field::new(
            "logging.format",
            "BAKECAST_LOGGING_FORMAT",
            format!("{:?}", config.logging.format).to_lowercase(),
        ),
    ]
}

fn detect_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then(|| path.to_path_buf());
    }

    [PathBuf::from("bakecast.toml"), PathBuf::from("config/bakecast.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if env::var_os(env_key).is_some() {
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

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
