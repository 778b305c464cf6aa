use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bakecast_core::config::{LlmConfig, LlmProvider};
use bakecast_core::domain::recipe::Language;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};

use crate::prompt;

/// Linear backoff step between retried generator calls.
const RETRY_BACKOFF: Duration = Duration::from_millis(250);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self { temperature: 0.7, max_tokens: 2048 }
    }
}

impl From<&LlmConfig> for GenerationOptions {
    fn from(config: &LlmConfig) -> Self {
        Self { temperature: config.temperature, max_tokens: config.max_output_tokens }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("generator timed out")]
    Timeout,
    #[error("generator blocked the response: {0}")]
    Blocked(String),
    #[error("generator transport failure: {0}")]
    Transport(String),
    #[error("generator returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("generator returned no text")]
    Empty,
    #[error("generator is misconfigured: {0}")]
    Configuration(String),
}

impl GenerationError {
    /// Timeouts and server-side failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout => true,
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Blocked(_) => "blocked",
            Self::Transport(_) => "transport",
            Self::Status { .. } => "status",
            Self::Empty => "empty",
            Self::Configuration(_) => "configuration",
        }
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        options: GenerationOptions,
    ) -> Result<String, GenerationError>;
}

#[async_trait]
pub trait Translator: Send + Sync {
    /// Returns `text` unchanged when no translation is needed or possible.
    async fn translate(&self, text: &str, source: Language, target: Language) -> String;
}

#[async_trait]
pub trait Enhancer: Send + Sync {
    async fn enhance(&self, raw: &str) -> String;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopTranslator;

#[async_trait]
impl Translator for NoopTranslator {
    async fn translate(&self, text: &str, _source: Language, _target: Language) -> String {
        text.to_string()
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopEnhancer;

#[async_trait]
impl Enhancer for NoopEnhancer {
    async fn enhance(&self, raw: &str) -> String {
        raw.to_string()
    }
}

/// Translation through the configured generator. Failures keep the source text.
#[derive(Clone)]
pub struct LlmTranslator {
    client: Arc<dyn LlmClient>,
    max_tokens: u32,
}

impl LlmTranslator {
    pub fn new(client: Arc<dyn LlmClient>, max_tokens: u32) -> Self {
        Self { client, max_tokens }
    }
}

#[async_trait]
impl Translator for LlmTranslator {
    async fn translate(&self, text: &str, source: Language, target: Language) -> String {
        if source == target || text.trim().is_empty() {
            return text.to_string();
        }

        let budget = u32::try_from(text.len().saturating_mul(2)).unwrap_or(u32::MAX);
        let options = GenerationOptions { temperature: 0.2, max_tokens: budget.min(self.max_tokens) };
        match self.client.generate(&prompt::translation_prompt(text, source, target), options).await {
            Ok(translated) => translated.trim().to_string(),
            Err(error) => {
                warn!(
                    event_name = "generation.translate.failed",
                    error_kind = error.kind(),
                    error = %error,
                    "translation failed; keeping source text"
                );
                text.to_string()
            }
        }
    }
}

/// Rewrites loosely structured output into the recipe JSON shape. Failures keep the input.
#[derive(Clone)]
pub struct LlmEnhancer {
    client: Arc<dyn LlmClient>,
    language: Language,
    options: GenerationOptions,
}

impl LlmEnhancer {
    pub fn new(client: Arc<dyn LlmClient>, language: Language, options: GenerationOptions) -> Self {
        Self { client, language, options }
    }
}

#[async_trait]
impl Enhancer for LlmEnhancer {
    async fn enhance(&self, raw: &str) -> String {
        if raw.trim().is_empty() {
            return raw.to_string();
        }
        match self.client.generate(&prompt::enhancement_prompt(raw, self.language), self.options).await
        {
            Ok(enhanced) => enhanced,
            Err(error) => {
                warn!(
                    event_name = "generation.enhance.failed",
                    error_kind = error.kind(),
                    error = %error,
                    "enhancement failed; keeping raw output"
                );
                raw.to_string()
            }
        }
    }
}

/// reqwest-backed client for the configured provider.
pub struct HttpLlmClient {
    http: reqwest::Client,
    provider: LlmProvider,
    base_url: String,
    model: String,
    api_key: Option<SecretString>,
    max_retries: u32,
}

impl HttpLlmClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, GenerationError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| GenerationError::Configuration(error.to_string()))?;
        let base_url = config.resolved_base_url();

        Ok(Self {
            http,
            provider: config.provider,
            base_url,
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            max_retries: config.max_retries,
        })
    }

    pub fn provider(&self) -> LlmProvider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn api_key(&self) -> Result<&str, GenerationError> {
        self.api_key.as_ref().map(|key| key.expose_secret()).ok_or_else(|| {
            GenerationError::Configuration(format!(
                "{} provider requires llm.api_key",
                self.provider.as_str()
            ))
        })
    }

    async fn send_once(
        &self,
        prompt: &str,
        options: GenerationOptions,
    ) -> Result<String, GenerationError> {
        let text = match self.provider {
            LlmProvider::Gemini => self.gemini(prompt, options).await?,
            LlmProvider::OpenAi => self.openai(prompt, options).await?,
            LlmProvider::Ollama => self.ollama(prompt, options).await?,
        };
        if text.trim().is_empty() {
            return Err(GenerationError::Empty);
        }
        Ok(text)
    }

    async fn post<T>(&self, request: reqwest::RequestBuilder) -> Result<T, GenerationError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let response = request.send().await.map_err(map_transport)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status { status: status.as_u16(), body });
        }
        response.json::<T>().await.map_err(map_transport)
    }

    async fn gemini(&self, prompt: &str, options: GenerationOptions) -> Result<String, GenerationError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": options.temperature,
                "maxOutputTokens": options.max_tokens,
            },
        });
        let request = self.http.post(url).header("x-goog-api-key", self.api_key()?).json(&body);
        let response: GeminiResponse = self.post(request).await?;

        if let Some(reason) = response.prompt_feedback.and_then(|feedback| feedback.block_reason) {
            return Err(GenerationError::Blocked(reason));
        }
        let candidate = response.candidates.into_iter().next().ok_or(GenerationError::Empty)?;
        if matches!(candidate.finish_reason.as_deref(), Some("SAFETY" | "BLOCKLIST" | "PROHIBITED_CONTENT")) {
            return Err(GenerationError::Blocked(candidate.finish_reason.unwrap_or_default()));
        }
        Ok(candidate
            .content
            .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
            .unwrap_or_default())
    }

    async fn openai(&self, prompt: &str, options: GenerationOptions) -> Result<String, GenerationError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": options.temperature,
            "max_tokens": options.max_tokens,
        });
        let request = self.http.post(url).bearer_auth(self.api_key()?).json(&body);
        let response: OpenAiResponse = self.post(request).await?;

        let choice = response.choices.into_iter().next().ok_or(GenerationError::Empty)?;
        if choice.finish_reason.as_deref() == Some("content_filter") {
            return Err(GenerationError::Blocked("content_filter".to_string()));
        }
        Ok(choice.message.content.unwrap_or_default())
    }

    async fn ollama(&self, prompt: &str, options: GenerationOptions) -> Result<String, GenerationError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = OllamaGenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: OllamaOptions { temperature: options.temperature, num_predict: options.max_tokens },
        };
        let response: OllamaGenerateResponse = self.post(self.http.post(url).json(&body)).await?;
        Ok(response.response)
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn generate(
        &self,
        prompt: &str,
        options: GenerationOptions,
    ) -> Result<String, GenerationError> {
        let mut attempt = 0;
        loop {
            debug!(
                provider = self.provider.as_str(),
                model = %self.model,
                attempt,
                prompt_chars = prompt.chars().count(),
                "sending generation request"
            );
            match self.send_once(prompt, options).await {
                Err(error) if error.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        event_name = "llm.request.retry",
                        provider = self.provider.as_str(),
                        attempt,
                        error = %error,
                        "retrying generation request"
                    );
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                }
                result => return result,
            }
        }
    }
}

fn map_transport(error: reqwest::Error) -> GenerationError {
    if error.is_timeout() {
        GenerationError::Timeout
    } else {
        GenerationError::Transport(error.to_string())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    #[serde(default)]
    response: String,
}
