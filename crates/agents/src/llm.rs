//! Chat-completion transport for the analysis agents.
//!
//! One OpenAI-compatible HTTP provider behind the [`ChatProvider`]
//! trait; agents receive the provider by injection so tests can swap in
//! scripted fakes. Structured responses are parsed here as well, after
//! stripping the markdown fences and stray prose models like to wrap
//! JSON in.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::error::{AgentError, Result};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_FAST_MODEL: &str = "gpt-4o-mini";
const DEFAULT_CAPABLE_MODEL: &str = "gpt-4";

fn env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Connection settings for the completion service.
///
/// Built once at startup and validated before any pipeline stage runs;
/// a missing or malformed credential is a fatal precondition failure,
/// not something discovered mid-analysis.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub fast_model: String,
    pub capable_model: String,
}

impl LlmConfig {
    /// Load configuration from the environment and validate it.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| AgentError::Config("OPENAI_API_KEY is not set".into()))?;

        let config = Self {
            api_key,
            base_url: env_or_default("DOCLENS_BASE_URL", DEFAULT_BASE_URL),
            fast_model: env_or_default("DOCLENS_FAST_MODEL", DEFAULT_FAST_MODEL),
            capable_model: env_or_default("DOCLENS_CAPABLE_MODEL", DEFAULT_CAPABLE_MODEL),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject credentials that cannot possibly work.
    pub fn validate(&self) -> Result<()> {
        if !self.api_key.starts_with("sk-") {
            return Err(AgentError::Config(
                "OPENAI_API_KEY does not look like a valid key (expected an sk- prefix)".into(),
            ));
        }
        Ok(())
    }
}

/// Which model class a request should go to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    /// Cheap model for structural triage
    Fast,
    /// Stronger model for detailed analysis
    Capable,
}

/// Per-request completion options
#[derive(Debug, Clone, Copy)]
pub struct ChatOptions {
    pub tier: ModelTier,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl ChatOptions {
    pub fn fast(temperature: f32, max_tokens: u32) -> Self {
        Self {
            tier: ModelTier::Fast,
            temperature,
            max_tokens,
        }
    }

    pub fn capable(temperature: f32, max_tokens: u32) -> Self {
        Self {
            tier: ModelTier::Capable,
            temperature,
            max_tokens,
        }
    }
}

/// The completion transport the agents call.
///
/// A request either yields the model's text or an error; retry and
/// timeout policy belong to the implementation, not the callers.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn complete(&self, prompt: &str, options: ChatOptions) -> Result<String>;
}

/// [`ChatProvider`] over an OpenAI-compatible chat-completions endpoint
pub struct OpenAiProvider {
    client: reqwest::Client,
    config: LlmConfig,
}

impl OpenAiProvider {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Fast => &self.config.fast_model,
            ModelTier::Capable => &self.config.capable_model,
        }
    }
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    async fn complete(&self, prompt: &str, options: ChatOptions) -> Result<String> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let request = ChatCompletionRequest {
            model: self.model_for(options.tier).to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        debug!(
            "Requesting completion ({}, {} prompt chars)",
            request.model,
            prompt.len()
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Provider(format!(
                "completion request failed with {}: {}",
                status, body
            )));
        }

        let completion: ChatCompletionResponse = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| AgentError::Provider("completion response had no choices".into()))
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// Parse a model response that was asked to be JSON.
///
/// The payload is normalized first; anything that still fails serde is
/// a [`AgentError::Parse`] for the caller's fallback logic.
pub fn parse_structured<T: DeserializeOwned>(payload: &str) -> Result<T> {
    let cleaned = normalize_json_payload(payload);
    serde_json::from_str(&cleaned)
        .map_err(|e| AgentError::Parse(format!("invalid JSON payload: {}", e)))
}

/// Strip markdown fences and surrounding prose down to the outermost
/// JSON object.
fn normalize_json_payload(payload: &str) -> String {
    let trimmed = payload.trim();
    if trimmed.is_empty() {
        return trimmed.to_string();
    }

    let without_fence = if trimmed.starts_with("```") {
        let mut lines = trimmed.lines();
        let _ = lines.next(); // drop ``` or ```json
        let mut content = lines.collect::<Vec<_>>().join("\n");
        if content.ends_with("```") {
            content.truncate(content.len().saturating_sub(3));
        }
        content.trim().to_string()
    } else {
        trimmed.to_string()
    };

    if let (Some(start), Some(end)) = (without_fence.find('{'), without_fence.rfind('}')) {
        if start < end {
            return without_fence[start..=end].to_string();
        }
    }

    without_fence
}
