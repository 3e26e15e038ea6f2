use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::env_or;
use crate::errors::LlmError;

const ANTHROPIC_MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Configuration for LLM service
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: usize,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "claude-sonnet-4-5-20250929".to_string(),
            max_tokens: 1500,
            temperature: 0.3,
            timeout: Duration::from_secs(60),
        }
    }
}

impl LlmConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: std::env::var("ANTHROPIC_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            model: std::env::var("AI_MODEL_NAME").unwrap_or(defaults.model),
            max_tokens: env_or("AI_MAX_TOKENS", defaults.max_tokens),
            temperature: env_or("AI_TEMPERATURE", defaults.temperature),
            timeout: Duration::from_secs(env_or("ANTHROPIC_API_TIMEOUT", 60)),
        }
    }
}

/// Trait for LLM providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a completion for `prompt` under the given system instructions.
    async fn generate_completion(&self, system: &str, prompt: String) -> Result<String, LlmError>;
}

/// Anthropic Messages API request/response structures
#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: usize,
    temperature: f32,
    system: &'a str,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

/// Anthropic provider implementation
pub struct AnthropicProvider {
    api_key: String,
    model: String,
    max_tokens: usize,
    temperature: f32,
    client: Client,
}

impl AnthropicProvider {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(LlmError::MissingApiKey)?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::NetworkError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            client,
        })
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    async fn generate_completion(&self, system: &str, prompt: String) -> Result<String, LlmError> {
        info!("Generating LLM completion (model: {}, max_tokens: {})", self.model, self.max_tokens);

        let request = AnthropicRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(ANTHROPIC_MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout
                } else {
                    LlmError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        match status.as_u16() {
            401 | 403 => return Err(LlmError::Unauthorized),
            429 => return Err(LlmError::RateLimited),
            _ if !status.is_success() => {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                return Err(LlmError::ApiError(format!("HTTP {}: {}", status, error_text)));
            }
            _ => {}
        }

        let body = response
            .json::<AnthropicResponse>()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        if let Some(usage) = &body.usage {
            info!(
                "LLM completion generated. Tokens: {} input + {} output",
                usage.input_tokens, usage.output_tokens
            );
        }

        extract_text(body)
    }
}

fn extract_text(body: AnthropicResponse) -> Result<String, LlmError> {
    let text = body
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect::<Vec<_>>()
        .join("\n");

    if text.trim().is_empty() {
        warn!("LLM response contained no text blocks");
        return Err(LlmError::InvalidResponse("No text content in response".to_string()));
    }
    Ok(text)
}
