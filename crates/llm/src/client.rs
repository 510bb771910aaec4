use std::env;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use memora_core::MemoraError;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::local::synthesize_local_response;
use crate::{GenerationRequest, TextGenerator};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAi,
    Local,
}

impl LlmProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "openai",
            LlmProvider::Local => "local",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "openai" => Some(LlmProvider::OpenAi),
            "local" | "offline" => Some(LlmProvider::Local),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl LlmResponse {
    pub fn total_tokens(&self) -> u32 {
        self.prompt_tokens.saturating_add(self.completion_tokens)
    }
}

#[derive(Clone)]
pub struct LlmClient {
    http: Client,
    model: String,
    config: ProviderConfig,
}

#[derive(Clone)]
enum ProviderConfig {
    OpenAi(OpenAiConfig),
    Local,
}

#[derive(Clone)]
struct OpenAiConfig {
    api_key: String,
    base_url: String,
}

impl LlmClient {
    /// Build a client for `provider`, reading `OPENAI_API_KEY` and
    /// `OPENAI_BASE_URL` from the environment when the provider needs them.
    pub fn new(provider: LlmProvider, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        match provider {
            LlmProvider::OpenAi => {
                let api_key = read_api_key("OPENAI_API_KEY")?;
                let base_url = env::var("OPENAI_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.to_string());
                Self::openai(api_key, base_url, model, timeout)
            }
            LlmProvider::Local => Ok(Self::local(model)),
        }
    }

    pub fn openai(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            http,
            model: model.into(),
            config: ProviderConfig::OpenAi(OpenAiConfig {
                api_key: api_key.into(),
                base_url: base_url.into(),
            }),
        })
    }

    /// Offline provider that answers from the prompt itself.
    pub fn local(model: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            model: model.into(),
            config: ProviderConfig::Local,
        }
    }

    pub fn provider(&self) -> LlmProvider {
        match self.config {
            ProviderConfig::OpenAi(_) => LlmProvider::OpenAi,
            ProviderConfig::Local => LlmProvider::Local,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn chat(&self, req: &GenerationRequest) -> Result<LlmResponse> {
        match &self.config {
            ProviderConfig::OpenAi(cfg) => self.chat_openai(cfg, req).await,
            ProviderConfig::Local => Ok(LlmResponse {
                content: synthesize_local_response(req),
                prompt_tokens: 0,
                completion_tokens: 0,
            }),
        }
    }

    async fn chat_openai(&self, cfg: &OpenAiConfig, req: &GenerationRequest) -> Result<LlmResponse> {
        let url = format!("{}/chat/completions", cfg.base_url.trim_end_matches('/'));
        let mut messages = Vec::new();
        if let Some(system) = &req.system {
            messages.push(json!({ "role": "system", "content": system }));
        }
        messages.push(json!({ "role": "user", "content": req.user }));
        let payload = json!({
            "model": self.model,
            "messages": messages,
        });
        let response = self
            .http
            .post(&url)
            .bearer_auth(&cfg.api_key)
            .json(&payload)
            .send()
            .await
            .context("openai request failed")?;
        let value = decode_openai_body(response).await?;
        let content = extract_openai_text(&value)
            .ok_or_else(|| anyhow!("missing text in OpenAI response"))?;
        let usage: OpenAiUsage = value
            .get("usage")
            .and_then(|value| serde_json::from_value(value.clone()).ok())
            .unwrap_or_default();
        Ok(LlmResponse {
            content,
            prompt_tokens: usage.prompt_tokens.unwrap_or(0),
            completion_tokens: usage.completion_tokens.unwrap_or(0),
        })
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn complete(&self, request: &GenerationRequest) -> memora_core::Result<String> {
        let response = self
            .chat(request)
            .await
            .map_err(|err| MemoraError::GenerationUnavailable(format!("{err:#}")))?;
        debug!(
            provider = self.provider().as_str(),
            model = %self.model,
            tokens = response.total_tokens(),
            "completion received"
        );
        Ok(response.content)
    }
}

async fn decode_openai_body(response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if !status.is_success() {
        return Err(anyhow!("openai returned error (status {status}): {body}"));
    }
    serde_json::from_str(&body).context("failed to decode openai response")
}

fn read_api_key(var: &str) -> Result<String> {
    let value = env::var(var).map_err(|_| anyhow!("{var} is not set"))?;
    validate_api_key(var, &value)?;
    Ok(value)
}

fn validate_api_key(var: &str, value: &str) -> Result<()> {
    if var.contains("OPENAI") && !value.starts_with("sk-") {
        return Err(anyhow!(
            "{var} must start with 'sk-' (see https://platform.openai.com/)"
        ));
    }
    Ok(())
}

fn extract_openai_text(value: &Value) -> Option<String> {
    let message = value.get("choices")?.as_array()?.first()?.get("message")?;
    let content = message.get("content")?;
    if let Some(text) = content.as_str() {
        return Some(text.to_string());
    }
    content
        .as_array()?
        .iter()
        .find_map(|part| part.get("text").and_then(|t| t.as_str()))
        .map(str::to_string)
}

#[derive(Default, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
}
