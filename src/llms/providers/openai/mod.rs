//! OpenAI Chat Completions provider.
//!
//! Talks to `POST {base_url}/chat/completions` with `reqwest`. The same wire
//! format is served by several other vendors, so the provider is
//! parameterized by a [`CompatibleConfig`]; [`google`](super::google) and
//! [`xai`](super::xai) are thin wrappers over it.
//!
//! # Environment Variables
//!
//! - `OPENAI_API_KEY` - OpenAI API key (used when none is passed explicitly)

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::utils::{chat_messages, error_message, read_json, resolve_base_url, resolve_credential};
use super::ProviderOptions;
use crate::llms::error::ProviderError;
use crate::llms::provider::{Chunk, ChunkStream, CompletionRequest, Provider, Response, Usage};
use crate::llms::streaming::{failed_stream, open_stream, Framing};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default OpenAI API base URL.
pub const OPENAI_DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default OpenAI model.
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Vendor settings for an OpenAI-compatible endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompatibleConfig {
    /// Provider token reported by [`Provider::name`].
    pub name: &'static str,
    /// Human-readable vendor name used in errors.
    pub label: &'static str,
    /// Environment variable holding the API key.
    pub env_var: &'static str,
    pub base_url: &'static str,
    pub default_model: &'static str,
    /// Whether the endpoint accepts `frequency_penalty` / `presence_penalty`.
    pub penalties: bool,
}

/// OpenAI itself.
pub const OPENAI: CompatibleConfig = CompatibleConfig {
    name: "openai",
    label: "OpenAI",
    env_var: "OPENAI_API_KEY",
    base_url: OPENAI_DEFAULT_BASE_URL,
    default_model: OPENAI_DEFAULT_MODEL,
    penalties: true,
};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: ChatMessage,
}

#[derive(Debug, Default, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Compatible servers often report only some of the counts.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChatUsage {
    prompt_tokens: Option<u64>,
    completion_tokens: Option<u64>,
    total_tokens: Option<u64>,
}

impl ChatUsage {
    fn into_usage(self) -> Option<Usage> {
        if self.prompt_tokens.is_none() && self.completion_tokens.is_none() {
            return None;
        }
        let mut usage = Usage::new(
            self.prompt_tokens.unwrap_or(0),
            self.completion_tokens.unwrap_or(0),
        );
        if let Some(total) = self.total_tokens {
            usage.total_tokens = total;
        }
        Some(usage)
    }
}

// ---------------------------------------------------------------------------
// OpenAIProvider
// ---------------------------------------------------------------------------

/// Provider for OpenAI and OpenAI-compatible Chat Completions endpoints.
///
/// The API key is resolved at construction (explicit option, then the
/// configured environment variable) but only checked when a request is made.
#[derive(Debug, Clone)]
pub struct OpenAIProvider {
    config: CompatibleConfig,
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl OpenAIProvider {
    /// Create a provider for api.openai.com.
    pub fn new(options: ProviderOptions) -> Self {
        Self::compatible(OPENAI, options)
    }

    /// Create a provider for any OpenAI-compatible endpoint.
    pub fn compatible(config: CompatibleConfig, options: ProviderOptions) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            api_key: resolve_credential(options.api_key, config.env_var),
            base_url: resolve_base_url(options.base_url, None, config.base_url),
            model: options.model.unwrap_or_else(|| config.default_model.to_string()),
        }
    }

    pub fn config(&self) -> &CompatibleConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the JSON body for `/chat/completions`.
    pub fn build_request_body(&self, request: &CompletionRequest, stream: bool) -> Value {
        let params = &request.parameters;
        let mut body = json!({
            "model": request.model_or(&self.model),
            "messages": chat_messages(request),
            "temperature": params.temperature,
            "stream": stream,
        });

        if let Some(top_p) = params.top_p {
            body["top_p"] = json!(top_p);
        }
        if self.config.penalties {
            if let Some(penalty) = params.frequency_penalty {
                body["frequency_penalty"] = json!(penalty);
            }
            if let Some(penalty) = params.presence_penalty {
                body["presence_penalty"] = json!(penalty);
            }
        }
        if let Some(max_tokens) = params.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }

        body
    }

    fn post(&self, body: &Value) -> Result<reqwest::RequestBuilder, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::MissingCredential {
                provider: self.config.label.to_string(),
                env_var: self.config.env_var,
            })?;

        Ok(self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", api_key))
            .json(body))
    }
}

#[async_trait]
impl Provider for OpenAIProvider {
    fn name(&self) -> &str {
        self.config.name
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Response, ProviderError> {
        let model = request.model_or(&self.model).to_string();
        log::debug!("{} complete: model={}", self.config.label, model);

        let body = self.build_request_body(request, false);
        let response = self.post(&body)?.send().await?;
        let completion: ChatCompletion = read_json(self.config.label, response).await?;

        let text = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        Ok(Response {
            text,
            state: String::new(),
            model,
            usage: completion.usage.and_then(ChatUsage::into_usage),
        })
    }

    fn stream(&self, request: &CompletionRequest) -> ChunkStream {
        log::debug!(
            "{} stream: model={}",
            self.config.label,
            request.model_or(&self.model)
        );

        let body = self.build_request_body(request, true);
        let builder = match self.post(&body) {
            Ok(builder) => builder,
            Err(e) => return failed_stream(e),
        };

        let label = self.config.label;
        open_stream(
            label,
            async move { builder.send().await },
            Framing::ServerSentEvents,
            move |data| parse_frame(label, data),
        )
    }
}

/// Parse one SSE `data:` payload from a Chat Completions stream.
///
/// Yields when the delta has text or the choice has a `finish_reason`.
pub fn parse_frame(label: &str, data: &str) -> Result<Option<Chunk>, ProviderError> {
    let Ok(value) = serde_json::from_str::<Value>(data) else {
        return Ok(None);
    };

    if let Some(error) = value.get("error") {
        return Err(ProviderError::Stream {
            provider: label.to_string(),
            message: error_message(error),
        });
    }

    let Some(choice) = value.get("choices").and_then(|c| c.get(0)) else {
        return Ok(None);
    };

    let text = choice["delta"]["content"].as_str().unwrap_or_default();
    let done = !choice["finish_reason"].is_null();

    if text.is_empty() && !done {
        Ok(None)
    } else {
        Ok(Some(Chunk {
            text: text.to_string(),
            done,
        }))
    }
}
