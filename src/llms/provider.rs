//! The provider contract.
//!
//! Every backend turns a [`CompletionRequest`] into either a single
//! [`Response`] or a lazy [`ChunkStream`]. Providers never see the state
//! name; the client stamps it onto the response afterwards.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};

use super::error::ProviderError;
use crate::states::{ModulatedRequest, StateParameters};

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// A request a provider can complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub parameters: StateParameters,
    /// Overrides the provider's default model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl CompletionRequest {
    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    /// The model to use, falling back to `default`.
    pub fn model_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.model.as_deref().unwrap_or(default)
    }
}

impl From<ModulatedRequest> for CompletionRequest {
    fn from(req: ModulatedRequest) -> Self {
        Self {
            system_prompt: req.system_prompt,
            user_prompt: req.user_prompt,
            parameters: req.parameters,
            model: None,
        }
    }
}

/// Token accounting, normalized across vendors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl Usage {
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// A complete (non-streaming) answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub text: String,
    /// State name; empty when produced by a provider.
    pub state: String,
    /// Model that actually served the request.
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// One incremental piece of a streamed answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub done: bool,
}

impl Chunk {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            done: false,
        }
    }

    /// Terminal chunk with no text.
    pub fn done() -> Self {
        Self {
            text: String::new(),
            done: true,
        }
    }
}

/// Lazy sequence of chunks. Nothing is sent until the stream is polled.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<Chunk, ProviderError>> + Send>>;

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// A backend capable of completing or streaming a chat request.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider token, e.g. `"openai"`.
    fn name(&self) -> &str;

    /// Model used when the request carries no override.
    fn default_model(&self) -> &str;

    /// Single-shot completion.
    async fn complete(&self, request: &CompletionRequest) -> Result<Response, ProviderError>;

    /// Streaming completion.
    ///
    /// Yields `{text, done: false}` per fragment and a chunk with
    /// `done: true` when the backend signals completion. An error ends the
    /// stream after whatever was already yielded.
    fn stream(&self, request: &CompletionRequest) -> ChunkStream;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_from_modulated() {
        let req: CompletionRequest = ModulatedRequest {
            system_prompt: "sys".into(),
            user_prompt: "user".into(),
            parameters: StateParameters::with_temperature(0.9),
        }
        .into();
        let req = req.with_model(Some("m".into()));
        assert_eq!(req.model_or("default"), "m");
        assert_eq!(req.parameters.temperature, 0.9);

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["systemPrompt"], "sys");
        assert_eq!(json["userPrompt"], "user");
    }

    #[test]
    fn test_usage_totals() {
        let usage = Usage::new(12, 30);
        assert_eq!(usage.total_tokens, 42);
        let json = serde_json::to_value(usage).unwrap();
        assert_eq!(json["promptTokens"], 12);
        assert_eq!(json["completionTokens"], 30);
    }

    #[test]
    fn test_response_omits_missing_usage() {
        let resp = Response {
            text: "hi".into(),
            state: String::new(),
            model: "m".into(),
            usage: None,
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("usage").is_none());
    }
}
