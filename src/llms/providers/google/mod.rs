//! Google Gemini provider.
//!
//! Uses Gemini's OpenAI-compatible endpoint, so all wire handling is shared
//! with [`OpenAIProvider`]. The endpoint rejects `frequency_penalty` and
//! `presence_penalty`; those are dropped from requests.
//!
//! # Environment Variables
//!
//! - `GOOGLE_API_KEY` - Gemini API key

use async_trait::async_trait;

use super::openai::{CompatibleConfig, OpenAIProvider};
use super::ProviderOptions;
use crate::llms::error::ProviderError;
use crate::llms::provider::{ChunkStream, CompletionRequest, Provider, Response};

/// Gemini OpenAI-compatible base URL.
pub const GOOGLE_DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

pub const GOOGLE: CompatibleConfig = CompatibleConfig {
    name: "google",
    label: "Google",
    env_var: "GOOGLE_API_KEY",
    base_url: GOOGLE_DEFAULT_BASE_URL,
    default_model: "gemini-1.5-flash",
    penalties: false,
};

#[derive(Debug, Clone)]
pub struct GoogleProvider {
    inner: OpenAIProvider,
}

impl GoogleProvider {
    pub fn new(options: ProviderOptions) -> Self {
        Self {
            inner: OpenAIProvider::compatible(GOOGLE, options),
        }
    }
}

#[async_trait]
impl Provider for GoogleProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn default_model(&self) -> &str {
        self.inner.default_model()
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Response, ProviderError> {
        self.inner.complete(request).await
    }

    fn stream(&self, request: &CompletionRequest) -> ChunkStream {
        self.inner.stream(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::states::StateParameters;

    #[test]
    fn test_penalties_dropped() {
        let provider = OpenAIProvider::compatible(GOOGLE, ProviderOptions::default());
        let request = CompletionRequest {
            system_prompt: String::new(),
            user_prompt: "hi".into(),
            parameters: StateParameters {
                temperature: 1.0,
                top_p: Some(0.9),
                frequency_penalty: Some(0.5),
                presence_penalty: Some(0.5),
                max_tokens: None,
            },
            model: None,
        };
        let body = provider.build_request_body(&request, false);

        assert_eq!(body["model"], "gemini-1.5-flash");
        assert_eq!(body["top_p"], 0.9);
        assert!(body.get("frequency_penalty").is_none());
        assert!(body.get("presence_penalty").is_none());
    }

    #[test]
    fn test_defaults() {
        let provider = GoogleProvider::new(ProviderOptions::default());
        assert_eq!(provider.name(), "google");
        assert_eq!(provider.inner.base_url(), GOOGLE_DEFAULT_BASE_URL);
    }
}
