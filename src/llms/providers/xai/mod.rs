//! xAI / Grok provider.
//!
//! The xAI API is OpenAI-compatible at `https://api.x.ai/v1`, so requests
//! and stream frames are handled by [`OpenAIProvider`].
//!
//! # Environment Variables
//!
//! - `XAI_API_KEY` - xAI API key

use async_trait::async_trait;

use super::openai::{CompatibleConfig, OpenAIProvider};
use super::ProviderOptions;
use crate::llms::error::ProviderError;
use crate::llms::provider::{ChunkStream, CompletionRequest, Provider, Response};

/// Default xAI API base URL.
pub const XAI_DEFAULT_BASE_URL: &str = "https://api.x.ai/v1";

pub const XAI: CompatibleConfig = CompatibleConfig {
    name: "xai",
    label: "xAI",
    env_var: "XAI_API_KEY",
    base_url: XAI_DEFAULT_BASE_URL,
    default_model: "grok-2-latest",
    penalties: true,
};

#[derive(Debug, Clone)]
pub struct XaiProvider {
    inner: OpenAIProvider,
}

impl XaiProvider {
    pub fn new(options: ProviderOptions) -> Self {
        Self {
            inner: OpenAIProvider::compatible(XAI, options),
        }
    }
}

#[async_trait]
impl Provider for XaiProvider {
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
