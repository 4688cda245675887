//! Hosted MindRx backend.
//!
//! The default backend needs no credential. It is an Ollama-protocol server,
//! so the transport is [`OllamaProvider`]; responses report the model as
//! `"mindrx"` regardless of what served them.
//!
//! # Environment Variables
//!
//! - `MINDRX_BASE_URL` - override the hosted endpoint

use async_trait::async_trait;

use super::ollama::OllamaProvider;
use super::utils::resolve_base_url;
use super::ProviderOptions;
use crate::llms::error::ProviderError;
use crate::llms::provider::{ChunkStream, CompletionRequest, Provider, Response};

pub const MINDRX_DEFAULT_BASE_URL: &str = "http://72.60.110.67:11434";
pub const MINDRX_DEFAULT_MODEL: &str = "qwen2:0.5b";

#[derive(Debug, Clone)]
pub struct MindRxProvider {
    inner: OllamaProvider,
}

impl MindRxProvider {
    pub fn new(options: ProviderOptions) -> Self {
        let base_url = resolve_base_url(
            options.base_url,
            Some("MINDRX_BASE_URL"),
            MINDRX_DEFAULT_BASE_URL,
        );
        let model = options
            .model
            .unwrap_or_else(|| MINDRX_DEFAULT_MODEL.to_string());

        Self {
            inner: OllamaProvider::branded("mindrx", "MindRx", base_url, model, Some("mindrx")),
        }
    }
}

#[async_trait]
impl Provider for MindRxProvider {
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
