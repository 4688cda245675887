//! Provider implementations and the factory that selects one by name.
//!
//! # Available Providers
//!
//! | Token | Module | Wire format | Credential |
//! |-------|--------|-------------|------------|
//! | `mindrx` | [`mindrx`] | Ollama `/api/chat`, NDJSON | none |
//! | `ollama` | [`ollama`] | Ollama `/api/chat`, NDJSON | none |
//! | `openai` | [`openai`] | Chat Completions, SSE | `OPENAI_API_KEY` |
//! | `anthropic` | [`anthropic`] | Messages API, SSE | `ANTHROPIC_API_KEY` |
//! | `google` | [`google`] | Chat Completions (compatible), SSE | `GOOGLE_API_KEY` |
//! | `xai` | [`xai`] | Chat Completions (compatible), SSE | `XAI_API_KEY` |

pub mod anthropic;
pub mod google;
pub mod mindrx;
pub mod ollama;
pub mod openai;
pub mod utils;
pub mod xai;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::error::ProviderError;
use super::provider::Provider;

pub use anthropic::AnthropicProvider;
pub use google::GoogleProvider;
pub use mindrx::MindRxProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAIProvider;
pub use xai::XaiProvider;

/// Construction options shared by every provider. All optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderOptions {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
}

/// Known provider tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderName {
    MindRx,
    Ollama,
    OpenAI,
    Anthropic,
    Google,
    Xai,
}

impl ProviderName {
    pub const ALL: [ProviderName; 6] = [
        Self::MindRx,
        Self::Ollama,
        Self::OpenAI,
        Self::Anthropic,
        Self::Google,
        Self::Xai,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::MindRx => "mindrx",
            Self::Ollama => "ollama",
            Self::OpenAI => "openai",
            Self::Anthropic => "anthropic",
            Self::Google => "google",
            Self::Xai => "xai",
        }
    }
}

impl fmt::Display for ProviderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderName {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| ProviderError::UnknownProvider(s.to_string()))
    }
}

/// Construct a provider from its token.
///
/// Construction performs no network I/O and does not validate credentials;
/// a missing API key surfaces on the first request.
pub fn create_provider(
    name: &str,
    options: ProviderOptions,
) -> Result<Arc<dyn Provider>, ProviderError> {
    let name: ProviderName = name.parse()?;
    log::debug!("Creating provider {}", name);

    let provider: Arc<dyn Provider> = match name {
        ProviderName::MindRx => Arc::new(MindRxProvider::new(options)),
        ProviderName::Ollama => Arc::new(OllamaProvider::new(options)),
        ProviderName::OpenAI => Arc::new(OpenAIProvider::new(options)),
        ProviderName::Anthropic => Arc::new(AnthropicProvider::new(options)),
        ProviderName::Google => Arc::new(GoogleProvider::new(options)),
        ProviderName::Xai => Arc::new(XaiProvider::new(options)),
    };
    Ok(provider)
}
