//! LLM providers.
//!
//! - [`provider`] - The [`Provider`] contract and request/response types
//! - [`providers`] - Backend implementations and [`create_provider`]
//! - [`streaming`] - Shared decoding of streamed transports into chunks
//! - [`error`] - [`ProviderError`]

pub mod error;
pub mod provider;
pub mod providers;
pub mod streaming;

pub use error::ProviderError;
pub use provider::{Chunk, ChunkStream, CompletionRequest, Provider, Response, Usage};
pub use providers::{create_provider, ProviderName, ProviderOptions};
pub use streaming::{decode_chunks, Framing};
