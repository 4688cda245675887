//! # mindrx
//!
//! Cognitive state simulation for LLM agents.
//!
//! A *state* is a named bundle of sampling parameters and behavioral
//! guidance. The [`StateEngine`] turns a prompt plus the current state into a
//! modulated request, and a [`Provider`](llms::Provider) sends it to one of
//! several LLM backends, either as a single completion or as a stream of
//! chunks. [`MindRx`] ties the two together.
//!
//! - [`states`] - definitions, registry, prompt modulation, intensity scaling
//! - [`llms`] - provider contract, streaming decoder, backend adapters
//! - [`client`] - the [`MindRx`] client
//! - [`agents`] - saved agent presets and their storage
//! - [`server`] - axum HTTP surface
//! - [`cli`] - command-line surface

pub mod agents;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod llms;
pub mod server;
pub mod states;

pub use client::{MindRx, MindRxOptions};
pub use error::MindRxError;
pub use llms::{create_provider, Chunk, CompletionRequest, Provider, ProviderError, Response};
pub use states::{
    define_state, scale_intensity, DefineState, StateDefinition, StateEngine, StateError,
    StateRegistry,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
