//! Crate-level error.

use thiserror::Error;

use crate::llms::ProviderError;
use crate::states::StateError;

/// Errors returned by [`MindRx`](crate::client::MindRx).
#[derive(Debug, Error)]
pub enum MindRxError {
    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

pub type Result<T, E = MindRxError> = std::result::Result<T, E>;
