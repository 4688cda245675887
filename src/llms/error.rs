//! Provider errors.

use thiserror::Error;

/// Errors surfaced by [`Provider`](super::provider::Provider) implementations.
///
/// Nothing here is retried. A failure mid-stream ends the stream after the
/// chunks that were already yielded.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The backend answered with a non-success HTTP status.
    #[error("{provider} API error: {status} - {body}")]
    Http {
        provider: String,
        status: u16,
        body: String,
    },

    /// No credential was passed explicitly or found in the environment.
    #[error("{provider} API key not set. Pass an api key or set the {env_var} environment variable")]
    MissingCredential {
        provider: String,
        env_var: &'static str,
    },

    /// Network-level failure (connect, TLS, body read).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A complete (non-streaming) response body could not be parsed.
    #[error("Failed to decode {provider} response: {message}")]
    Decode { provider: String, message: String },

    /// The backend sent an explicit error event inside a stream.
    #[error("{provider} stream error: {message}")]
    Stream { provider: String, message: String },

    /// The factory was given a token it does not recognize.
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),
}

impl ProviderError {
    /// HTTP status captured from the backend, if this is an HTTP error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_message_and_status() {
        let err = ProviderError::Http {
            provider: "MindRx".into(),
            status: 503,
            body: "overloaded".into(),
        };
        assert_eq!(err.to_string(), "MindRx API error: 503 - overloaded");
        assert_eq!(err.status(), Some(503));
    }

    #[test]
    fn test_unknown_provider_has_no_status() {
        let err = ProviderError::UnknownProvider("cohere".into());
        assert_eq!(err.to_string(), "Unknown provider: cohere");
        assert_eq!(err.status(), None);
    }
}
