//! State subsystem errors.

use thiserror::Error;

/// Errors raised while loading, validating, or resolving states.
#[derive(Debug, Error)]
pub enum StateError {
    /// No state is registered under this name.
    #[error("State \"{name}\" not found. Available: {}", .available.join(", "))]
    NotFound {
        name: String,
        available: Vec<String>,
    },

    /// Structured input could not be turned into a definition.
    #[error("Invalid state definition: {0}")]
    Invalid(String),

    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing failed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_lists_available() {
        let err = StateError::NotFound {
            name: "nope".into(),
            available: vec!["sober".into(), "lsd".into()],
        };
        assert_eq!(err.to_string(), "State \"nope\" not found. Available: sober, lsd");
    }
}
