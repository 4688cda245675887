//! Server configuration from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;

use crate::states::StateRegistry;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_LOG_FILTER: &str = "info,mindrx=debug";

/// Configuration for the HTTP server.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// `PORT`
    pub port: u16,
    /// `MINDRX_STATES_DIR`: extra state files loaded over the built-ins.
    pub states_dir: Option<PathBuf>,
    /// `RUST_LOG`
    pub log_filter: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            states_dir: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl ServerConfig {
    /// Load from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT").filter(|v| !v.is_empty()) {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("PORT must be a port number, got {:?}", raw))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            port,
            states_dir: lookup("MINDRX_STATES_DIR")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            log_filter: lookup("RUST_LOG")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }

    /// Built-in states plus anything in `states_dir`.
    pub fn state_registry(&self) -> anyhow::Result<StateRegistry> {
        let mut registry = StateRegistry::with_builtin();
        if let Some(dir) = &self.states_dir {
            let loaded = registry
                .load_directory(dir)
                .with_context(|| format!("loading states from {}", dir.display()))?;
            log::info!("Loaded {} custom states from {}", loaded, dir.display());
        }
        Ok(registry)
    }
}
