//! The orchestrating client.
//!
//! [`MindRx`] binds one [`StateEngine`] to one [`Provider`]. The provider is
//! built on first use, so constructing a client never touches the network
//! or checks credentials.
//!
//! ```no_run
//! # async fn demo() -> mindrx::error::Result<()> {
//! use mindrx::{MindRx, MindRxOptions};
//!
//! let mut rx = MindRx::new(MindRxOptions {
//!     state: Some("caffeine".into()),
//!     provider: Some("ollama".into()),
//!     ..Default::default()
//! });
//! let response = rx.run("Plan my morning").await?;
//! println!("[{}] {}", response.state, response.text);
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::llms::{
    create_provider, ChunkStream, CompletionRequest, Provider, ProviderError, ProviderOptions,
    Response,
};
use crate::states::{scale_intensity, StateDefinition, StateEngine, StateError, DEFAULT_STATE};

/// Provider token used when none is given.
pub const DEFAULT_PROVIDER: &str = "openai";

/// Options for [`MindRx::new`]. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MindRxOptions {
    /// Initial state name (default `sober`).
    pub state: Option<String>,
    /// Provider token (default `openai`).
    pub provider: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    /// Extra states registered before the initial state is selected.
    #[serde(default)]
    pub custom_states: Vec<StateDefinition>,
    /// When set, parameters are blended toward the neutral baseline by this
    /// factor before every request.
    pub intensity: Option<f64>,
}

pub struct MindRx {
    engine: StateEngine,
    provider: OnceCell<Arc<dyn Provider>>,
    provider_name: String,
    provider_options: ProviderOptions,
    model: Option<String>,
    current_state_name: String,
    intensity: Option<f64>,
}

impl std::fmt::Debug for MindRx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MindRx")
            .field("provider", &self.provider_name)
            .field("model", &self.model)
            .field("state", &self.current_state_name)
            .field("intensity", &self.intensity)
            .finish()
    }
}

impl MindRx {
    /// Client backed by the built-in states.
    pub fn new(options: MindRxOptions) -> Self {
        Self::with_engine(StateEngine::new(), options)
    }

    /// Client backed by an existing engine.
    pub fn with_engine(mut engine: StateEngine, options: MindRxOptions) -> Self {
        for state in options.custom_states {
            engine.register(state);
        }

        let current_state_name = options.state.unwrap_or_else(|| DEFAULT_STATE.to_string());
        if let Err(e) = engine.load(&current_state_name) {
            log::debug!("Initial state not selected: {}", e);
        }

        Self {
            engine,
            provider: OnceCell::new(),
            provider_name: options
                .provider
                .unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
            provider_options: ProviderOptions {
                api_key: options.api_key,
                base_url: options.base_url,
                model: options.model.clone(),
            },
            model: options.model,
            current_state_name,
            intensity: options.intensity,
        }
    }

    /// Use an already-built provider instead of the factory.
    pub fn with_provider(mut self, provider: Arc<dyn Provider>) -> Self {
        self.provider_name = provider.name().to_string();
        self.provider = OnceCell::with_value(provider);
        self
    }

    fn provider(&self) -> Result<&Arc<dyn Provider>, ProviderError> {
        self.provider
            .get_or_try_init(|| create_provider(&self.provider_name, self.provider_options.clone()))
    }

    /// Apply the current state and build the provider request.
    ///
    /// Returns the request and the name of the state that was applied.
    fn prepare(&mut self, prompt: &str) -> Result<(CompletionRequest, String)> {
        let modulated = self.engine.apply(prompt, None)?;
        let mut request = CompletionRequest::from(modulated).with_model(self.model.clone());
        if let Some(intensity) = self.intensity {
            request.parameters = scale_intensity(&request.parameters, intensity);
        }

        let state = self
            .engine
            .current()
            .map(|s| s.name.clone())
            .unwrap_or_else(|| self.current_state_name.clone());
        Ok((request, state))
    }

    // -----------------------------------------------------------------------
    // Entry points
    // -----------------------------------------------------------------------

    /// Complete `prompt` under the current state.
    pub async fn run(&mut self, prompt: &str) -> Result<Response> {
        let (request, state) = self.prepare(prompt)?;
        let provider = Arc::clone(self.provider()?);

        let mut response = provider.complete(&request).await?;
        response.state = state;
        Ok(response)
    }

    /// Stream `prompt` under the current state.
    ///
    /// Fails early only for state or provider-selection problems; transport
    /// errors arrive through the stream.
    pub fn stream(&mut self, prompt: &str) -> Result<ChunkStream> {
        let (request, _) = self.prepare(prompt)?;
        Ok(self.provider()?.stream(&request))
    }

    // -----------------------------------------------------------------------
    // State forwarders
    // -----------------------------------------------------------------------

    /// Select a state by name.
    pub fn set_state(&mut self, name: &str) -> Result<(), StateError> {
        self.engine.load(name)?;
        self.current_state_name = name.to_string();
        Ok(())
    }

    pub fn state(&self) -> Option<&StateDefinition> {
        self.engine.current()
    }

    pub fn state_name(&self) -> &str {
        &self.current_state_name
    }

    pub fn list_states(&self) -> Vec<String> {
        self.engine.list_names()
    }

    pub fn has_state(&self, name: &str) -> bool {
        self.engine.has(name)
    }

    pub fn register_state(&mut self, state: StateDefinition) -> bool {
        self.engine.register(state)
    }

    pub fn add_custom_state_dir(&mut self, dir: &Path) -> Result<usize, StateError> {
        self.engine.add_custom_state_dir(dir)
    }

    pub fn engine(&self) -> &StateEngine {
        &self.engine
    }

    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    pub fn set_intensity(&mut self, intensity: Option<f64>) {
        self.intensity = intensity;
    }
}
