//! Saved agents.
//!
//! An [`Agent`] is a named preset: provider, model, state, intensity and a
//! system prompt. Storage sits behind the [`AgentRepository`] trait so the
//! in-memory store can be swapped for a database without touching callers.

pub mod repository;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::states::{StateDefinition, DEFAULT_STATE};

pub use repository::{AgentRepository, InMemoryAgentRepository};

/// Intensity given to agents created without one.
pub const DEFAULT_INTENSITY: f64 = 0.5;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum AgentError {
    /// A create request lacked one or more required fields.
    #[error("Missing required fields: name, provider, model, systemPrompt")]
    MissingFields,

    #[error("Agent not found: {0}")]
    NotFound(String),
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Provider token, e.g. `"ollama"`.
    pub provider: String,
    pub model: String,
    pub state: String,
    pub intensity: f64,
    pub system_prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_state: Option<StateDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create request. `name`, `provider`, `model` and `systemPrompt` are
/// required and must be non-empty.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAgent {
    pub name: Option<String>,
    pub description: Option<String>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub state: Option<String>,
    pub intensity: Option<f64>,
    pub system_prompt: Option<String>,
    pub custom_state: Option<StateDefinition>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

impl NewAgent {
    /// Validate and build an agent with a fresh `agent_<uuid>` id.
    pub fn into_agent(self) -> Result<Agent, AgentError> {
        let (Some(name), Some(provider), Some(model), Some(system_prompt)) = (
            non_empty(self.name),
            non_empty(self.provider),
            non_empty(self.model),
            non_empty(self.system_prompt),
        ) else {
            return Err(AgentError::MissingFields);
        };

        let now = Utc::now();
        Ok(Agent {
            id: format!("agent_{}", Uuid::new_v4().simple()),
            name,
            description: self.description.unwrap_or_default(),
            provider,
            model,
            state: non_empty(self.state).unwrap_or_else(|| DEFAULT_STATE.to_string()),
            intensity: self.intensity.unwrap_or(DEFAULT_INTENSITY),
            system_prompt,
            custom_state: self.custom_state,
            api_key: self.api_key,
            base_url: self.base_url,
            created_at: now,
            updated_at: now,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Partial update. Absent fields keep their value; `id` and `createdAt`
/// cannot be changed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub state: Option<String>,
    pub intensity: Option<f64>,
    pub system_prompt: Option<String>,
    pub custom_state: Option<StateDefinition>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

impl AgentPatch {
    pub fn apply(self, agent: &mut Agent) {
        if let Some(name) = self.name {
            agent.name = name;
        }
        if let Some(description) = self.description {
            agent.description = description;
        }
        if let Some(provider) = self.provider {
            agent.provider = provider;
        }
        if let Some(model) = self.model {
            agent.model = model;
        }
        if let Some(state) = self.state {
            agent.state = state;
        }
        if let Some(intensity) = self.intensity {
            agent.intensity = intensity;
        }
        if let Some(system_prompt) = self.system_prompt {
            agent.system_prompt = system_prompt;
        }
        if self.custom_state.is_some() {
            agent.custom_state = self.custom_state;
        }
        if self.api_key.is_some() {
            agent.api_key = self.api_key;
        }
        if self.base_url.is_some() {
            agent.base_url = self.base_url;
        }
        agent.updated_at = Utc::now();
    }
}
