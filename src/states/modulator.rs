//! Prompt modulation: compose a system prompt from a state.

use serde::{Deserialize, Serialize};

use super::definition::{StateDefinition, StateParameters};

/// A prompt with a state applied, ready to hand to a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModulatedRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub parameters: StateParameters,
}

/// Stateless system-prompt composer.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptModulator;

impl PromptModulator {
    pub fn new() -> Self {
        Self
    }

    /// Apply `state` to `prompt`.
    ///
    /// The system prompt is the state's trimmed `system_prompt` followed by
    /// one paragraph of behavior guidance, separated by a blank line. Empty
    /// parts are left out entirely.
    pub fn modulate(&self, prompt: &str, state: &StateDefinition) -> ModulatedRequest {
        ModulatedRequest {
            system_prompt: self.build_system_prompt(state),
            user_prompt: prompt.to_string(),
            parameters: state.parameters.clone(),
        }
    }

    /// The state's trimmed prompt and its behavior guidance, blank-line separated.
    pub fn build_system_prompt(&self, state: &StateDefinition) -> String {
        let mut parts = Vec::with_capacity(2);

        let base = state.system_prompt.trim();
        if !base.is_empty() {
            parts.push(base.to_string());
        }

        let guidance = state.behavior.guidance();
        if !guidance.is_empty() {
            parts.push(guidance.join(" "));
        }

        parts.join("\n\n")
    }
}
