//! Cognitive state definitions.
//!
//! A [`StateDefinition`] bundles sampling parameters ([`StateParameters`])
//! with four categorical behavior knobs ([`StateBehavior`]) and a raw
//! system prompt. Definitions are plain data: they are validated once on
//! their way into the [`StateRegistry`](super::registry::StateRegistry) and
//! never mutated afterwards.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Temperature used when a definition does not specify one.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

// ---------------------------------------------------------------------------
// StateParameters
// ---------------------------------------------------------------------------

/// Sampling knobs forwarded to the provider.
///
/// `temperature` is always present. Absent optional fields mean "use the
/// provider default" and are never serialized as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateParameters {
    pub temperature: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl StateParameters {
    /// Parameters with only a temperature set.
    pub fn with_temperature(temperature: f64) -> Self {
        Self {
            temperature,
            top_p: None,
            frequency_penalty: None,
            presence_penalty: None,
            max_tokens: None,
        }
    }
}

impl Default for StateParameters {
    fn default() -> Self {
        Self::with_temperature(DEFAULT_TEMPERATURE)
    }
}

// ---------------------------------------------------------------------------
// Behavior axes
// ---------------------------------------------------------------------------

/// How tightly ideas follow from one another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Association {
    Tight,
    #[default]
    Normal,
    Loose,
    Fragmented,
}

impl Association {
    /// Guidance sentence for this value; `Normal` contributes nothing.
    pub fn guidance(self) -> Option<&'static str> {
        match self {
            Self::Tight => Some("Stay closely focused on the topic. Avoid tangents."),
            Self::Normal => None,
            Self::Loose => Some("Allow your thoughts to wander to related topics."),
            Self::Fragmented => Some("Let ideas emerge disconnected, jumping between concepts."),
        }
    }
}

/// How logically consistent the output stays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Coherence {
    Strict,
    #[default]
    Normal,
    Drifting,
    Dissolving,
}

impl Coherence {
    /// Guidance sentence for this value; `Normal` contributes nothing.
    pub fn guidance(self) -> Option<&'static str> {
        match self {
            Self::Strict => Some("Maintain strict logical consistency throughout."),
            Self::Normal => None,
            Self::Drifting => {
                Some("Let coherence drift occasionally. Some ideas may not fully connect.")
            }
            Self::Dissolving => Some("Coherence is optional. Embrace contradiction and paradox."),
        }
    }
}

/// Speed and rhythm of thought.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pacing {
    Slow,
    #[default]
    Normal,
    Fast,
    Erratic,
}

impl Pacing {
    /// Guidance sentence for this value; `Normal` contributes nothing.
    pub fn guidance(self) -> Option<&'static str> {
        match self {
            Self::Slow => Some("Take your time. Pause between thoughts. Be deliberate."),
            Self::Normal => None,
            Self::Fast => Some("Move quickly between ideas. Keep momentum high."),
            Self::Erratic => Some("Vary your pacing unpredictably. Speed up, slow down, pause."),
        }
    }
}

/// Self-assurance of the voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    #[default]
    Normal,
    High,
    Inflated,
}

impl Confidence {
    /// Guidance sentence for this value; `Normal` contributes nothing.
    pub fn guidance(self) -> Option<&'static str> {
        match self {
            Self::Low => Some("Express uncertainty. Question your own assertions."),
            Self::Normal => None,
            Self::High => Some("Speak with conviction. Trust your insights."),
            Self::Inflated => Some("You are certain. Your ideas are brilliant. Express this."),
        }
    }
}

/// The four behavior axes. Every axis defaults to `normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StateBehavior {
    pub association: Association,
    pub coherence: Coherence,
    pub pacing: Pacing,
    pub confidence: Confidence,
}

impl StateBehavior {
    /// Guidance sentences in axis order, skipping `normal` axes.
    pub fn guidance(&self) -> Vec<&'static str> {
        [
            self.association.guidance(),
            self.coherence.guidance(),
            self.pacing.guidance(),
            self.confidence.guidance(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

// ---------------------------------------------------------------------------
// StateDefinition
// ---------------------------------------------------------------------------

/// A named cognitive state profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDefinition {
    /// Registry key. Unique and non-empty.
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: StateParameters,
    #[serde(default)]
    pub behavior: StateBehavior,
    #[serde(default)]
    pub system_prompt: String,
}

/// Name/description pair for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateInfo {
    pub name: String,
    pub description: String,
}

impl From<&StateDefinition> for StateInfo {
    fn from(state: &StateDefinition) -> Self {
        Self {
            name: state.name.clone(),
            description: state.description.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// define_state
// ---------------------------------------------------------------------------

/// Partial parameter set accepted by [`define_state`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialParameters {
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub frequency_penalty: Option<f64>,
    pub presence_penalty: Option<f64>,
    pub max_tokens: Option<u32>,
}

/// Partial behavior set accepted by [`define_state`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialBehavior {
    pub association: Option<Association>,
    pub coherence: Option<Coherence>,
    pub pacing: Option<Pacing>,
    pub confidence: Option<Confidence>,
}

/// Input for [`define_state`]: only `name` and `system_prompt` are required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefineState {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: PartialParameters,
    #[serde(default)]
    pub behavior: PartialBehavior,
    #[serde(alias = "systemPrompt")]
    pub system_prompt: String,
}

/// Build a complete definition, filling omitted fields with the same
/// defaults the registry applies.
///
/// ```
/// use mindrx::states::{define_state, DefineState, Pacing, PartialBehavior};
///
/// let state = define_state(DefineState {
///     name: "rushed".into(),
///     behavior: PartialBehavior { pacing: Some(Pacing::Fast), ..Default::default() },
///     system_prompt: "You are late for a meeting.".into(),
///     ..Default::default()
/// });
/// assert_eq!(state.parameters.temperature, 0.7);
/// assert_eq!(state.behavior.pacing, Pacing::Fast);
/// ```
pub fn define_state(input: DefineState) -> StateDefinition {
    let p = input.parameters;
    let b = input.behavior;
    StateDefinition {
        name: input.name,
        description: input.description.unwrap_or_default(),
        parameters: StateParameters {
            temperature: p.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            top_p: p.top_p,
            frequency_penalty: p.frequency_penalty,
            presence_penalty: p.presence_penalty,
            max_tokens: p.max_tokens,
        },
        behavior: StateBehavior {
            association: b.association.unwrap_or_default(),
            coherence: b.coherence.unwrap_or_default(),
            pacing: b.pacing.unwrap_or_default(),
            confidence: b.confidence.unwrap_or_default(),
        },
        system_prompt: input.system_prompt,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_behavior_defaults_to_normal() {
        let behavior: StateBehavior = serde_json::from_str("{}").unwrap();
        assert_eq!(behavior, StateBehavior::default());
        assert!(behavior.guidance().is_empty());
    }

    #[test]
    fn test_behavior_rejects_unknown_value() {
        let result = serde_json::from_str::<StateBehavior>(r#"{"pacing": "sideways"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_guidance_order_follows_axes() {
        let behavior = StateBehavior {
            association: Association::Loose,
            coherence: Coherence::Normal,
            pacing: Pacing::Slow,
            confidence: Confidence::Inflated,
        };
        assert_eq!(
            behavior.guidance(),
            vec![
                "Allow your thoughts to wander to related topics.",
                "Take your time. Pause between thoughts. Be deliberate.",
                "You are certain. Your ideas are brilliant. Express this.",
            ]
        );
    }

    #[test]
    fn test_optional_parameters_not_serialized() {
        let json = serde_json::to_value(StateParameters::with_temperature(1.2)).unwrap();
        assert_eq!(json, serde_json::json!({"temperature": 1.2}));
    }

    #[test]
    fn test_define_state_fills_defaults() {
        let state = define_state(DefineState {
            name: "focused".into(),
            parameters: PartialParameters {
                top_p: Some(0.8),
                ..Default::default()
            },
            system_prompt: "Focus.".into(),
            ..Default::default()
        });
        assert_eq!(state.description, "");
        assert_eq!(state.parameters.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(state.parameters.top_p, Some(0.8));
        assert_eq!(state.behavior, StateBehavior::default());
    }

    #[test]
    fn test_define_state_accepts_registry_payload() {
        let payload = serde_json::json!({
            "name": "poet",
            "system_prompt": "Speak in verse."
        });
        let input: DefineState = serde_json::from_value(payload.clone()).unwrap();
        let defined = define_state(input);

        let mut registry = crate::states::StateRegistry::new();
        assert!(registry.register_value(payload));
        assert_eq!(registry.get("poet"), Some(&defined));
    }

    #[test]
    fn test_define_state_from_camel_case_json() {
        let input: DefineState = serde_json::from_value(serde_json::json!({
            "name": "poet",
            "behavior": {"association": "loose"},
            "systemPrompt": "Speak in verse."
        }))
        .unwrap();
        let state = define_state(input);
        assert_eq!(state.system_prompt, "Speak in verse.");
        assert_eq!(state.behavior.association, Association::Loose);
    }
}
