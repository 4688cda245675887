//! State Engine - tracks the current state and applies it to prompts.

use std::path::Path;

use serde_json::Value;

use super::definition::{StateBehavior, StateDefinition, StateInfo, StateParameters};
use super::error::StateError;
use super::modulator::{ModulatedRequest, PromptModulator};
use super::registry::StateRegistry;

/// Name of the state used when nothing else has been selected.
pub const DEFAULT_STATE: &str = "sober";

/// Owns a [`StateRegistry`] and the currently selected state.
#[derive(Debug, Clone)]
pub struct StateEngine {
    registry: StateRegistry,
    modulator: PromptModulator,
    current: Option<StateDefinition>,
}

impl Default for StateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateEngine {
    /// Engine backed by the built-in profiles.
    pub fn new() -> Self {
        Self::from_registry(StateRegistry::with_builtin())
    }

    /// Engine backed by an existing registry.
    pub fn from_registry(registry: StateRegistry) -> Self {
        Self {
            registry,
            modulator: PromptModulator::new(),
            current: None,
        }
    }

    /// Engine with no states at all.
    pub fn empty() -> Self {
        Self::from_registry(StateRegistry::new())
    }

    /// Select `name` as the current state.
    pub fn load(&mut self, name: &str) -> Result<&StateDefinition, StateError> {
        let state = self.resolve(name)?;
        Ok(self.current.insert(state))
    }

    pub fn current(&self) -> Option<&StateDefinition> {
        self.current.as_ref()
    }

    /// Apply a state to `prompt`.
    ///
    /// `state_name` overrides the current state for this call. The override
    /// becomes current only when no state was selected yet. Without either,
    /// the registry's `sober` profile is used, or a built-in default when
    /// `sober` is not registered, and that becomes current.
    pub fn apply(
        &mut self,
        prompt: &str,
        state_name: Option<&str>,
    ) -> Result<ModulatedRequest, StateError> {
        let state = match state_name {
            Some(name) => {
                let state = self.resolve(name)?;
                if self.current.is_none() {
                    self.current = Some(state.clone());
                }
                state
            }
            None => match &self.current {
                Some(current) => current.clone(),
                None => {
                    let fallback = self
                        .registry
                        .get(DEFAULT_STATE)
                        .cloned()
                        .unwrap_or_else(default_state);
                    log::debug!("No state selected, falling back to {}", fallback.name);
                    self.current = Some(fallback.clone());
                    fallback
                }
            },
        };

        Ok(self.modulator.modulate(prompt, &state))
    }

    fn resolve(&self, name: &str) -> Result<StateDefinition, StateError> {
        self.registry
            .get(name)
            .cloned()
            .ok_or_else(|| StateError::NotFound {
                name: name.to_string(),
                available: self.registry.list_names(),
            })
    }

    // -----------------------------------------------------------------------
    // Registry forwarders
    // -----------------------------------------------------------------------

    pub fn register(&mut self, state: StateDefinition) -> bool {
        self.registry.register(state)
    }

    pub fn register_value(&mut self, input: Value) -> bool {
        self.registry.register_value(input)
    }

    /// Load every state file in `dir` on top of the existing states.
    pub fn add_custom_state_dir(&mut self, dir: &Path) -> Result<usize, StateError> {
        self.registry.load_directory(dir)
    }

    pub fn list(&self) -> Vec<&StateDefinition> {
        self.registry.list()
    }

    /// Name/description pairs for every state.
    pub fn list_info(&self) -> Vec<StateInfo> {
        self.registry.list().into_iter().map(StateInfo::from).collect()
    }

    pub fn list_names(&self) -> Vec<String> {
        self.registry.list_names()
    }

    pub fn has(&self, name: &str) -> bool {
        self.registry.has(name)
    }

    pub fn get(&self, name: &str) -> Option<&StateDefinition> {
        self.registry.get(name)
    }

    pub fn registry(&self) -> &StateRegistry {
        &self.registry
    }
}

/// Hardcoded fallback used when the registry has no `sober` entry.
pub fn default_state() -> StateDefinition {
    StateDefinition {
        name: DEFAULT_STATE.to_string(),
        description: "Baseline - clear, rational, structured".to_string(),
        parameters: StateParameters::default(),
        behavior: StateBehavior::default(),
        system_prompt: "You are a helpful, clear, and rational assistant.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_apply_falls_back_to_registered_sober() {
        let mut engine = StateEngine::new();
        assert!(engine.current().is_none());

        let req = engine.apply("hi", None).unwrap();
        let sober = engine.get("sober").unwrap().clone();
        assert_eq!(engine.current(), Some(&sober));
        assert!(req.system_prompt.ends_with("Maintain strict logical consistency throughout."));
    }

    #[test]
    fn test_apply_falls_back_to_hardcoded_default() {
        let mut engine = StateEngine::empty();
        let req = engine.apply("hi", None).unwrap();
        assert_eq!(req.system_prompt, "You are a helpful, clear, and rational assistant.");
        assert_eq!(req.parameters.temperature, 0.7);
        assert_eq!(engine.current(), Some(&default_state()));
    }

    #[test]
    fn test_load_unknown_lists_available() {
        let mut engine = StateEngine::empty();
        engine.register_value(json!({"name": "a"}));
        engine.register_value(json!({"name": "b"}));

        let err = engine.load("zzz").unwrap_err();
        assert_eq!(err.to_string(), "State \"zzz\" not found. Available: a, b");
    }

    #[test]
    fn test_unknown_override_keeps_current() {
        let mut engine = StateEngine::new();
        engine.load("lsd").unwrap();

        let err = engine.apply("x", Some("unknown-name")).unwrap_err();
        assert!(matches!(err, StateError::NotFound { .. }));
        assert_eq!(engine.current().map(|s| s.name.as_str()), Some("lsd"));
    }

    #[test]
    fn test_override_does_not_replace_current() {
        let mut engine = StateEngine::new();
        engine.load("caffeine").unwrap();

        let req = engine.apply("x", Some("lsd")).unwrap();
        assert_eq!(req.parameters.temperature, 1.5);
        assert_eq!(engine.current().map(|s| s.name.as_str()), Some("caffeine"));
    }

    #[test]
    fn test_override_becomes_current_when_unset() {
        let mut engine = StateEngine::new();
        engine.apply("x", Some("mdma")).unwrap();
        assert_eq!(engine.current().map(|s| s.name.as_str()), Some("mdma"));
    }

    #[test]
    fn test_registered_state_end_to_end() {
        let mut engine = StateEngine::new();
        engine.register_value(json!({
            "name": "test",
            "parameters": {"temperature": 1.2},
            "behavior": {"pacing": "fast"},
            "system_prompt": "Be playful."
        }));

        let req = engine.apply("Hello", Some("test")).unwrap();
        assert_eq!(
            req.system_prompt,
            "Be playful.\n\nMove quickly between ideas. Keep momentum high."
        );
        assert_eq!(req.user_prompt, "Hello");
        assert_eq!(req.parameters.temperature, 1.2);
    }

    #[test]
    fn test_add_custom_state_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("calm.yaml"), "name: calm\ndescription: Calm\n").unwrap();

        let mut engine = StateEngine::new();
        assert_eq!(engine.add_custom_state_dir(dir.path()).unwrap(), 1);
        assert!(engine.has("calm"));
        assert!(engine
            .list_info()
            .contains(&StateInfo { name: "calm".into(), description: "Calm".into() }));
    }
}
