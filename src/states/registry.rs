//! State Registry - name → definition lookup.
//!
//! The registry loads states from:
//! 1. Built-in profiles (compiled into the binary)
//! 2. YAML files in a custom state directory
//! 3. Programmatically registered definitions
//!
//! Every ingestion path goes through the same validation. Invalid input is
//! a no-op rather than an error so that one bad file never aborts a bulk
//! load; [`StateRegistry::try_register`] is the strict variant for callers
//! that want the reason.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::{Map, Value};

use super::definition::{StateBehavior, StateDefinition, DEFAULT_TEMPERATURE};
use super::error::StateError;

/// Built-in profiles, one YAML document each.
const BUILTIN_STATES: &[(&str, &str)] = &[
    ("sober", include_str!("../../states/sober.yaml")),
    ("cannabis", include_str!("../../states/cannabis.yaml")),
    ("ketamine", include_str!("../../states/ketamine.yaml")),
    ("cocaine", include_str!("../../states/cocaine.yaml")),
    ("ayahuasca", include_str!("../../states/ayahuasca.yaml")),
    ("mdma", include_str!("../../states/mdma.yaml")),
    ("alcohol", include_str!("../../states/alcohol.yaml")),
    ("lsd", include_str!("../../states/lsd.yaml")),
    ("caffeine", include_str!("../../states/caffeine.yaml")),
];

/// Holds every known state definition keyed by name.
#[derive(Debug, Clone, Default)]
pub struct StateRegistry {
    states: BTreeMap<String, StateDefinition>,
}

impl StateRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry preloaded with the built-in profiles.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        for (file, yaml) in BUILTIN_STATES {
            if let Err(e) = registry.register_yaml(yaml) {
                log::warn!("Failed to load built-in state {}: {}", file, e);
            }
        }
        registry
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    /// Register a typed definition. A definition with an empty name is
    /// ignored. Returns whether the definition was stored.
    pub fn register(&mut self, state: StateDefinition) -> bool {
        if state.name.is_empty() {
            log::debug!("Ignoring state definition without a name");
            return false;
        }
        self.states.insert(state.name.clone(), state);
        true
    }

    /// Register arbitrary structured input, applying field defaults.
    ///
    /// Invalid input leaves the registry untouched. Returns whether the
    /// input was stored.
    pub fn register_value(&mut self, input: Value) -> bool {
        match self.try_register(input) {
            Ok(_) => true,
            Err(e) => {
                log::debug!("Ignoring state input: {}", e);
                false
            }
        }
    }

    /// Strict variant of [`register_value`](Self::register_value).
    pub fn try_register(&mut self, input: Value) -> Result<&StateDefinition, StateError> {
        let state = validate(input)?;
        let name = state.name.clone();
        self.states.insert(name.clone(), state);
        self.states
            .get(&name)
            .ok_or_else(|| StateError::Invalid(format!("state \"{}\" was not stored", name)))
    }

    /// Parse a YAML document and register it.
    pub fn register_yaml(&mut self, yaml: &str) -> Result<&StateDefinition, StateError> {
        let value: Value = serde_yaml::from_str(yaml)?;
        self.try_register(value)
    }

    /// Read a YAML state file and register it.
    pub fn register_file(&mut self, path: &Path) -> Result<&StateDefinition, StateError> {
        let content = std::fs::read_to_string(path)?;
        self.register_yaml(&content)
    }

    /// Load all `*.yaml` / `*.yml` files in a directory (non-recursive).
    ///
    /// Files that fail to parse or validate are logged and skipped. A
    /// missing directory loads nothing. Returns the number registered.
    pub fn load_directory(&mut self, dir: &Path) -> Result<usize, StateError> {
        if !dir.exists() {
            return Ok(0);
        }

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let is_yaml = path
                .extension()
                .map_or(false, |ext| ext == "yaml" || ext == "yml");
            if path.is_file() && is_yaml {
                paths.push(path);
            }
        }
        paths.sort();

        let mut count = 0;
        for path in paths {
            match self.register_file(&path) {
                Ok(_) => count += 1,
                Err(e) => {
                    log::warn!("Failed to load state from {}: {}", path.display(), e);
                }
            }
        }

        Ok(count)
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    pub fn get(&self, name: &str) -> Option<&StateDefinition> {
        self.states.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.states.contains_key(name)
    }

    /// All definitions, ordered by name.
    pub fn list(&self) -> Vec<&StateDefinition> {
        self.states.values().collect()
    }

    /// All names, ordered.
    pub fn list_names(&self) -> Vec<String> {
        self.states.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// Normalize structured input into a definition.
///
/// `parameters` and `behavior` are shallow-merged onto their defaults, so a
/// partial object keeps the caller's fields and inherits the rest.
pub fn validate(input: Value) -> Result<StateDefinition, StateError> {
    let Value::Object(mut obj) = input else {
        return Err(StateError::Invalid("expected a mapping".into()));
    };

    let name = match obj.remove("name") {
        Some(Value::String(name)) if !name.is_empty() => name,
        _ => return Err(StateError::Invalid("missing non-empty string `name`".into())),
    };

    let description = take_string(&mut obj, "description");
    let system_prompt = take_string(&mut obj, "system_prompt");

    let mut parameters = Map::new();
    parameters.insert("temperature".into(), Value::from(DEFAULT_TEMPERATURE));
    if let Some(Value::Object(overrides)) = obj.remove("parameters") {
        parameters.extend(overrides);
    }

    let mut behavior = match serde_json::to_value(StateBehavior::default()) {
        Ok(Value::Object(defaults)) => defaults,
        _ => Map::new(),
    };
    if let Some(Value::Object(overrides)) = obj.remove("behavior") {
        behavior.extend(overrides);
    }

    let invalid = |field: &str, e: serde_json::Error| {
        StateError::Invalid(format!("state \"{}\": {}: {}", name, field, e))
    };
    let parameters =
        serde_json::from_value(Value::Object(parameters)).map_err(|e| invalid("parameters", e))?;
    let behavior =
        serde_json::from_value(Value::Object(behavior)).map_err(|e| invalid("behavior", e))?;

    Ok(StateDefinition {
        name,
        description,
        parameters,
        behavior,
        system_prompt,
    })
}

fn take_string(obj: &mut Map<String, Value>, key: &str) -> String {
    match obj.remove(key) {
        Some(Value::String(s)) => s,
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::states::definition::{Association, Coherence, Confidence, Pacing};
    use serde_json::json;

    #[test]
    fn test_builtin_states_load() {
        let registry = StateRegistry::with_builtin();
        assert_eq!(registry.len(), BUILTIN_STATES.len());
        for (name, _) in BUILTIN_STATES {
            assert!(registry.has(name), "missing built-in {}", name);
        }

        let lsd = registry.get("lsd").unwrap();
        assert_eq!(lsd.parameters.temperature, 1.5);
        assert_eq!(lsd.behavior.pacing, Pacing::Erratic);
        assert!(!lsd.system_prompt.is_empty());

        let sober = registry.get("sober").unwrap();
        assert_eq!(sober.behavior.coherence, Coherence::Strict);
    }

    #[test]
    fn test_register_value_applies_defaults() {
        let mut registry = StateRegistry::new();
        assert!(registry.register_value(json!({
            "name": "partial",
            "parameters": {"top_p": 0.5},
            "behavior": {"confidence": "low"}
        })));

        let state = registry.get("partial").unwrap();
        assert_eq!(state.description, "");
        assert_eq!(state.system_prompt, "");
        assert_eq!(state.parameters.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(state.parameters.top_p, Some(0.5));
        assert_eq!(state.behavior.association, Association::Normal);
        assert_eq!(state.behavior.confidence, Confidence::Low);
    }

    #[test]
    fn test_register_value_keeps_explicit_temperature() {
        let mut registry = StateRegistry::new();
        registry.register_value(json!({"name": "hot", "parameters": {"temperature": 1.9}}));
        assert_eq!(registry.get("hot").unwrap().parameters.temperature, 1.9);
    }

    #[test]
    fn test_register_without_name_is_noop() {
        let mut registry = StateRegistry::with_builtin();
        let before = registry.list_names();

        assert!(!registry.register_value(json!({"description": "no name"})));
        assert!(!registry.register_value(json!({"name": ""})));
        assert!(!registry.register_value(json!({"name": 42})));
        assert!(!registry.register_value(json!("just a string")));
        assert!(!registry.register(StateDefinition {
            name: String::new(),
            description: String::new(),
            parameters: Default::default(),
            behavior: Default::default(),
            system_prompt: String::new(),
        }));

        assert_eq!(registry.list_names(), before);
    }

    #[test]
    fn test_register_rejects_out_of_range_behavior() {
        let mut registry = StateRegistry::new();
        let result = registry.try_register(json!({
            "name": "odd",
            "behavior": {"coherence": "sparkly"}
        }));
        assert!(matches!(result, Err(StateError::Invalid(_))));
        assert!(!registry.has("odd"));
    }

    #[test]
    fn test_register_overwrites_existing_name() {
        let mut registry = StateRegistry::new();
        registry.register_value(json!({"name": "x", "description": "first"}));
        registry.register_value(json!({"name": "x", "description": "second"}));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("x").unwrap().description, "second");
    }

    #[test]
    fn test_load_directory_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("good.yaml"),
            "name: good\nparameters:\n  temperature: 1.1\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("also_good.yml"), "name: also_good\n").unwrap();
        std::fs::write(dir.path().join("broken.yaml"), "name: [unclosed\n").unwrap();
        std::fs::write(dir.path().join("nameless.yaml"), "description: nope\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "name: ignored\n").unwrap();

        let mut registry = StateRegistry::new();
        let count = registry.load_directory(dir.path()).unwrap();

        assert_eq!(count, 2);
        assert_eq!(registry.list_names(), vec!["also_good", "good"]);
        assert_eq!(registry.get("good").unwrap().parameters.temperature, 1.1);
    }

    #[test]
    fn test_load_missing_directory() {
        let mut registry = StateRegistry::new();
        let count = registry
            .load_directory(Path::new("/definitely/not/a/real/dir"))
            .unwrap();
        assert_eq!(count, 0);
        assert!(registry.is_empty());
    }
}
