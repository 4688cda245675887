//! Cognitive states.
//!
//! - [`definition`]: state data model and [`define_state`]
//! - [`registry`]: name → definition store, YAML directory loading
//! - [`intensity`]: blend parameters toward a neutral baseline
//! - [`modulator`]: system-prompt composition
//! - [`engine`]: current-state tracking and `apply`

pub mod definition;
pub mod engine;
pub mod error;
pub mod intensity;
pub mod modulator;
pub mod registry;

pub use definition::{
    define_state, Association, Coherence, Confidence, DefineState, Pacing, PartialBehavior,
    PartialParameters, StateBehavior, StateDefinition, StateInfo, StateParameters,
    DEFAULT_TEMPERATURE,
};
pub use engine::{default_state, StateEngine, DEFAULT_STATE};
pub use error::StateError;
pub use intensity::{scale, scale_intensity};
pub use modulator::{ModulatedRequest, PromptModulator};
pub use registry::{validate, StateRegistry};
