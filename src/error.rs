//! Error types for actor loading and per-frame rendering.
//!
//! [`ActorError`] aborts the affected actor's initialization (the actor ends
//! up `Disposed`). [`RenderWarning`] never aborts anything: the compositor
//! reports it, the frame is skipped for that actor and the rest of the scene
//! keeps rendering.

use crate::components::lifecycle::LifecycleState;

/// Fatal errors raised while an actor is being set up or addressed.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ActorError {
    /// The model resource is missing or could not be parsed.
    #[error("failed to load model resource '{id}': {reason}")]
    LoadFailure { id: String, reason: String },

    /// The model parsed but lacks something geometry depends on.
    #[error("model '{id}' is misconfigured: {reason}")]
    Configuration { id: String, reason: String },

    /// No actor is registered under this id.
    #[error("unknown actor '{0}'")]
    UnknownActor(String),

    /// The operation is not allowed in the actor's current state.
    #[error("actor '{id}' cannot do that while {state:?}")]
    InvalidState { id: String, state: LifecycleState },
}

impl ActorError {
    pub fn load_failure(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::LoadFailure {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn configuration(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

/// Non-fatal conditions found while compositing a frame.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RenderWarning {
    #[error("model has no drawables")]
    EmptyDrawables,

    #[error("drawable {index} has no mesh")]
    MissingMesh { index: usize },

    #[error("render surface would be {width}x{height} pixels")]
    DegenerateSurface { width: u32, height: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            ActorError::load_failure("hero", "not found")
                .to_string()
                .contains("failed to load model resource 'hero'")
        );
        assert!(
            ActorError::configuration("hero", "no canvas")
                .to_string()
                .contains("misconfigured: no canvas")
        );
        assert!(
            RenderWarning::MissingMesh { index: 3 }
                .to_string()
                .contains("drawable 3")
        );
    }

    #[test]
    fn invalid_state_names_the_state() {
        let err = ActorError::InvalidState {
            id: "hero".into(),
            state: LifecycleState::Disposed,
        };
        assert!(err.to_string().contains("Disposed"));
    }
}
