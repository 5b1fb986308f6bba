//! Actor lifecycle state machine.
//!
//! ```text
//! Unloaded -> Loading -> Ready -> Disposing -> Disposed
//!                |                    ^
//!                +--------------------+ (dispose while loading)
//!                +-> Disposed            (load or configuration failure)
//! ```
//!
//! Transitions are driven by [`crate::systems::actorcommands`] and
//! [`crate::systems::lifecycle`]; this module only knows which moves are legal.

use bevy_ecs::prelude::Component;

use crate::error::ActorError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    #[default]
    Unloaded,
    Loading,
    Ready,
    Disposing,
    Disposed,
}

impl LifecycleState {
    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition(self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, next),
            (Unloaded, Loading)
                | (Loading, Ready)
                | (Loading, Disposed)
                | (Loading, Disposing)
                | (Ready, Disposing)
                | (Disposing, Disposed)
        )
    }
}

/// Lifecycle of one actor entity.
#[derive(Component, Clone, Debug, Default)]
pub struct ActorLifecycle {
    state: LifecycleState,
}

impl ActorLifecycle {
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == LifecycleState::Ready
    }

    /// Move to `next`, or report the illegal move for actor `id`.
    pub fn advance(&mut self, id: &str, next: LifecycleState) -> Result<(), ActorError> {
        if !self.state.can_transition(next) {
            return Err(ActorError::InvalidState {
                id: id.to_string(),
                state: self.state,
            });
        }
        log::debug!("actor '{}' {:?} -> {:?}", id, self.state, next);
        self.state = next;
        Ok(())
    }
}

/// Marker: despawn the actor and forget its id once disposal completes.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct PendingRemoval;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_is_legal() {
        let mut lc = ActorLifecycle::default();
        for next in [
            LifecycleState::Loading,
            LifecycleState::Ready,
            LifecycleState::Disposing,
            LifecycleState::Disposed,
        ] {
            lc.advance("hero", next).unwrap();
        }
        assert_eq!(lc.state(), LifecycleState::Disposed);
    }

    #[test]
    fn failed_load_goes_straight_to_disposed() {
        let mut lc = ActorLifecycle::default();
        lc.advance("hero", LifecycleState::Loading).unwrap();
        assert!(lc.advance("hero", LifecycleState::Disposed).is_ok());
    }

    #[test]
    fn disposed_is_terminal() {
        let mut lc = ActorLifecycle::default();
        lc.advance("hero", LifecycleState::Loading).unwrap();
        lc.advance("hero", LifecycleState::Disposed).unwrap();
        let err = lc.advance("hero", LifecycleState::Loading).unwrap_err();
        assert_eq!(
            err,
            ActorError::InvalidState {
                id: "hero".into(),
                state: LifecycleState::Disposed
            }
        );
    }

    #[test]
    fn cannot_skip_loading() {
        let mut lc = ActorLifecycle::default();
        assert!(lc.advance("hero", LifecycleState::Ready).is_err());
        assert_eq!(lc.state(), LifecycleState::Unloaded);
    }
}
