//! Script-facing actor commands and lifecycle notifications.
//!
//! Scripts (or the demo binary) write [`ActorCommand`] messages; the
//! [`apply_actor_commands`](crate::systems::actorcommands::apply_actor_commands)
//! system applies them once per frame. Commands addressing an id that does
//! not exist yet create the actor, except the ones that only make sense for
//! an existing actor (holds, releases, disposal).
//!
//! Observers can react to [`ActorReadyEvent`] and [`ActorLoadFailedEvent`]:
//!
//! ```ignore
//! world.add_observer(|trigger: On<ActorReadyEvent>| {
//!     log::info!("{} is on stage", trigger.event().id);
//! });
//! ```

use bevy_ecs::prelude::*;
use raylib::prelude::{Color, Vector2};

use crate::components::gaze::LookDirection;
use crate::components::transition::{Easing, TransitionToken};
use crate::error::ActorError;
use crate::model::AppearanceBinding;

#[derive(Message, Debug, Clone)]
pub enum ActorCommand {
    /// Start loading `model` for `actor`.
    Initialize { actor: String, model: String },
    /// Blend toward a named appearance. `None` or an empty name keeps the
    /// current parameters.
    SetAppearance {
        actor: String,
        name: Option<String>,
        duration: f32,
    },
    /// Register (or replace) an appearance binding at runtime.
    BindAppearance {
        actor: String,
        binding: AppearanceBinding,
    },
    SetVisibility {
        actor: String,
        visible: bool,
        duration: f32,
        token: Option<TransitionToken>,
    },
    SetPosition {
        actor: String,
        position: Vector2,
        duration: f32,
        easing: Easing,
        token: Option<TransitionToken>,
    },
    SetScale {
        actor: String,
        scale: Vector2,
        duration: f32,
        easing: Easing,
        token: Option<TransitionToken>,
    },
    SetRotation {
        actor: String,
        degrees: f32,
        duration: f32,
        easing: Easing,
        token: Option<TransitionToken>,
    },
    SetLookDirection {
        actor: String,
        direction: LookDirection,
        duration: f32,
    },
    SetTalking { actor: String, talking: bool },
    SetTint { actor: String, color: Color },
    /// Keep the actor's model resident on behalf of `holder`.
    Hold {
        actor: String,
        holder: String,
        appearance: Option<String>,
    },
    Release {
        actor: String,
        holder: String,
        appearance: Option<String>,
    },
    /// Tear the actor down but keep its id registered.
    Dispose { actor: String },
    /// Tear the actor down and forget it.
    Remove { actor: String },
    /// Dispose every actor and drop every loaded model.
    UnloadAll,
}

impl ActorCommand {
    /// Id of the addressed actor, if the command addresses one.
    pub fn actor(&self) -> Option<&str> {
        match self {
            ActorCommand::Initialize { actor, .. }
            | ActorCommand::SetAppearance { actor, .. }
            | ActorCommand::BindAppearance { actor, .. }
            | ActorCommand::SetVisibility { actor, .. }
            | ActorCommand::SetPosition { actor, .. }
            | ActorCommand::SetScale { actor, .. }
            | ActorCommand::SetRotation { actor, .. }
            | ActorCommand::SetLookDirection { actor, .. }
            | ActorCommand::SetTalking { actor, .. }
            | ActorCommand::SetTint { actor, .. }
            | ActorCommand::Hold { actor, .. }
            | ActorCommand::Release { actor, .. }
            | ActorCommand::Dispose { actor }
            | ActorCommand::Remove { actor } => Some(actor),
            ActorCommand::UnloadAll => None,
        }
    }

    /// Whether an unknown actor id should be created for this command.
    pub fn creates_actor(&self) -> bool {
        !matches!(
            self,
            ActorCommand::Hold { .. }
                | ActorCommand::Release { .. }
                | ActorCommand::Dispose { .. }
                | ActorCommand::Remove { .. }
                | ActorCommand::UnloadAll
        )
    }
}

/// The actor finished loading and is drawable.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct ActorReadyEvent {
    pub entity: Entity,
    pub id: String,
}

/// The actor could not be loaded and is now disposed.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct ActorLoadFailedEvent {
    pub entity: Entity,
    pub id: String,
    pub error: ActorError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_setters_create_actors() {
        let set = ActorCommand::SetTalking {
            actor: "hero".into(),
            talking: true,
        };
        assert!(set.creates_actor());
        assert_eq!(set.actor(), Some("hero"));

        let dispose = ActorCommand::Dispose {
            actor: "hero".into(),
        };
        assert!(!dispose.creates_actor());
        assert_eq!(ActorCommand::UnloadAll.actor(), None);
    }
}
