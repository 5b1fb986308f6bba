//! Identity of an actor entity.

use bevy_ecs::prelude::Component;

/// Script-facing identity of an actor.
///
/// `id` is what commands and print events address; `model_id` names the
/// model resource it is built from and is filled in by the first
/// initialization request.
#[derive(Component, Clone, Debug, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub model_id: Option<String>,
}

impl Actor {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            model_id: None,
        }
    }
}
