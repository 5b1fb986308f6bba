use bevy_ecs::prelude::*;

/// The scene's output aspect changed. Ready actors drop their cached
/// projection and recompute it on the next frame.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AspectChangedEvent {
    pub width: i32,
    pub height: i32,
}
