use bevy_ecs::prelude::Component;

/// Actor world rotation in degrees, clockwise on screen.
#[derive(Component, Clone, Debug, Copy, Default, PartialEq)]
pub struct Rotation {
    pub degrees: f32,
}
