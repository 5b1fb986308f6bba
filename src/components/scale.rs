use bevy_ecs::prelude::Component;
use raylib::prelude::Vector2;

/// Actor world scale. Applied to the model root and undone by the
/// compositor's projection, so it only shows up when the surface is
/// composited into the scene.
#[derive(Component, Clone, Debug, Copy, PartialEq)]
pub struct Scale {
    pub scale: Vector2,
}
impl Scale {
    pub fn new(sx: f32, sy: f32) -> Self {
        Self {
            scale: Vector2 { x: sx, y: sy },
        }
    }
}
impl Default for Scale {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}
