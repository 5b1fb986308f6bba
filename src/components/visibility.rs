use bevy_ecs::prelude::Component;

/// Whether the actor is shown, and how opaque it currently is.
///
/// `visible` is the requested state and flips as soon as a visibility change
/// is requested; `opacity` follows it through an
/// [`OpacityTransition`](super::transition::OpacityTransition). Actors spawn
/// hidden.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct ActorVisibility {
    pub visible: bool,
    pub opacity: f32,
}

impl Default for ActorVisibility {
    fn default() -> Self {
        Self {
            visible: false,
            opacity: 0.0,
        }
    }
}

impl ActorVisibility {
    /// Nothing left to draw.
    pub fn is_transparent(&self) -> bool {
        self.opacity <= 0.0
    }
}
