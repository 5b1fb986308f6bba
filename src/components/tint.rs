//! Color tint component for actor sprites.
//!
//! The [`Tint`] component modulates the color an actor's surface is
//! composited with. Opacity from [`ActorVisibility`] is multiplied on top at
//! presentation time, so fading never overwrites the requested tint.
//!
//! [`ActorVisibility`]: crate::components::visibility::ActorVisibility

use bevy_ecs::prelude::Component;
use raylib::prelude::Color;

/// Color tint for compositing an actor's surface.
///
/// While the actor is hidden, reading the tint reports the alpha it had the
/// last time it was visible rather than whatever the fade left behind.
#[derive(Component, Clone, Debug, Copy)]
pub struct Tint {
    pub color: Color,
    last_visible_alpha: u8,
}

impl Tint {
    /// Create a new Tint with the specified RGBA values.
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            color: Color::new(r, g, b, a),
            last_visible_alpha: a,
        }
    }

    /// Replace the tint color. The alpha is only remembered while visible.
    pub fn set(&mut self, color: Color, visible: bool) {
        self.color = color;
        if visible {
            self.last_visible_alpha = color.a;
        }
    }

    /// Color as observed by callers. Hidden actors report their last visible
    /// alpha.
    pub fn read(&self, visible: bool) -> Color {
        if visible {
            self.color
        } else {
            Color::new(
                self.color.r,
                self.color.g,
                self.color.b,
                self.last_visible_alpha,
            )
        }
    }

    /// Restore the remembered alpha when the actor becomes visible again.
    pub fn restore_alpha(&mut self) {
        self.color.a = self.last_visible_alpha;
    }

    /// Final compositing color: tint alpha scaled by `opacity` (0.0 to 1.0).
    pub fn with_opacity(&self, opacity: f32) -> Color {
        let a = (self.color.a as f32 * opacity.clamp(0.0, 1.0)).round() as u8;
        Color::new(self.color.r, self.color.g, self.color.b, a)
    }
}

impl Default for Tint {
    fn default() -> Self {
        Self::new(255, 255, 255, 255)
    }
}
