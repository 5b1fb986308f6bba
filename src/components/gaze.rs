use bevy_ecs::prelude::Component;

/// Horizontal look direction of an actor's head.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LookDirection {
    #[default]
    Center,
    Left,
    Right,
}

impl LookDirection {
    /// Head angle for this direction given the configured magnitude.
    pub fn angle(self, look_angle: f32) -> f32 {
        match self {
            LookDirection::Center => 0.0,
            LookDirection::Left => -look_angle,
            LookDirection::Right => look_angle,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "center" => Some(LookDirection::Center),
            "left" => Some(LookDirection::Left),
            "right" => Some(LookDirection::Right),
            _ => None,
        }
    }
}

/// Gaze target driving the reserved head-angle parameter.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct Gaze {
    pub direction: LookDirection,
    /// Target head angle in degrees.
    pub angle: f32,
    /// Inverse of the requested transition duration.
    pub speed: f32,
}

impl Default for Gaze {
    fn default() -> Self {
        Self {
            direction: LookDirection::Center,
            angle: 0.0,
            speed: 1.0,
        }
    }
}

impl Gaze {
    pub fn look(&mut self, direction: LookDirection, look_angle: f32, speed: f32) {
        self.direction = direction;
        self.angle = direction.angle(look_angle);
        self.speed = speed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directions_map_to_signed_angles() {
        assert_eq!(LookDirection::Center.angle(30.0), 0.0);
        assert_eq!(LookDirection::Left.angle(30.0), -30.0);
        assert_eq!(LookDirection::Right.angle(30.0), 30.0);
        assert_eq!(LookDirection::from_name("Left"), Some(LookDirection::Left));
        assert_eq!(LookDirection::from_name("up"), None);
    }
}
