use bevy_ecs::prelude::Component;

/// Speech-driven mouth animation state.
///
/// `elapsed` only advances while `active`; the mouth override is
/// `|sin(elapsed * talk_speed)| * talk_amplitude`.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct Talking {
    pub active: bool,
    /// The current line has voice audio, so the end of printing does not
    /// stop the mouth.
    pub voiced: bool,
    pub elapsed: f32,
}

impl Talking {
    pub fn start(&mut self, voiced: bool) {
        if !self.active {
            self.elapsed = 0.0;
        }
        self.active = true;
        self.voiced = voiced;
    }

    pub fn stop(&mut self) {
        self.active = false;
        self.voiced = false;
    }

    /// Mouth value for the current phase, or `None` when not talking.
    pub fn mouth_value(&self, speed: f32, amplitude: f32) -> Option<f32> {
        self.active
            .then(|| (self.elapsed * speed).sin().abs() * amplitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mouth_value_only_while_active() {
        let mut t = Talking::default();
        assert_eq!(t.mouth_value(12.0, 1.0), None);
        t.start(false);
        t.elapsed = std::f32::consts::FRAC_PI_2 / 12.0;
        let v = t.mouth_value(12.0, 0.5).unwrap();
        assert!((v - 0.5).abs() < 1e-5);
        t.stop();
        assert_eq!(t.mouth_value(12.0, 1.0), None);
    }

    #[test]
    fn restarting_while_active_keeps_phase() {
        let mut t = Talking::default();
        t.start(true);
        t.elapsed = 0.3;
        t.start(false);
        assert_eq!(t.elapsed, 0.3);
        assert!(!t.voiced);
    }
}
