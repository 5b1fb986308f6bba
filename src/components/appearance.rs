//! Appearance (expression/pose) state of an actor.
//!
//! [`Appearance`] records what the scripts asked for; [`AppearanceBindings`]
//! maps appearance names to parameter targets. The parameter blender reads
//! both every frame.

use bevy_ecs::prelude::Component;
use rustc_hash::FxHashMap;

use crate::model::AppearanceBinding;

/// What non-gaze parameters are currently blending toward.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum AppearanceTarget {
    /// Every parameter eases back to its declared default.
    #[default]
    Defaults,
    /// Parameters stay wherever they are.
    Hold,
    /// Bound parameters take the binding's values, the rest their defaults.
    Binding(String),
}

#[derive(Component, Clone, Debug, PartialEq)]
pub struct Appearance {
    /// Requested appearance name. `None` means no override is active.
    pub name: Option<String>,
    pub target: AppearanceTarget,
    /// Inverse of the requested transition duration.
    pub speed: f32,
}

impl Default for Appearance {
    fn default() -> Self {
        Self {
            name: None,
            target: AppearanceTarget::Defaults,
            speed: 1.0,
        }
    }
}

impl Appearance {
    /// Record a new request. An empty or missing name keeps the current
    /// parameter values.
    pub fn request(&mut self, name: Option<&str>, speed: f32) {
        self.speed = speed;
        match name {
            Some(n) if !n.is_empty() => {
                self.name = Some(n.to_string());
                self.target = AppearanceTarget::Binding(n.to_string());
            }
            _ => {
                self.name = None;
                self.target = AppearanceTarget::Hold;
            }
        }
    }
}

/// Appearance bindings known to one actor, by name.
#[derive(Component, Clone, Debug, Default)]
pub struct AppearanceBindings {
    pub bindings: FxHashMap<String, AppearanceBinding>,
}

impl AppearanceBindings {
    /// Add or replace a binding.
    pub fn insert(&mut self, binding: AppearanceBinding) {
        self.bindings.insert(binding.name.clone(), binding);
    }

    /// Add a binding unless one with the same name was already registered.
    pub fn insert_default(&mut self, binding: AppearanceBinding) {
        self.bindings.entry(binding.name.clone()).or_insert(binding);
    }

    pub fn get(&self, name: &str) -> Option<&AppearanceBinding> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_name_holds_current_parameters() {
        let mut a = Appearance::default();
        a.request(Some("smile"), 2.0);
        assert_eq!(a.target, AppearanceTarget::Binding("smile".into()));
        a.request(Some(""), 4.0);
        assert_eq!(a.name, None);
        assert_eq!(a.target, AppearanceTarget::Hold);
        assert_eq!(a.speed, 4.0);
        a.request(None, 1.0);
        assert_eq!(a.target, AppearanceTarget::Hold);
    }

    #[test]
    fn runtime_bindings_win_over_model_defaults() {
        let mut b = AppearanceBindings::default();
        b.insert(AppearanceBinding::new("smile").with("ParamMouthOpenY", 0.3));
        b.insert_default(AppearanceBinding::new("smile").with("ParamMouthOpenY", 0.8));
        assert_eq!(b.get("smile").unwrap().get("ParamMouthOpenY"), Some(0.3));
        assert!(!b.contains("frown"));
    }
}
