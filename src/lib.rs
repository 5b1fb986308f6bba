//! Aberred Stage library.
//!
//! Actor rendering and compositing on top of bevy_ecs and raylib: parametric
//! character models are blended, sorted and drawn into per-actor offscreen
//! surfaces, then composited into the scene. Exposes the components,
//! resources, systems and events for the binary and integration tests.

pub mod components;
pub mod error;
pub mod events;
pub mod model;
pub mod resources;
pub mod stage;
pub mod systems;
