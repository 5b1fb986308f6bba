//! Stage systems.
//!
//! This module groups all ECS systems that advance actors from script
//! commands to pixels on screen.
//!
//! Submodules overview
//! - [`actorcommands`] – apply script [`ActorCommand`](crate::events::actor::ActorCommand)s
//! - [`blend`] – ease model parameters toward appearance, gaze and talk targets
//! - [`composite`] – refresh drawables and build per-actor frame batches
//! - [`lifecycle`] – finish loading actors and tear down disposed ones
//! - [`loader`] – bridge with the loader thread (poll/update message queues)
//! - [`render`] – draw actor surfaces and the scene using Raylib
//! - [`time`] – update simulation time and delta
//! - [`transition`] – advance position, scale, rotation and opacity transitions

pub mod actorcommands;
pub mod blend;
pub mod composite;
pub mod lifecycle;
pub mod loader;
pub mod render;
pub mod time;
pub mod transition;
