//! Z-index component for scene compositing order.
//!
//! The [`ZIndex`] component controls the order in which actor sprites are
//! blended into the scene. Actors with higher values are drawn on top of
//! those with lower values.

use bevy_ecs::prelude::Component;

/// Compositing order hint for actor sprites.
///
/// Higher values are drawn later (on top). Ties keep spawn order.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct ZIndex(pub i32);
