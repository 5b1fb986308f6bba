//! Transition systems.
//!
//! These systems advance the per-actor transition slots and write the
//! results into the animated properties:
//! - [`transition_position_system`] – [`MapPosition`]
//! - [`transition_scale_system`] – [`Scale`]
//! - [`transition_rotation_system`] – [`Rotation`]
//! - [`transition_opacity_system`] – [`ActorVisibility`] opacity
//!
//! Slots with nothing running are skipped without touching the component,
//! so idle actors do not trip change detection. A cancelled transition
//! writes nothing; the property keeps its last applied value.

use bevy_ecs::prelude::*;

use crate::components::mapposition::MapPosition;
use crate::components::rotation::Rotation;
use crate::components::scale::Scale;
use crate::components::transition::{
    OpacityTransition, PositionTransition, RotationTransition, ScaleTransition,
};
use crate::components::visibility::ActorVisibility;
use crate::resources::worldtime::WorldTime;

/// Animate actor positions based on [`PositionTransition`] slots.
pub fn transition_position_system(
    world_time: Res<WorldTime>,
    mut query: Query<(&mut MapPosition, &mut PositionTransition)>,
) {
    let dt = world_time.delta.max(0.0);
    for (mut mp, mut tr) in query.iter_mut() {
        if !tr.0.is_running() {
            continue;
        }
        if let Some(pos) = tr.0.advance(dt) {
            mp.pos = pos;
        }
    }
}

/// Animate actor scales based on [`ScaleTransition`] slots.
pub fn transition_scale_system(
    world_time: Res<WorldTime>,
    mut query: Query<(&mut Scale, &mut ScaleTransition)>,
) {
    let dt = world_time.delta.max(0.0);
    for (mut sc, mut tr) in query.iter_mut() {
        if !tr.0.is_running() {
            continue;
        }
        if let Some(scale) = tr.0.advance(dt) {
            sc.scale = scale;
        }
    }
}

/// Animate actor rotations based on [`RotationTransition`] slots.
pub fn transition_rotation_system(
    world_time: Res<WorldTime>,
    mut query: Query<(&mut Rotation, &mut RotationTransition)>,
) {
    let dt = world_time.delta.max(0.0);
    for (mut rot, mut tr) in query.iter_mut() {
        if !tr.0.is_running() {
            continue;
        }
        if let Some(degrees) = tr.0.advance(dt) {
            rot.degrees = degrees;
        }
    }
}

/// Fade actors in and out based on [`OpacityTransition`] slots.
pub fn transition_opacity_system(
    world_time: Res<WorldTime>,
    mut query: Query<(&mut ActorVisibility, &mut OpacityTransition)>,
) {
    let dt = world_time.delta.max(0.0);
    for (mut vis, mut tr) in query.iter_mut() {
        if !tr.0.is_running() {
            continue;
        }
        if let Some(opacity) = tr.0.advance(dt) {
            vis.opacity = opacity.clamp(0.0, 1.0);
        }
    }
}
