//! Per-frame geometry refresh and compositing of ready actors.
//!
//! [`refresh_drawables`] must run after the parameter blend so the drawables
//! reflect this frame's parameters; [`composite_actors`] then builds each
//! actor's [`FrameBatch`](crate::components::compositor::FrameBatch).

use bevy_ecs::prelude::*;
use log::{debug, warn};
use rustc_hash::FxHashMap;

use crate::components::actor::Actor;
use crate::components::compositor::{Compositor, RootPlacement};
use crate::components::drawableset::DrawableSet;
use crate::components::lifecycle::ActorLifecycle;
use crate::components::modelinstance::{ModelInstance, ModelRoot};
use crate::components::rotation::Rotation;
use crate::components::scale::Scale;
use crate::error::RenderWarning;
use crate::resources::stageconfig::StageConfig;

/// Recompute geometry and refresh the cached drawables of ready actors.
pub fn refresh_drawables(
    mut query: Query<(&Actor, &ActorLifecycle, &mut ModelInstance, &mut DrawableSet)>,
) {
    for (actor, lifecycle, mut instance, mut drawables) in query.iter_mut() {
        if !lifecycle.is_ready() {
            continue;
        }
        if let Err(w) = drawables.refresh(instance.model_mut()) {
            debug!("actor '{}' refresh: {}", actor.id, w);
        }
    }
}

/// Build this frame's batch for every ready actor.
///
/// Warnings skip only the affected actor (or drawable). Each distinct set of
/// warnings is logged once per actor until it changes.
#[allow(clippy::type_complexity)]
pub fn composite_actors(
    config: Res<StageConfig>,
    mut reported: Local<FxHashMap<Entity, Vec<RenderWarning>>>,
    mut query: Query<(
        Entity,
        &Actor,
        &ActorLifecycle,
        &ModelInstance,
        &DrawableSet,
        &mut Compositor,
        &ModelRoot,
        &Rotation,
        &Scale,
    )>,
) {
    for (entity, actor, lifecycle, instance, drawables, mut compositor, root, rotation, scale) in
        query.iter_mut()
    {
        if !lifecycle.is_ready() {
            continue;
        }
        let placement = RootPlacement {
            origin: root.origin,
            rotation: rotation.degrees,
            scale: scale.scale,
        };
        let warnings = match compositor.render_frame(
            drawables,
            instance.model().canvas_size(),
            config.pixels_per_unit,
            placement,
        ) {
            Ok(batch) => batch.skipped.clone(),
            Err(w) => vec![w],
        };

        let previous = reported.entry(entity).or_default();
        if *previous != warnings {
            for w in &warnings {
                warn!("actor '{}' render: {}", actor.id, w);
            }
            *previous = warnings;
        }
    }
    reported.retain(|e, _| query.contains(*e));
}
