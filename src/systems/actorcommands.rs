//! Applies [`ActorCommand`] messages to actor entities.
//!
//! This is the only place actors are created. A command addressing an id
//! that is not registered yet spawns a fresh `Unloaded` actor first (except
//! holds, releases and disposal, which need an existing actor).
//!
//! Setters are accepted in any live state: values requested while the model
//! is still loading are simply there when it becomes ready. Disposing and
//! disposed actors reject them with [`ActorError::InvalidState`].
//!
//! Runs as an exclusive system so that commands issued for a new actor in the
//! same frame see the components spawned by the first one.

use bevy_ecs::prelude::*;
use bevy_ecs::system::SystemState;
use log::{debug, info, warn};
use raylib::prelude::Vector2;

use crate::components::actor::Actor;
use crate::components::appearance::{Appearance, AppearanceBindings};
use crate::components::gaze::Gaze;
use crate::components::lifecycle::{ActorLifecycle, LifecycleState, PendingRemoval};
use crate::components::mapposition::MapPosition;
use crate::components::modelinstance::ModelRoot;
use crate::components::rotation::Rotation;
use crate::components::scale::Scale;
use crate::components::subscriptions::EventSubscriptions;
use crate::components::talk::Talking;
use crate::components::tint::Tint;
use crate::components::transition::{
    Easing, OpacityTransition, PositionTransition, RotationTransition, ScaleTransition,
};
use crate::components::visibility::ActorVisibility;
use crate::components::zindex::ZIndex;
use crate::error::ActorError;
use crate::events::actor::ActorCommand;
use crate::events::loader::LoaderCmd;
use crate::resources::actorregistry::ActorRegistry;
use crate::resources::modelresources::{HolderId, ModelResources};
use crate::resources::stageconfig::StageConfig;

/// Advance the ECS message queue for [`ActorCommand`].
///
/// Run before [`apply_actor_commands`].
pub fn update_actor_commands(mut msgs: ResMut<Messages<ActorCommand>>) {
    msgs.update();
}

/// Apply every pending [`ActorCommand`]. Rejected commands are logged and
/// dropped.
pub fn apply_actor_commands(
    world: &mut World,
    reader: &mut SystemState<MessageReader<ActorCommand>>,
) {
    let pending: Vec<ActorCommand> = reader.get_mut(world).read().cloned().collect();
    for cmd in pending {
        if let Err(err) = apply_command(world, cmd) {
            warn!("actor command rejected: {}", err);
        }
    }
}

/// Apply a single command.
pub fn apply_command(world: &mut World, cmd: ActorCommand) -> Result<(), ActorError> {
    let create = cmd.creates_actor();
    match cmd {
        ActorCommand::Initialize { actor, model } => {
            let entity = actor_entity(world, &actor, create)?;
            initialize(world, entity, &actor, model)
        }
        ActorCommand::SetAppearance {
            actor,
            name,
            duration,
        } => {
            let entity = live_actor(world, &actor, create)?;
            let speed = world.resource::<StageConfig>().speed_for(duration);
            let mut e = world.entity_mut(entity);
            if let Some(n) = name.as_deref().filter(|n| !n.is_empty()) {
                let ready = e.get::<ActorLifecycle>().is_some_and(|l| l.is_ready());
                let known = e.get::<AppearanceBindings>().is_some_and(|b| b.contains(n));
                if ready && !known {
                    warn!(
                        "actor '{}' has no appearance '{}', blending to defaults",
                        actor, n
                    );
                }
            }
            if let Some(mut appearance) = e.get_mut::<Appearance>() {
                appearance.request(name.as_deref(), speed);
            }
            Ok(())
        }
        ActorCommand::BindAppearance { actor, binding } => {
            let entity = live_actor(world, &actor, create)?;
            if let Some(mut bindings) = world.get_mut::<AppearanceBindings>(entity) {
                debug!("actor '{}' bound appearance '{}'", actor, binding.name);
                bindings.insert(binding);
            }
            Ok(())
        }
        ActorCommand::SetVisibility {
            actor,
            visible,
            duration,
            token,
        } => {
            let entity = live_actor(world, &actor, create)?;
            let mut e = world.entity_mut(entity);
            let current = match e.get_mut::<ActorVisibility>() {
                Some(mut vis) => {
                    vis.visible = visible;
                    vis.opacity
                }
                None => 0.0,
            };
            if visible {
                if let Some(mut tint) = e.get_mut::<Tint>() {
                    tint.restore_alpha();
                }
            }
            if let Some(mut slot) = e.get_mut::<OpacityTransition>() {
                let target = if visible { 1.0 } else { 0.0 };
                slot.0.start(
                    current,
                    target,
                    duration,
                    Easing::Linear,
                    token.unwrap_or_default(),
                );
            }
            Ok(())
        }
        ActorCommand::SetPosition {
            actor,
            position,
            duration,
            easing,
            token,
        } => {
            let entity = live_actor(world, &actor, create)?;
            let mut e = world.entity_mut(entity);
            let current = e.get::<MapPosition>().map_or(Vector2::zero(), |p| p.pos);
            if let Some(mut slot) = e.get_mut::<PositionTransition>() {
                slot.0
                    .start(current, position, duration, easing, token.unwrap_or_default());
            }
            Ok(())
        }
        ActorCommand::SetScale {
            actor,
            scale,
            duration,
            easing,
            token,
        } => {
            let entity = live_actor(world, &actor, create)?;
            let mut e = world.entity_mut(entity);
            let current = e.get::<Scale>().map_or(Vector2::one(), |s| s.scale);
            if let Some(mut slot) = e.get_mut::<ScaleTransition>() {
                slot.0
                    .start(current, scale, duration, easing, token.unwrap_or_default());
            }
            Ok(())
        }
        ActorCommand::SetRotation {
            actor,
            degrees,
            duration,
            easing,
            token,
        } => {
            let entity = live_actor(world, &actor, create)?;
            let mut e = world.entity_mut(entity);
            let current = e.get::<Rotation>().map_or(0.0, |r| r.degrees);
            if let Some(mut slot) = e.get_mut::<RotationTransition>() {
                slot.0
                    .start(current, degrees, duration, easing, token.unwrap_or_default());
            }
            Ok(())
        }
        ActorCommand::SetLookDirection {
            actor,
            direction,
            duration,
        } => {
            let entity = live_actor(world, &actor, create)?;
            let (look_angle, speed) = {
                let config = world.resource::<StageConfig>();
                (config.look_angle, config.speed_for(duration))
            };
            if let Some(mut gaze) = world.get_mut::<Gaze>(entity) {
                gaze.look(direction, look_angle, speed);
            }
            Ok(())
        }
        ActorCommand::SetTalking { actor, talking } => {
            let entity = live_actor(world, &actor, create)?;
            if let Some(mut talk) = world.get_mut::<Talking>(entity) {
                if talking {
                    talk.start(false);
                } else {
                    talk.stop();
                }
            }
            Ok(())
        }
        ActorCommand::SetTint { actor, color } => {
            let entity = live_actor(world, &actor, create)?;
            let mut e = world.entity_mut(entity);
            let visible = e.get::<ActorVisibility>().is_some_and(|v| v.visible);
            if let Some(mut tint) = e.get_mut::<Tint>() {
                tint.set(color, visible);
            }
            Ok(())
        }
        ActorCommand::Hold {
            actor,
            holder,
            appearance,
        } => {
            let entity = actor_entity(world, &actor, create)?;
            let model = ready_model(world, entity, &actor)?;
            world.resource_mut::<ModelResources>().hold(
                &model,
                HolderId::External(holder),
                appearance.as_deref(),
            );
            Ok(())
        }
        ActorCommand::Release {
            actor,
            holder,
            appearance,
        } => {
            let Some(model) = held_model(world, &actor)? else {
                debug!("actor '{}' has no model to release", actor);
                return Ok(());
            };
            let evicted = {
                let mut resources = world.resource_mut::<ModelResources>();
                resources.release(&model, &HolderId::External(holder), appearance.as_deref())
                    && resources.evict(&model)
            };
            if evicted {
                world.write_message(LoaderCmd::Unload { id: model });
            }
            Ok(())
        }
        ActorCommand::Dispose { actor } => {
            let entity = actor_entity(world, &actor, create)?;
            dispose(world, entity, &actor, false)
        }
        ActorCommand::Remove { actor } => {
            let entity = actor_entity(world, &actor, create)?;
            dispose(world, entity, &actor, true)
        }
        ActorCommand::UnloadAll => {
            unload_all(world);
            Ok(())
        }
    }
}

/// Spawn a new `Unloaded` actor and register it under `id`.
pub fn spawn_actor(world: &mut World, id: &str) -> Entity {
    let entity = world
        .spawn((
            (
                Actor::new(id),
                ActorLifecycle::default(),
                MapPosition::default(),
                Scale::default(),
                Rotation::default(),
                ZIndex::default(),
                Tint::default(),
                ActorVisibility::default(),
            ),
            (
                Appearance::default(),
                AppearanceBindings::default(),
                Gaze::default(),
                Talking::default(),
            ),
            (
                PositionTransition::default(),
                ScaleTransition::default(),
                RotationTransition::default(),
                OpacityTransition::default(),
                EventSubscriptions::default(),
            ),
        ))
        .id();
    world.resource_mut::<ActorRegistry>().insert(id, entity);
    debug!("actor '{}' created as {:?}", id, entity);
    entity
}

fn actor_entity(world: &mut World, id: &str, create: bool) -> Result<Entity, ActorError> {
    if let Some(entity) = world.resource::<ActorRegistry>().get(id) {
        return Ok(entity);
    }
    if !create {
        return Err(ActorError::UnknownActor(id.to_string()));
    }
    Ok(spawn_actor(world, id))
}

fn lifecycle_state(world: &World, entity: Entity) -> LifecycleState {
    world
        .get::<ActorLifecycle>(entity)
        .map_or(LifecycleState::Disposed, ActorLifecycle::state)
}

/// Resolve an actor that may still receive setters.
fn live_actor(world: &mut World, id: &str, create: bool) -> Result<Entity, ActorError> {
    let entity = actor_entity(world, id, create)?;
    match lifecycle_state(world, entity) {
        state @ (LifecycleState::Disposing | LifecycleState::Disposed) => {
            Err(ActorError::InvalidState {
                id: id.to_string(),
                state,
            })
        }
        _ => Ok(entity),
    }
}

/// Model id of a ready actor.
fn ready_model(world: &World, entity: Entity, id: &str) -> Result<String, ActorError> {
    let state = lifecycle_state(world, entity);
    let model = world.get::<Actor>(entity).and_then(|a| a.model_id.clone());
    match (state, model) {
        (LifecycleState::Ready, Some(model)) => Ok(model),
        (state, _) => Err(ActorError::InvalidState {
            id: id.to_string(),
            state,
        }),
    }
}

/// Model id for a release, in any lifecycle state, including after removal.
fn held_model(world: &World, id: &str) -> Result<Option<String>, ActorError> {
    let registry = world.resource::<ActorRegistry>();
    match registry.get(id) {
        Some(entity) => Ok(world.get::<Actor>(entity).and_then(|a| a.model_id.clone())),
        None => registry
            .retired_model(id)
            .map(|model| Some(model.to_string()))
            .ok_or_else(|| ActorError::UnknownActor(id.to_string())),
    }
}

fn initialize(
    world: &mut World,
    entity: Entity,
    id: &str,
    model: String,
) -> Result<(), ActorError> {
    let state = lifecycle_state(world, entity);
    let current = world.get::<Actor>(entity).and_then(|a| a.model_id.clone());
    match state {
        LifecycleState::Unloaded => {}
        LifecycleState::Loading | LifecycleState::Ready if current.as_deref() == Some(&model) => {
            debug!("actor '{}' already initialized with '{}'", id, model);
            return Ok(());
        }
        _ => {
            return Err(ActorError::InvalidState {
                id: id.to_string(),
                state,
            });
        }
    }

    if let Some(mut lifecycle) = world.get_mut::<ActorLifecycle>(entity) {
        lifecycle.advance(id, LifecycleState::Loading)?;
    }
    if let Some(mut actor) = world.get_mut::<Actor>(entity) {
        actor.model_id = Some(model.clone());
    }
    let (slot, origin) = world.resource_mut::<ActorRegistry>().slots.allocate();
    world.entity_mut(entity).insert(ModelRoot { slot, origin });

    let resident = {
        let mut resources = world.resource_mut::<ModelResources>();
        resources.hold(&model, HolderId::Actor(entity), None);
        resources.is_valid(&model)
    };
    info!(
        "actor '{}' loading model '{}' in slot {}{}",
        id,
        model,
        slot,
        if resident { " (resident)" } else { "" }
    );
    if !resident {
        world.write_message(LoaderCmd::Load { id: model });
    }
    Ok(())
}

fn dispose(world: &mut World, entity: Entity, id: &str, remove: bool) -> Result<(), ActorError> {
    match lifecycle_state(world, entity) {
        LifecycleState::Loading | LifecycleState::Ready => {
            if let Some(mut lifecycle) = world.get_mut::<ActorLifecycle>(entity) {
                lifecycle.advance(id, LifecycleState::Disposing)?;
            }
            if remove {
                world.entity_mut(entity).insert(PendingRemoval);
            }
        }
        LifecycleState::Disposing => {
            if remove {
                world.entity_mut(entity).insert(PendingRemoval);
            }
        }
        LifecycleState::Unloaded | LifecycleState::Disposed => {
            if remove {
                let model = world.get::<Actor>(entity).and_then(|a| a.model_id.clone());
                world
                    .resource_mut::<ActorRegistry>()
                    .remove(id, model.as_deref());
                world.despawn(entity);
                debug!("actor '{}' removed", id);
            }
        }
    }
    Ok(())
}

fn unload_all(world: &mut World) {
    let mut query = world.query::<(&Actor, &mut ActorLifecycle)>();
    let mut disposing = 0;
    for (actor, mut lifecycle) in query.iter_mut(world) {
        if matches!(
            lifecycle.state(),
            LifecycleState::Loading | LifecycleState::Ready
        ) && lifecycle.advance(&actor.id, LifecycleState::Disposing).is_ok()
        {
            disposing += 1;
        }
    }
    let forgotten = world.resource_mut::<ModelResources>().unload_all();
    info!(
        "unloading everything: {} actors disposing, {} models dropped",
        disposing, forgotten
    );
    world.write_message(LoaderCmd::UnloadAll);
}
