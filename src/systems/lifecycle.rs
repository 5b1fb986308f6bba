//! Actor lifecycle systems.
//!
//! - [`finish_actor_loading`] turns loader replies into ready (or failed)
//!   actors: `Loading -> Ready` or `Loading -> Disposed`.
//! - [`dispose_actors`] tears down `Disposing` actors: `Disposing -> Disposed`.
//!
//! Both exit paths release everything the actor acquired along the way:
//! placement slot, model hold, event subscriptions and render surface.

use bevy_ecs::observer::{Observer, On};
use bevy_ecs::prelude::*;
use log::{debug, error, info, warn};
use rustc_hash::FxHashMap;

use crate::components::actor::Actor;
use crate::components::appearance::AppearanceBindings;
use crate::components::compositor::{CompositeOutput, Compositor};
use crate::components::drawableset::DrawableSet;
use crate::components::lifecycle::{ActorLifecycle, LifecycleState, PendingRemoval};
use crate::components::modelinstance::{ModelInstance, ModelRoot};
use crate::components::subscriptions::EventSubscriptions;
use crate::components::talk::Talking;
use crate::components::transition::{
    OpacityTransition, PositionTransition, RotationTransition, ScaleTransition,
};
use crate::error::ActorError;
use crate::events::actor::{ActorLoadFailedEvent, ActorReadyEvent};
use crate::events::aspect::AspectChangedEvent;
use crate::events::loader::{LoaderCmd, LoaderMessage};
use crate::events::print::{PrintFinishedEvent, PrintStartedEvent, VoiceStoppedEvent};
use crate::model::DeformationModel;
use crate::resources::actorregistry::ActorRegistry;
use crate::resources::modelprovider::ModelProviderRes;
use crate::resources::modelresources::{HolderId, ModelResources};
use crate::resources::stageconfig::{OutputKind, StageConfig};

/// Consume [`LoaderMessage`]s and settle every `Loading` actor whose model
/// is now resident or failed to load.
///
/// A model that arrives after all its holders are gone is sent straight back
/// to the loader for unloading.
#[allow(clippy::too_many_arguments, clippy::type_complexity)]
pub fn finish_actor_loading(
    mut commands: Commands,
    mut messages: MessageReader<LoaderMessage>,
    mut loader: MessageWriter<LoaderCmd>,
    mut resources: ResMut<ModelResources>,
    mut registry: ResMut<ActorRegistry>,
    provider: Res<ModelProviderRes>,
    config: Res<StageConfig>,
    mut actors: Query<(
        Entity,
        &Actor,
        &mut ActorLifecycle,
        &mut AppearanceBindings,
        &mut EventSubscriptions,
        Option<&ModelRoot>,
    )>,
) {
    let mut failures: FxHashMap<String, ActorError> = FxHashMap::default();
    for msg in messages.read() {
        match msg {
            LoaderMessage::Loaded { id, resource } => {
                if resources.holder_count(id) == 0 {
                    debug!("model '{}' arrived with no holders, unloading", id);
                    loader.write(LoaderCmd::Unload { id: id.clone() });
                } else {
                    resources.insert_resident(resource.clone());
                }
            }
            LoaderMessage::LoadFailed { id, error } => {
                failures.insert(id.clone(), error.clone());
            }
            LoaderMessage::Unloaded { id } => debug!("model '{}' unloaded", id),
            LoaderMessage::UnloadedAll => debug!("all models unloaded"),
        }
    }

    for (entity, actor, mut lifecycle, mut bindings, mut subscriptions, root) in actors.iter_mut() {
        if lifecycle.state() != LifecycleState::Loading {
            continue;
        }
        let Some(model_id) = actor.model_id.as_deref() else {
            continue;
        };
        let outcome = if let Some(err) = failures.get(model_id) {
            Err(err.clone())
        } else if let Some(resource) = resources.resident(model_id) {
            provider.0.instantiate(resource)
        } else {
            continue;
        };

        match outcome {
            Ok(mut model) => {
                for binding in model.appearance_bindings() {
                    bindings.insert_default(binding);
                }
                let mut drawables = DrawableSet::default();
                if let Err(w) = drawables.rebuild(model.as_mut()) {
                    warn!("actor '{}': {}", actor.id, w);
                }
                let output = match config.output {
                    OutputKind::Sprite => CompositeOutput::Sprite,
                    OutputKind::Texture => CompositeOutput::Texture {
                        name: actor.id.clone(),
                    },
                };
                if let Err(err) = lifecycle.advance(&actor.id, LifecycleState::Ready) {
                    warn!("{}", err);
                    continue;
                }
                subscribe(&mut commands, &mut subscriptions, entity, &actor.id);
                info!(
                    "actor '{}' ready with {} drawables",
                    actor.id,
                    drawables.len()
                );
                commands.entity(entity).insert((
                    ModelInstance(model),
                    drawables,
                    Compositor::new(output),
                ));
                commands.trigger(ActorReadyEvent {
                    entity,
                    id: actor.id.clone(),
                });
            }
            Err(err) => {
                error!("actor '{}' failed to load: {}", actor.id, err);
                if let Err(e) = lifecycle.advance(&actor.id, LifecycleState::Disposed) {
                    warn!("{}", e);
                }
                if let Some(root) = root {
                    registry.slots.free(root.slot);
                    commands.entity(entity).remove::<ModelRoot>();
                }
                if resources.release(model_id, &HolderId::Actor(entity), None)
                    && resources.evict(model_id)
                {
                    loader.write(LoaderCmd::Unload {
                        id: model_id.to_string(),
                    });
                }
                subscriptions.unsubscribe_all(&mut commands);
                commands.trigger(ActorLoadFailedEvent {
                    entity,
                    id: actor.id.clone(),
                    error: err,
                });
            }
        }
    }
}

/// Open the actor's event subscriptions. Each observer filters on the
/// actor's id and touches only this entity.
fn subscribe(
    commands: &mut Commands,
    subscriptions: &mut EventSubscriptions,
    entity: Entity,
    id: &str,
) {
    let author = id.to_string();
    let started = commands
        .spawn(Observer::new(
            move |trigger: On<PrintStartedEvent>, mut talking: Query<&mut Talking>| {
                let ev = trigger.event();
                if ev.author != author {
                    return;
                }
                if let Ok(mut t) = talking.get_mut(entity) {
                    t.start(ev.voiced);
                }
            },
        ))
        .id();

    let author = id.to_string();
    let finished = commands
        .spawn(Observer::new(
            move |trigger: On<PrintFinishedEvent>, mut talking: Query<&mut Talking>| {
                if trigger.event().author != author {
                    return;
                }
                if let Ok(mut t) = talking.get_mut(entity) {
                    if !t.voiced {
                        t.stop();
                    }
                }
            },
        ))
        .id();

    let author = id.to_string();
    let voice = commands
        .spawn(Observer::new(
            move |trigger: On<VoiceStoppedEvent>, mut talking: Query<&mut Talking>| {
                if trigger.event().author != author {
                    return;
                }
                if let Ok(mut t) = talking.get_mut(entity) {
                    t.stop();
                }
            },
        ))
        .id();

    let aspect = commands
        .spawn(Observer::new(
            move |_trigger: On<AspectChangedEvent>, mut compositors: Query<&mut Compositor>| {
                if let Ok(mut c) = compositors.get_mut(entity) {
                    c.invalidate();
                }
            },
        ))
        .id();

    for observer in [started, finished, voice, aspect] {
        subscriptions.push(observer);
    }
}

/// Finish tearing down every `Disposing` actor.
///
/// Actors marked [`PendingRemoval`] are despawned and forgotten afterwards;
/// the rest stay registered as `Disposed`.
#[allow(clippy::type_complexity)]
pub fn dispose_actors(
    mut commands: Commands,
    mut registry: ResMut<ActorRegistry>,
    mut resources: ResMut<ModelResources>,
    mut loader: MessageWriter<LoaderCmd>,
    mut actors: Query<(
        Entity,
        &Actor,
        &mut ActorLifecycle,
        &mut EventSubscriptions,
        Option<&mut Compositor>,
        Option<&ModelRoot>,
        Has<PendingRemoval>,
    )>,
    mut transitions: Query<(
        &mut PositionTransition,
        &mut ScaleTransition,
        &mut RotationTransition,
        &mut OpacityTransition,
    )>,
) {
    for (entity, actor, mut lifecycle, mut subscriptions, compositor, root, remove) in
        actors.iter_mut()
    {
        if lifecycle.state() != LifecycleState::Disposing {
            continue;
        }
        if let Some(mut compositor) = compositor {
            compositor.release();
        }
        if let Ok((mut pos, mut scale, mut rot, mut opacity)) = transitions.get_mut(entity) {
            pos.0.cancel();
            scale.0.cancel();
            rot.0.cancel();
            opacity.0.cancel();
        }
        subscriptions.unsubscribe_all(&mut commands);
        if let Some(root) = root {
            registry.slots.free(root.slot);
        }
        commands
            .entity(entity)
            .remove::<(ModelInstance, DrawableSet, Compositor, ModelRoot)>();

        if let Some(model) = actor.model_id.as_deref() {
            if resources.release(model, &HolderId::Actor(entity), None) && resources.evict(model) {
                loader.write(LoaderCmd::Unload {
                    id: model.to_string(),
                });
            }
        }

        if let Err(err) = lifecycle.advance(&actor.id, LifecycleState::Disposed) {
            warn!("{}", err);
            continue;
        }
        info!("actor '{}' disposed", actor.id);

        if remove {
            registry.remove(&actor.id, actor.model_id.as_deref());
            commands.entity(entity).despawn();
        }
    }
}
