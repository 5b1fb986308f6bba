//! Stage setup and the per-frame schedule.
//!
//! [`setup_stage`] inserts every resource and message queue the actor
//! systems need; [`stage_schedule`] returns the update schedule in pipeline
//! order:
//!
//! 1. loader bridge (only while a [`LoaderBridge`] is installed)
//! 2. script commands
//! 3. load completion
//! 4. transitions and talking
//! 5. parameter blend
//! 6. drawable refresh and compositing
//! 7. disposal
//!
//! Presentation is not part of it; the binary appends
//! [`render_system`](crate::systems::render::render_system) since tests run
//! without a window.

use bevy_ecs::prelude::*;

use crate::events::actor::ActorCommand;
use crate::events::loader::{LoaderCmd, LoaderMessage};
use crate::model::ModelProvider;
use crate::resources::actorregistry::ActorRegistry;
use crate::resources::loader::LoaderBridge;
use crate::resources::modelprovider::ModelProviderRes;
use crate::resources::modelresources::ModelResources;
use crate::resources::stageconfig::StageConfig;
use crate::resources::worldtime::WorldTime;
use crate::systems::actorcommands::{apply_actor_commands, update_actor_commands};
use crate::systems::blend::{advance_talking, blend_parameters};
use crate::systems::composite::{composite_actors, refresh_drawables};
use crate::systems::lifecycle::{dispose_actors, finish_actor_loading};
use crate::systems::loader::{
    forward_loader_cmds, poll_loader_messages, update_loader_cmds, update_loader_messages,
};
use crate::systems::transition::{
    transition_opacity_system, transition_position_system, transition_rotation_system,
    transition_scale_system,
};

/// Insert the stage resources into `world`.
pub fn setup_stage(world: &mut World, config: StageConfig, provider: impl ModelProvider + 'static) {
    world.insert_resource(WorldTime::default().with_time_scale(1.0));
    world.insert_resource(ActorRegistry::new(config.slot_spacing));
    world.insert_resource(config);
    world.insert_resource(ModelResources::default());
    world.insert_resource(ModelProviderRes::new(provider));
    world.init_resource::<Messages<ActorCommand>>();
    world.init_resource::<Messages<LoaderCmd>>();
    world.init_resource::<Messages<LoaderMessage>>();
}

/// The per-frame update schedule.
pub fn stage_schedule() -> Schedule {
    let mut update = Schedule::default();
    update.add_systems(
        (
            // loader systems must be together
            (
                update_loader_cmds,
                forward_loader_cmds,
                poll_loader_messages,
                update_loader_messages,
            )
                .chain()
                .run_if(resource_exists::<LoaderBridge>),
            update_actor_commands,
            apply_actor_commands,
            finish_actor_loading,
            (
                transition_position_system,
                transition_scale_system,
                transition_rotation_system,
                transition_opacity_system,
                advance_talking,
            ),
            blend_parameters,
            refresh_drawables,
            composite_actors,
            dispose_actors,
        )
            .chain(),
    );
    update
}
