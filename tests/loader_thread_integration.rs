//! Loader thread integration tests.
//!
//! Drives the stage schedule with a real loader thread behind the bridge and
//! waits (bounded) for model resources to come back.

use std::time::Duration;

use bevy_ecs::prelude::*;

use aberredstage::components::lifecycle::{ActorLifecycle, LifecycleState};
use aberredstage::events::actor::ActorCommand;
use aberredstage::model::rig::RigProvider;
use aberredstage::resources::actorregistry::ActorRegistry;
use aberredstage::resources::loader::{LoaderBridge, MemorySource, setup_loader, shutdown_loader};
use aberredstage::resources::modelresources::ModelResources;
use aberredstage::resources::stageconfig::StageConfig;
use aberredstage::stage::{setup_stage, stage_schedule};
use aberredstage::systems::time::update_world_time;

const RIG: &str = r#"{
    "canvas": [2.0, 3.0],
    "parameters": [ { "id": "ParamMouthOpenY", "min": 0, "max": 1, "default": 0 } ],
    "parts": [
        { "id": "body", "texture": "hero/body", "mesh": { "size": [2.0, 3.0] } }
    ]
}"#;

const MAX_FRAMES: usize = 400;

fn make_world() -> (World, Schedule) {
    let mut world = World::new();
    setup_stage(&mut world, StageConfig::new(), RigProvider);
    setup_loader(
        &mut world,
        MemorySource::default().with("hero", RIG.as_bytes().to_vec()),
    );
    (world, stage_schedule())
}

fn state(world: &World, id: &str) -> LifecycleState {
    let entity = world.resource::<ActorRegistry>().get(id).unwrap();
    world.get::<ActorLifecycle>(entity).unwrap().state()
}

/// Tick until `id` leaves `Loading` (or the frame budget runs out).
fn run_until_settled(world: &mut World, schedule: &mut Schedule, id: &str) -> LifecycleState {
    for _ in 0..MAX_FRAMES {
        update_world_time(world, 1.0 / 60.0);
        schedule.run(world);
        let s = state(world, id);
        if s != LifecycleState::Loading && s != LifecycleState::Unloaded {
            return s;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    state(world, id)
}

#[test]
fn model_loaded_on_the_thread_makes_the_actor_ready() {
    let (mut world, mut schedule) = make_world();
    world.write_message(ActorCommand::Initialize {
        actor: "hero".into(),
        model: "hero".into(),
    });

    assert_eq!(
        run_until_settled(&mut world, &mut schedule, "hero"),
        LifecycleState::Ready
    );
    let resources = world.resource::<ModelResources>();
    assert!(resources.is_valid("hero"));
    assert_eq!(resources.holder_count("hero"), 1);

    shutdown_loader(&mut world);
    assert!(!world.contains_resource::<LoaderBridge>());
}

#[test]
fn missing_model_disposes_the_actor() {
    let (mut world, mut schedule) = make_world();
    world.write_message(ActorCommand::Initialize {
        actor: "ghost".into(),
        model: "villain".into(),
    });

    assert_eq!(
        run_until_settled(&mut world, &mut schedule, "ghost"),
        LifecycleState::Disposed
    );
    assert_eq!(world.resource::<ActorRegistry>().slots.in_use(), 0);
    assert!(!world.resource::<ModelResources>().is_valid("villain"));

    shutdown_loader(&mut world);
}

#[test]
fn two_actors_share_one_load() {
    let (mut world, mut schedule) = make_world();
    for id in ["left", "right"] {
        world.write_message(ActorCommand::Initialize {
            actor: id.into(),
            model: "hero".into(),
        });
    }

    assert_eq!(
        run_until_settled(&mut world, &mut schedule, "left"),
        LifecycleState::Ready
    );
    assert_eq!(
        run_until_settled(&mut world, &mut schedule, "right"),
        LifecycleState::Ready
    );
    assert_eq!(world.resource::<ModelResources>().holder_count("hero"), 2);

    world.write_message(ActorCommand::UnloadAll);
    update_world_time(&mut world, 1.0 / 60.0);
    schedule.run(&mut world);
    assert_eq!(state(&world, "left"), LifecycleState::Disposed);
    assert_eq!(state(&world, "right"), LifecycleState::Disposed);

    shutdown_loader(&mut world);
}
