//! Aberred Stage demo binary.
//!
//! Opens a window, loads the actors given on the command line and shows
//! them, fading each one in.
//!
//! High-level flow:
//! 1. Initialize logging and parse command line arguments
//! 2. Load `StageConfig` from its INI file (defaults when missing)
//! 3. Open the raylib window and create the ECS world
//! 4. Insert stage resources, start the loader thread
//! 5. Queue `Initialize` and `SetVisibility` commands for every `--actor`
//! 6. Run the schedule every frame until the window closes
//!
//! ```text
//! aberredstage --models ./assets/models --actor hero=hero --actor rival=villain
//! ```

use std::path::PathBuf;

use bevy_ecs::prelude::*;
use clap::Parser;
use raylib::prelude::Vector2;

use aberredstage::components::transition::Easing;
use aberredstage::events::actor::ActorCommand;
use aberredstage::events::aspect::AspectChangedEvent;
use aberredstage::model::rig::RigProvider;
use aberredstage::resources::loader::{FsSource, setup_loader, shutdown_loader};
use aberredstage::resources::rendertarget::SurfaceStore;
use aberredstage::resources::stageconfig::StageConfig;
use aberredstage::resources::texturestore::TextureStore;
use aberredstage::stage::{setup_stage, stage_schedule};
use aberredstage::systems::lifecycle::dispose_actors;
use aberredstage::systems::render::render_system;
use aberredstage::systems::time::update_world_time;

/// Aberred Stage
#[derive(Parser)]
#[command(version, about = "Parametric actor compositing on bevy_ecs and raylib")]
struct Cli {
    /// Configuration file.
    #[arg(long, value_name = "PATH", default_value = "./stage.ini")]
    config: PathBuf,

    /// Directory holding the `<model>.json` rigs. Overrides the config file.
    #[arg(long, value_name = "DIR")]
    models: Option<PathBuf>,

    /// Actor to put on stage, as ID=MODEL. May be repeated.
    #[arg(long = "actor", value_name = "ID=MODEL", value_parser = parse_actor)]
    actors: Vec<(String, String)>,
}

fn parse_actor(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((id, model)) if !id.is_empty() && !model.is_empty() => {
            Ok((id.to_string(), model.to_string()))
        }
        _ => Err(format!("expected ID=MODEL, got '{}'", s)),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = StageConfig::with_path(&cli.config);
    if let Err(e) = config.load_from_file() {
        log::info!("{}; using defaults", e);
    }
    if let Some(models) = cli.models {
        config.models_path = models;
    }

    let (window_width, window_height) = config.window_size();
    let mut builder = raylib::init();
    builder
        .size(window_width as i32, window_height as i32)
        .resizable()
        .title("Aberred Stage");
    if config.vsync {
        builder.vsync();
    }
    let (mut rl, thread) = builder.build();
    rl.set_target_fps(config.target_fps);
    rl.set_exit_key(None);

    // --------------- ECS world + resources ---------------
    let mut world = World::new();
    let models_path = config.models_path.clone();
    let scene_width = config.reference_width as f32;
    let scene_height = config.reference_height as f32;
    let spacing = scene_width / (cli.actors.len() + 1) as f32;
    setup_stage(&mut world, config, RigProvider);
    setup_loader(&mut world, FsSource::new(&models_path));
    world.insert_non_send_resource(SurfaceStore::new());
    world.insert_non_send_resource(TextureStore::new(&models_path));
    world.insert_non_send_resource(rl);
    world.insert_non_send_resource(thread);

    for (i, (id, model)) in cli.actors.iter().enumerate() {
        world.write_message(ActorCommand::Initialize {
            actor: id.clone(),
            model: model.clone(),
        });
        world.write_message(ActorCommand::SetPosition {
            actor: id.clone(),
            position: Vector2 {
                x: spacing * (i + 1) as f32,
                y: scene_height * 0.5,
            },
            duration: 0.0,
            easing: Easing::Linear,
            token: None,
        });
        world.write_message(ActorCommand::SetVisibility {
            actor: id.clone(),
            visible: true,
            duration: 0.5,
            token: None,
        });
    }

    let mut update = stage_schedule();
    update.add_systems(render_system.after(dispose_actors));
    update
        .initialize(&mut world)
        .expect("Failed to initialize schedule");

    // --------------- Main loop ---------------
    let mut window = (window_width as i32, window_height as i32);
    while !world
        .non_send_resource::<raylib::RaylibHandle>()
        .window_should_close()
    {
        let dt = world
            .non_send_resource::<raylib::RaylibHandle>()
            .get_frame_time();
        update_world_time(&mut world, dt);

        update.run(&mut world);

        world.clear_trackers();

        let size = {
            let rl = world.non_send_resource::<raylib::RaylibHandle>();
            (rl.get_screen_width(), rl.get_screen_height())
        };
        if size != window {
            window = size;
            world.trigger(AspectChangedEvent {
                width: size.0,
                height: size.1,
            });
        }
    }
    world.write_message(ActorCommand::UnloadAll);
    update.run(&mut world);
    shutdown_loader(&mut world);
}
