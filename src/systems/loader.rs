//! Model loader thread and the systems bridging it with the ECS world.
//!
//! - [`loader_thread`] runs on its own OS thread, owns the
//!   [`ResourceSource`] and a cache of loaded bytes, and answers
//!   [`LoaderCmd`] messages with [`LoaderMessage`] responses.
//! - [`poll_loader_messages`] non-blockingly drains the thread's replies into
//!   the ECS message queue each frame.
//! - [`forward_loader_cmds`] pushes `LoaderCmd` messages written by systems
//!   to the thread.
//!
//! The frame never blocks on I/O: file reads happen on the loader thread and
//! results show up in a later frame.
//!
//! See also: [`crate::events::loader`] and [`crate::resources::loader`].

use bevy_ecs::prelude::*;
use crossbeam_channel::{Receiver, Sender};
use log::{debug, info, warn};
use rustc_hash::FxHashMap;

use crate::events::loader::{LoaderCmd, LoaderMessage};
use crate::resources::loader::{LoaderBridge, ResourceSource};
use crate::resources::modelresources::ModelResource;

/// Drain any pending replies from the loader thread into
/// [`Messages<LoaderMessage>`].
pub fn poll_loader_messages(bridge: Res<LoaderBridge>, mut writer: MessageWriter<LoaderMessage>) {
    writer.write_batch(bridge.rx_msg.try_iter());
}

/// Advance the ECS message queue for [`LoaderMessage`].
///
/// Bevy ECS' [`Messages`] API requires calling `update()` once per frame.
/// Run this after [`poll_loader_messages`] in your schedule.
pub fn update_loader_messages(mut msgs: ResMut<Messages<LoaderMessage>>) {
    msgs.update();
}

/// Forward ECS [`LoaderCmd`] messages to the loader thread.
pub fn forward_loader_cmds(bridge: Res<LoaderBridge>, mut reader: MessageReader<LoaderCmd>) {
    for cmd in reader.read() {
        // Ignore send errors; the thread is gone during shutdown.
        let _ = bridge.tx_cmd.send(cmd.clone());
    }
}

/// Advance the ECS message queue for [`LoaderCmd`].
pub fn update_loader_cmds(mut msgs: ResMut<Messages<LoaderCmd>>) {
    msgs.update();
}

/// Entry point of the dedicated loader thread.
///
/// Blocks on the command channel, so it sleeps while there is nothing to
/// load. Loaded bytes are cached until unloaded, which makes repeated loads
/// of the same model cheap. Exits on [`LoaderCmd::Shutdown`] or when every
/// sender is gone.
pub fn loader_thread<S: ResourceSource>(
    mut source: S,
    rx_cmd: Receiver<LoaderCmd>,
    tx_msg: Sender<LoaderMessage>,
) {
    info!(
        "[loader] thread starting (id={:?})",
        std::thread::current().id()
    );

    let mut cache: FxHashMap<String, ModelResource> = FxHashMap::default();

    while let Ok(cmd) = rx_cmd.recv() {
        match cmd {
            LoaderCmd::Load { id } => {
                if let Some(resource) = cache.get(&id) {
                    debug!("[loader] cache hit id='{}'", id);
                    let _ = tx_msg.send(LoaderMessage::Loaded {
                        id,
                        resource: resource.clone(),
                    });
                    continue;
                }
                match source.load(&id) {
                    Ok(resource) => {
                        info!(
                            "[loader] loaded id='{}' bytes={}",
                            id,
                            resource.bytes.len()
                        );
                        cache.insert(id.clone(), resource.clone());
                        let _ = tx_msg.send(LoaderMessage::Loaded { id, resource });
                    }
                    Err(error) => {
                        warn!("[loader] load failed id='{}' error='{}'", id, error);
                        let _ = tx_msg.send(LoaderMessage::LoadFailed { id, error });
                    }
                }
            }
            LoaderCmd::Unload { id } => {
                if cache.remove(&id).is_some() {
                    info!("[loader] unload id='{}'", id);
                    let _ = tx_msg.send(LoaderMessage::Unloaded { id });
                }
            }
            LoaderCmd::UnloadAll => {
                info!("[loader] unload all ({} cached)", cache.len());
                cache.clear();
                let _ = tx_msg.send(LoaderMessage::UnloadedAll);
            }
            LoaderCmd::Shutdown => {
                info!("[loader] shutdown requested");
                cache.clear();
                break;
            }
        }
    }

    info!(
        "[loader] thread exiting (id={:?})",
        std::thread::current().id()
    );
}
