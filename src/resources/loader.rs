//! ECS resources that bridge the main thread with the background loader thread.
//!
//! Use [`setup_loader`] once during initialization to spawn the loader thread
//! and insert the [`LoaderBridge`] and the `Messages<LoaderCmd>` /
//! `Messages<LoaderMessage>` resources. Call [`shutdown_loader`] during
//! teardown to stop the thread and drop every cached resource.

use std::path::PathBuf;
use std::sync::Arc;

use bevy_ecs::prelude::*;
use crossbeam_channel::{Receiver, Sender, unbounded};
use rustc_hash::FxHashMap;

use crate::error::ActorError;
use crate::events::loader::{LoaderCmd, LoaderMessage};
use crate::resources::modelresources::ModelResource;
use crate::systems::loader::loader_thread;

/// Where model bytes come from.
///
/// Runs on the loader thread, so implementations may block.
pub trait ResourceSource: Send + 'static {
    fn load(&mut self, id: &str) -> Result<ModelResource, ActorError>;
}

/// Reads `<root>/<id>.json` from disk.
#[derive(Debug, Clone)]
pub struct FsSource {
    pub root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, id: &str) -> PathBuf {
        self.root.join(format!("{}.json", id))
    }
}

impl ResourceSource for FsSource {
    fn load(&mut self, id: &str) -> Result<ModelResource, ActorError> {
        let path = self.path_for(id);
        let bytes = std::fs::read(&path)
            .map_err(|e| ActorError::load_failure(id, format!("{}: {}", path.display(), e)))?;
        Ok(ModelResource::new(id, bytes))
    }
}

/// Serves resources registered up front. Used by tests and embedders.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    entries: FxHashMap<String, Arc<[u8]>>,
}

impl MemorySource {
    pub fn with(mut self, id: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        self.entries.insert(id.into(), bytes.into());
        self
    }
}

impl ResourceSource for MemorySource {
    fn load(&mut self, id: &str) -> Result<ModelResource, ActorError> {
        self.entries
            .get(id)
            .map(|bytes| ModelResource {
                id: id.to_string(),
                bytes: Arc::clone(bytes),
            })
            .ok_or_else(|| ActorError::load_failure(id, "no such resource"))
    }
}

/// Shared bridge between the ECS world and the loader thread.
///
/// This resource is created by [`setup_loader`]. Systems send commands via
/// [`LoaderBridge::tx_cmd`] and poll for results via [`LoaderBridge::rx_msg`].
#[derive(Resource)]
pub struct LoaderBridge {
    /// Sender for [`LoaderCmd`] messages (ECS -> loader thread).
    pub tx_cmd: Sender<LoaderCmd>,
    /// Receiver for [`LoaderMessage`] messages (loader thread -> ECS).
    pub rx_msg: Receiver<LoaderMessage>,
    /// Join handle for the background loader thread.
    pub handle: std::thread::JoinHandle<()>,
}

/// Spawn the loader thread and register bridge resources.
pub fn setup_loader(world: &mut World, source: impl ResourceSource) {
    let (tx_cmd, rx_cmd) = unbounded::<LoaderCmd>();
    let (tx_msg, rx_msg) = unbounded::<LoaderMessage>();

    let handle = std::thread::spawn(move || loader_thread(source, rx_cmd, tx_msg));

    world.insert_resource(LoaderBridge {
        tx_cmd,
        rx_msg,
        handle,
    });
    world.insert_resource(Messages::<LoaderMessage>::default());
    world.insert_resource(Messages::<LoaderCmd>::default());
}

/// Request shutdown of the loader thread and join it.
///
/// If the bridge resource exists, sends [`LoaderCmd::Shutdown`], waits for the
/// thread to exit, and removes the resource from the world.
pub fn shutdown_loader(world: &mut World) {
    if let Some(bridge) = world.remove_resource::<LoaderBridge>() {
        let _ = bridge.tx_cmd.send(LoaderCmd::Shutdown);
        let _ = bridge.handle.join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_source_shares_bytes() {
        let mut src = MemorySource::default().with("hero", b"{}".to_vec());
        let a = src.load("hero").unwrap();
        let b = src.load("hero").unwrap();
        assert!(Arc::ptr_eq(&a.bytes, &b.bytes));
        assert!(matches!(
            src.load("villain"),
            Err(ActorError::LoadFailure { .. })
        ));
    }

    #[test]
    fn fs_source_maps_ids_to_json_files() {
        let src = FsSource::new("/models");
        assert_eq!(src.path_for("hero"), PathBuf::from("/models/hero.json"));
    }

    #[test]
    fn fs_source_reports_missing_files() {
        let mut src = FsSource::new("/nonexistent-models-dir");
        let err = src.load("hero").unwrap_err();
        assert!(err.to_string().contains("hero"));
    }
}
