//! Part textures referenced by model materials.
//!
//! Loaded lazily from `<models_path>/<key>.png` the first time a draw
//! references them. Keys that fail to load are remembered so the warning is
//! logged once.

use std::path::PathBuf;

use log::{debug, warn};
use raylib::prelude::{RaylibHandle, RaylibThread, Texture2D};
use rustc_hash::{FxHashMap, FxHashSet};

/// NonSend: textures live on the GPU and must stay on the main thread.
pub struct TextureStore {
    root: PathBuf,
    map: FxHashMap<String, Texture2D>,
    missing: FxHashSet<String>,
}

impl TextureStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            map: FxHashMap::default(),
            missing: FxHashSet::default(),
        }
    }

    /// Load `key` unless it is already loaded or known to be missing.
    pub fn ensure(&mut self, rl: &mut RaylibHandle, th: &RaylibThread, key: &str) {
        if self.map.contains_key(key) || self.missing.contains(key) {
            return;
        }
        let path = self.root.join(format!("{}.png", key));
        match rl.load_texture(th, &path.to_string_lossy()) {
            Ok(tex) => {
                debug!("texture '{}' loaded from {}", key, path.display());
                self.map.insert(key.to_string(), tex);
            }
            Err(e) => {
                warn!("texture '{}' unavailable: {}", key, e);
                self.missing.insert(key.to_string());
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Texture2D> {
        self.map.get(key)
    }
}
