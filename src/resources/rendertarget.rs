//! GPU mirrors of actor render surfaces.
//!
//! [`RenderSurface`](crate::components::compositor::RenderSurface) only tracks
//! the size and generation of an actor's offscreen buffer. [`SurfaceStore`]
//! owns the matching raylib `RenderTexture2D`s and recreates one only when
//! its surface generation changes.
//!
//! # Note
//! This is a NonSend resource because `RenderTexture2D` contains GPU resources
//! that must be accessed from the main thread.

use bevy_ecs::prelude::Entity;
use raylib::ffi::{self, TextureFilter};
use raylib::prelude::*;
use rustc_hash::FxHashMap;

use crate::components::compositor::RenderSurface;

/// Texture filtering mode for compositing surfaces into the scene.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub enum RenderFilter {
    /// Point/nearest-neighbor filtering.
    Nearest,
    /// Bilinear filtering. Smooth when actors are scaled or rotated.
    #[default]
    Bilinear,
}

/// One actor's render texture.
pub struct RenderTarget {
    pub texture: RenderTexture2D,
    pub width: u32,
    pub height: u32,
    /// Surface generation this texture was created for.
    pub generation: u64,
}

impl RenderTarget {
    fn new(
        rl: &mut RaylibHandle,
        th: &RaylibThread,
        surface: &RenderSurface,
        filter: RenderFilter,
    ) -> Result<Self, String> {
        let texture = rl
            .load_render_texture(th, surface.width, surface.height)
            .map_err(|e| format!("Failed to create render texture: {}", e))?;
        let target = Self {
            texture,
            width: surface.width,
            height: surface.height,
            generation: surface.generation,
        };
        target.apply_filter(filter);
        Ok(target)
    }

    fn apply_filter(&self, filter: RenderFilter) {
        let filter_value = match filter {
            RenderFilter::Nearest => TextureFilter::TEXTURE_FILTER_POINT as i32,
            RenderFilter::Bilinear => TextureFilter::TEXTURE_FILTER_BILINEAR as i32,
        };
        unsafe {
            ffi::SetTextureFilter(self.texture.texture, filter_value);
        }
    }

    /// Source rectangle for drawing this texture.
    ///
    /// Negative height flips the Y axis, compensating for OpenGL's inverted
    /// texture coordinates.
    pub fn source_rect(&self) -> Rectangle {
        Rectangle {
            x: 0.0,
            y: 0.0,
            width: self.width as f32,
            height: -(self.height as f32),
        }
    }
}

/// Render textures of every compositing actor, plus the names published by
/// texture outputs.
#[derive(Default)]
pub struct SurfaceStore {
    targets: FxHashMap<Entity, RenderTarget>,
    published: FxHashMap<String, Entity>,
    pub filter: RenderFilter,
}

impl SurfaceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the texture for `entity` match `surface`. Returns whether it was
    /// (re)created.
    pub fn sync(
        &mut self,
        rl: &mut RaylibHandle,
        th: &RaylibThread,
        entity: Entity,
        surface: &RenderSurface,
    ) -> Result<bool, String> {
        if !surface.live {
            self.targets.remove(&entity);
            return Ok(false);
        }
        if self
            .targets
            .get(&entity)
            .is_some_and(|t| t.generation == surface.generation)
        {
            return Ok(false);
        }
        // Drop the old texture before allocating its replacement.
        self.targets.remove(&entity);
        let target = RenderTarget::new(rl, th, surface, self.filter)?;
        self.targets.insert(entity, target);
        Ok(true)
    }

    pub fn get(&self, entity: Entity) -> Option<&RenderTarget> {
        self.targets.get(&entity)
    }

    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut RenderTarget> {
        self.targets.get_mut(&entity)
    }

    /// Publish `entity`'s texture under `name`.
    pub fn publish(&mut self, name: &str, entity: Entity) {
        if self.published.get(name) != Some(&entity) {
            self.published.insert(name.to_string(), entity);
        }
    }

    /// Texture published under `name`, for renderers outside the stage.
    pub fn published(&self, name: &str) -> Option<&RenderTarget> {
        self.published.get(name).and_then(|e| self.targets.get(e))
    }

    /// Drop every texture whose entity is not in `alive`.
    pub fn retain(&mut self, alive: impl Fn(Entity) -> bool) {
        self.targets.retain(|e, _| alive(*e));
        self.published.retain(|_, e| alive(*e));
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
