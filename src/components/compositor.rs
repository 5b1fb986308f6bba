//! Per-actor offscreen compositor.
//!
//! A [`Compositor`] owns one [`RenderSurface`] sized to the model's canvas in
//! pixels and turns the actor's sorted drawables into a [`FrameBatch`]: one
//! ordered list of draw commands addressed to that surface only. The batch is
//! pure data; the raylib presentation layer
//! ([`crate::systems::render`]) replays it into a render texture.
//!
//! Geometry pipeline for a drawable:
//! 1. model space: `root.origin + R(actor rotation) * (actor scale * local)`
//! 2. the [`OrthoProjection`] centred on the root maps that into the surface,
//!    undoing actor rotation and scale, so the surface always holds the
//!    upright, unscaled model
//! 3. the sprite pass applies actor rotation and scale when blending the
//!    surface into the scene

use bevy_ecs::prelude::Component;
use raylib::prelude::{Color, Vector2};

use crate::error::RenderWarning;
use crate::model::{MaterialRef, MeshRef};

use super::drawableset::DrawableSet;

/// How a finished surface is consumed. Chosen once per compositor.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CompositeOutput {
    /// Blended into the scene as a sprite at the actor's position.
    #[default]
    Sprite,
    /// Published as a named texture for other renderers to sample.
    Texture { name: String },
}

/// Bookkeeping for the actor's offscreen buffer.
///
/// The pixels themselves live on the GPU side; this tracks the size the
/// buffer must have and how often it was (re)allocated.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderSurface {
    pub width: u32,
    pub height: u32,
    /// Bumped on every allocation so the GPU mirror knows to recreate.
    pub generation: u64,
    pub allocations: u32,
    pub releases: u32,
    pub live: bool,
}

impl RenderSurface {
    /// Make sure a buffer of exactly `width`x`height` exists. Returns whether
    /// a new buffer had to be allocated.
    pub fn ensure(&mut self, width: u32, height: u32) -> bool {
        if self.live && self.width == width && self.height == height {
            return false;
        }
        self.release();
        self.width = width;
        self.height = height;
        self.generation += 1;
        self.allocations += 1;
        self.live = true;
        true
    }

    pub fn release(&mut self) {
        if self.live {
            self.live = false;
            self.releases += 1;
        }
    }
}

/// Orthographic projection from model-space pixels onto the surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrthoProjection {
    /// Model root in model-space pixels.
    pub center: Vector2,
    /// Half the visible area in model-space pixels.
    pub half_extents: Vector2,
    /// Rotation applied before projecting, degrees. Inverse of the actor's.
    pub compensation: f32,
    pub near: f32,
    pub far: f32,
    /// Surface size the projection maps onto.
    pub viewport: Vector2,
}

impl OrthoProjection {
    pub fn new(center: Vector2, dims: (u32, u32), scale: Vector2, rotation: f32) -> Self {
        let viewport = Vector2 {
            x: dims.0 as f32,
            y: dims.1 as f32,
        };
        Self {
            center,
            half_extents: Vector2 {
                x: viewport.x * 0.5 * scale.x,
                y: viewport.y * 0.5 * scale.y,
            },
            compensation: -rotation,
            near: -f32::MAX / 2.0,
            far: f32::MAX / 2.0,
            viewport,
        }
    }

    /// Map a model-space pixel position to surface pixels (origin top-left).
    pub fn project(&self, p: Vector2) -> Vector2 {
        let rel = rotate(
            Vector2 {
                x: p.x - self.center.x,
                y: p.y - self.center.y,
            },
            self.compensation,
        );
        Vector2 {
            x: rel.x / self.half_extents.x * (self.viewport.x * 0.5) + self.viewport.x * 0.5,
            y: rel.y / self.half_extents.y * (self.viewport.y * 0.5) + self.viewport.y * 0.5,
        }
    }
}

/// Placement of the model root for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RootPlacement {
    /// World units.
    pub origin: Vector2,
    /// Degrees.
    pub rotation: f32,
    pub scale: Vector2,
}

/// One draw into the surface.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawCommand {
    /// Index of the drawable in the model.
    pub index: usize,
    pub mesh: MeshRef,
    pub material: MaterialRef,
    /// Surface pixels of the mesh pivot.
    pub position: Vector2,
    /// Pixels.
    pub size: Vector2,
    /// Pixels from the top-left corner of the quad.
    pub origin: Vector2,
    /// Degrees.
    pub rotation: f32,
}

/// Everything needed to draw one actor's surface for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameBatch {
    pub width: u32,
    pub height: u32,
    pub clear: Color,
    pub projection: OrthoProjection,
    pub draws: Vec<DrawCommand>,
    /// Per-drawable problems found while building the batch.
    pub skipped: Vec<RenderWarning>,
}

#[derive(Component, Clone, Debug)]
pub struct Compositor {
    output: CompositeOutput,
    surface: RenderSurface,
    projection: Option<(ProjectionKey, OrthoProjection)>,
    projection_recomputes: u32,
    batch: Option<FrameBatch>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct ProjectionKey {
    center: Vector2,
    dims: (u32, u32),
    scale: Vector2,
    rotation: f32,
}

impl Compositor {
    pub fn new(output: CompositeOutput) -> Self {
        Self {
            output,
            surface: RenderSurface::default(),
            projection: None,
            projection_recomputes: 0,
            batch: None,
        }
    }

    pub fn output(&self) -> &CompositeOutput {
        &self.output
    }

    pub fn surface(&self) -> &RenderSurface {
        &self.surface
    }

    /// Batch built by the last successful [`Compositor::render_frame`].
    pub fn batch(&self) -> Option<&FrameBatch> {
        self.batch.as_ref()
    }

    pub fn projection_recomputes(&self) -> u32 {
        self.projection_recomputes
    }

    /// Drop the cached projection, e.g. after the scene aspect changed.
    pub fn invalidate(&mut self) {
        self.projection = None;
    }

    /// Free the surface and forget the last batch.
    pub fn release(&mut self) {
        self.surface.release();
        self.projection = None;
        self.batch = None;
    }

    /// Build this frame's batch.
    ///
    /// On a warning the previous batch is discarded so nothing stale is
    /// presented for this actor.
    pub fn render_frame(
        &mut self,
        drawables: &DrawableSet,
        canvas: Vector2,
        pixels_per_unit: f32,
        root: RootPlacement,
    ) -> Result<&FrameBatch, RenderWarning> {
        self.batch = None;
        let (width, height) = surface_dims(canvas, pixels_per_unit);
        if width == 0 || height == 0 {
            return Err(RenderWarning::DegenerateSurface { width, height });
        }
        if drawables.is_empty() {
            return Err(RenderWarning::EmptyDrawables);
        }
        if self.surface.ensure(width, height) {
            log::debug!("compositor surface allocated {}x{}", width, height);
        }

        // Scale cancels out through the projection; a degenerate factor would
        // turn it into 0/0, so the surface is drawn unscaled instead.
        let scale = Vector2 {
            x: usable_scale(root.scale.x),
            y: usable_scale(root.scale.y),
        };
        let center = Vector2 {
            x: root.origin.x * pixels_per_unit,
            y: root.origin.y * pixels_per_unit,
        };
        let projection = self.projection_for(ProjectionKey {
            center,
            dims: (width, height),
            scale,
            rotation: root.rotation,
        });

        let mut draws = Vec::with_capacity(drawables.len());
        let mut skipped = Vec::new();
        for (index, part) in drawables.iter_sorted() {
            if !part.visible {
                continue;
            }
            let Some(mesh) = part.mesh.as_ref() else {
                skipped.push(RenderWarning::MissingMesh { index });
                continue;
            };
            let local = part.transform;
            // Model space, in pixels.
            let scaled = Vector2 {
                x: local.position.x * scale.x * pixels_per_unit,
                y: local.position.y * scale.y * pixels_per_unit,
            };
            let turned = rotate(scaled, root.rotation);
            let world = Vector2 {
                x: center.x + turned.x,
                y: center.y + turned.y,
            };
            let size = Vector2 {
                x: mesh.size.x * local.scale.x * pixels_per_unit,
                y: mesh.size.y * local.scale.y * pixels_per_unit,
            };
            draws.push(DrawCommand {
                index,
                mesh: mesh.clone(),
                material: part.material.clone(),
                position: projection.project(world),
                size,
                origin: Vector2 {
                    x: size.x * mesh.pivot.x,
                    y: size.y * mesh.pivot.y,
                },
                rotation: local.rotation,
            });
        }

        Ok(&*self.batch.insert(FrameBatch {
            width,
            height,
            clear: Color::BLANK,
            projection,
            draws,
            skipped,
        }))
    }

    fn projection_for(&mut self, key: ProjectionKey) -> OrthoProjection {
        if let Some((cached_key, projection)) = self.projection {
            if cached_key == key {
                return projection;
            }
        }
        let projection = OrthoProjection::new(key.center, key.dims, key.scale, key.rotation);
        self.projection = Some((key, projection));
        self.projection_recomputes += 1;
        projection
    }
}

/// Pixel size of a surface holding `canvas` units.
pub fn surface_dims(canvas: Vector2, pixels_per_unit: f32) -> (u32, u32) {
    let w = (canvas.x * pixels_per_unit).round().max(0.0) as u32;
    let h = (canvas.y * pixels_per_unit).round().max(0.0) as u32;
    (w, h)
}

fn usable_scale(s: f32) -> f32 {
    if s == 0.0 || !s.is_finite() { 1.0 } else { s }
}

fn rotate(v: Vector2, degrees: f32) -> Vector2 {
    if degrees == 0.0 {
        return v;
    }
    let (s, c) = degrees.to_radians().sin_cos();
    Vector2 {
        x: v.x * c - v.y * s,
        y: v.x * s + v.y * c,
    }
}
