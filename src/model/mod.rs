//! Deformation model interface.
//!
//! The stage never reshapes meshes itself. A model exposes an ordered array of
//! named parameters and a set of drawable parts; the stage writes parameter
//! values, asks the model to recompute its geometry and then reads the parts
//! back. Anything that implements [`DeformationModel`] can be driven by the
//! actor pipeline, and a [`ModelProvider`] turns loaded resource bytes into a
//! fresh model instance per actor.
//!
//! Submodules:
//! - [`rig`] – JSON rig format used by the demo and the tests

pub mod rig;

use raylib::prelude::Vector2;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::error::ActorError;
use crate::resources::modelresources::ModelResource;

/// One named, bounded parameter of a deformation model.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelParameter {
    pub id: String,
    pub value: f32,
    pub min: f32,
    pub max: f32,
    pub default: f32,
}

impl ModelParameter {
    /// Create a parameter resting at its default value.
    pub fn new(id: impl Into<String>, min: f32, max: f32, default: f32) -> Self {
        Self {
            id: id.into(),
            value: default,
            min,
            max,
            default,
        }
    }

    /// Clamp `v` into the parameter range. Tolerates an inverted range.
    pub fn clamp(&self, v: f32) -> f32 {
        let lo = self.min.min(self.max);
        let hi = self.min.max(self.max);
        v.max(lo).min(hi)
    }
}

/// How the model wants its drawables ordered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DepthSortMode {
    /// Renderer order index ascending, ties broken far-to-near.
    #[default]
    OrderThenDepth,
    /// Depth only, far-to-near.
    DepthOnly,
    /// Depth only, far-to-near (painter's order).
    BackToFront,
}

/// Mesh geometry of a drawable: a quad of `size` units pivoting around
/// `pivot` (normalized, 0..1 on each axis).
#[derive(Clone, Debug, PartialEq)]
pub struct MeshRef {
    pub key: String,
    pub size: Vector2,
    pub pivot: Vector2,
}

/// Named material parameter applied to a single draw call.
#[derive(Clone, Debug, PartialEq)]
pub struct MaterialOverride {
    pub name: String,
    pub value: f32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MaterialRef {
    /// Texture key resolved by the presentation layer.
    pub texture: String,
    pub overrides: SmallVec<[MaterialOverride; 2]>,
}

impl MaterialRef {
    pub fn new(texture: impl Into<String>) -> Self {
        Self {
            texture: texture.into(),
            overrides: SmallVec::new(),
        }
    }

    pub fn with_override(mut self, name: impl Into<String>, value: f32) -> Self {
        self.overrides.push(MaterialOverride {
            name: name.into(),
            value,
        });
        self
    }

    /// Value of a named override, if this material carries one.
    pub fn get_override(&self, name: &str) -> Option<f32> {
        self.overrides
            .iter()
            .find(|o| o.name == name)
            .map(|o| o.value)
    }
}

/// Position (units), rotation (degrees) and scale of a part.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalTransform {
    pub position: Vector2,
    pub rotation: f32,
    pub scale: Vector2,
}

impl Default for LocalTransform {
    fn default() -> Self {
        Self {
            position: Vector2 { x: 0.0, y: 0.0 },
            rotation: 0.0,
            scale: Vector2 { x: 1.0, y: 1.0 },
        }
    }
}

/// A renderable part as reported by the model after its last recompute.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawablePart {
    pub mesh: Option<MeshRef>,
    pub material: MaterialRef,
    /// Renderer-assigned order index.
    pub order: i32,
    /// Larger is farther away.
    pub depth: f32,
    /// Transform relative to the model root.
    pub transform: LocalTransform,
    pub visible: bool,
}

/// Named preset of parameter targets (an expression or pose).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AppearanceBinding {
    pub name: String,
    pub values: FxHashMap<String, f32>,
}

impl AppearanceBinding {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: FxHashMap::default(),
        }
    }

    pub fn with(mut self, parameter: impl Into<String>, value: f32) -> Self {
        self.values.insert(parameter.into(), value);
        self
    }

    pub fn get(&self, parameter: &str) -> Option<f32> {
        self.values.get(parameter).copied()
    }
}

/// Parametric deformation model driven by the actor pipeline.
///
/// Implementations must be `Send + Sync` so a model instance can live in an
/// ECS component; the pipeline only ever touches one instance from one system
/// at a time.
pub trait DeformationModel: Send + Sync {
    fn parameters(&self) -> &[ModelParameter];
    fn parameters_mut(&mut self) -> &mut [ModelParameter];

    /// Rebuild geometry from the current parameter values. Must run before
    /// [`DeformationModel::drawables`] is read.
    fn recompute_geometry(&mut self);

    fn drawables(&self) -> &[DrawablePart];
    fn depth_sort_mode(&self) -> DepthSortMode;

    /// Model bounds in world units.
    fn canvas_size(&self) -> Vector2;

    /// Bumped whenever drawable membership or order may have changed.
    fn structure_revision(&self) -> u64 {
        0
    }

    /// Appearance presets shipped with the model itself.
    fn appearance_bindings(&self) -> Vec<AppearanceBinding> {
        Vec::new()
    }

    /// Index of a parameter by id.
    fn parameter_index(&self, id: &str) -> Option<usize> {
        self.parameters().iter().position(|p| p.id == id)
    }
}

/// Creates model instances from loaded resources.
pub trait ModelProvider: Send + Sync {
    fn instantiate(&self, resource: &ModelResource) -> Result<Box<dyn DeformationModel>, ActorError>;
}
