//! JSON rig: a small parametric model format.
//!
//! A rig is a list of textured quads ("parts") placed relative to the model
//! root. Each part carries deformers that move, rotate or scale it linearly
//! in the value of one parameter, or hide it while a parameter sits outside a
//! range. It is enough to drive expressions, head turns and lip movement for
//! flat cut-out characters, and it gives the pipeline a concrete model to
//! load from disk.
//!
//! ```json
//! {
//!   "canvas": [4.0, 6.0],
//!   "depth_sort": "OrderThenDepth",
//!   "parameters": [ { "id": "ParamMouthOpenY", "min": 0, "max": 1, "default": 0 } ],
//!   "parts": [
//!     { "id": "mouth", "texture": "hero/mouth", "mesh": { "size": [0.6, 0.3] },
//!       "order": 10, "position": [0.0, -1.2],
//!       "deformers": [ { "parameter": "ParamMouthOpenY", "scale": [0.0, 1.5] } ] }
//!   ],
//!   "appearances": { "smile": { "ParamMouthOpenY": 0.8 } }
//! }
//! ```

use std::collections::BTreeMap;

use raylib::prelude::Vector2;
use serde::Deserialize;

use crate::error::ActorError;
use crate::model::{
    AppearanceBinding, DeformationModel, DepthSortMode, DrawablePart, LocalTransform,
    MaterialRef, MeshRef, ModelParameter, ModelProvider,
};
use crate::resources::modelresources::ModelResource;

fn one() -> f32 {
    1.0
}
fn unit_scale() -> [f32; 2] {
    [1.0, 1.0]
}
fn center_pivot() -> [f32; 2] {
    [0.5, 0.5]
}
fn yes() -> bool {
    true
}

fn v2(a: [f32; 2]) -> Vector2 {
    Vector2 { x: a[0], y: a[1] }
}

#[derive(Deserialize, Debug, Clone)]
pub struct RigDefinition {
    pub canvas: Option<[f32; 2]>,
    #[serde(default)]
    pub depth_sort: DepthSortMode,
    #[serde(default)]
    pub parameters: Vec<RigParameter>,
    #[serde(default)]
    pub parts: Vec<RigPart>,
    #[serde(default)]
    pub appearances: BTreeMap<String, BTreeMap<String, f32>>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct RigParameter {
    pub id: String,
    pub min: f32,
    #[serde(default = "one")]
    pub max: f32,
    #[serde(default)]
    pub default: f32,
}

#[derive(Deserialize, Debug, Clone)]
pub struct RigMesh {
    pub size: [f32; 2],
    #[serde(default = "center_pivot")]
    pub pivot: [f32; 2],
}

#[derive(Deserialize, Debug, Clone)]
pub struct RigPart {
    pub id: String,
    pub texture: String,
    pub mesh: Option<RigMesh>,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub depth: f32,
    #[serde(default)]
    pub position: [f32; 2],
    #[serde(default)]
    pub rotation: f32,
    #[serde(default = "unit_scale")]
    pub scale: [f32; 2],
    #[serde(default = "yes")]
    pub visible: bool,
    /// Per-draw material overrides, e.g. `{ "opacity": 0.5 }`. Only `opacity`
    /// is applied when drawing; other names are reported and ignored.
    #[serde(default)]
    pub material: BTreeMap<String, f32>,
    #[serde(default)]
    pub deformers: Vec<RigDeformer>,
}

/// Linear response of a part to one parameter.
#[derive(Deserialize, Debug, Clone)]
pub struct RigDeformer {
    pub parameter: String,
    /// Offset in units per unit of parameter value.
    #[serde(default)]
    pub position: [f32; 2],
    /// Degrees per unit of parameter value.
    #[serde(default)]
    pub rotation: f32,
    /// Added scale per unit of parameter value.
    #[serde(default)]
    pub scale: [f32; 2],
    /// The part is hidden while the parameter is outside `[lo, hi]`.
    pub visible_range: Option<[f32; 2]>,
}

impl RigDefinition {
    pub fn from_slice(id: &str, bytes: &[u8]) -> Result<Self, ActorError> {
        serde_json::from_slice(bytes).map_err(|e| ActorError::load_failure(id, e.to_string()))
    }
}

/// A live instance of a [`RigDefinition`].
pub struct RigModel {
    parameters: Vec<ModelParameter>,
    parts: Vec<RigPart>,
    /// Parameter index per deformer, resolved once at build time.
    deformer_params: Vec<Vec<usize>>,
    drawables: Vec<DrawablePart>,
    canvas: Vector2,
    depth_sort: DepthSortMode,
    appearances: Vec<AppearanceBinding>,
}

impl RigModel {
    /// Validate a definition and build a model resting at default values.
    pub fn build(id: &str, def: RigDefinition) -> Result<Self, ActorError> {
        let Some(canvas) = def.canvas else {
            return Err(ActorError::configuration(id, "rig has no canvas size"));
        };
        if canvas[0] <= 0.0 || canvas[1] <= 0.0 {
            return Err(ActorError::configuration(
                id,
                format!("canvas {}x{} is not positive", canvas[0], canvas[1]),
            ));
        }

        for p in def.parameters.iter() {
            if p.min > p.max {
                return Err(ActorError::configuration(
                    id,
                    format!("parameter '{}' has range [{}, {}]", p.id, p.min, p.max),
                ));
            }
            if !(p.min..=p.max).contains(&p.default) {
                return Err(ActorError::configuration(
                    id,
                    format!(
                        "parameter '{}' default {} is outside [{}, {}]",
                        p.id, p.default, p.min, p.max
                    ),
                ));
            }
        }

        let parameters: Vec<ModelParameter> = def
            .parameters
            .iter()
            .map(|p| ModelParameter::new(p.id.clone(), p.min, p.max, p.default))
            .collect();

        let mut deformer_params = Vec::with_capacity(def.parts.len());
        for part in def.parts.iter() {
            let mut indices = Vec::with_capacity(part.deformers.len());
            for d in part.deformers.iter() {
                let idx = parameters
                    .iter()
                    .position(|p| p.id == d.parameter)
                    .ok_or_else(|| {
                        ActorError::configuration(
                            id,
                            format!(
                                "part '{}' deforms unknown parameter '{}'",
                                part.id, d.parameter
                            ),
                        )
                    })?;
                indices.push(idx);
            }
            deformer_params.push(indices);
        }

        let appearances = def
            .appearances
            .iter()
            .map(|(name, values)| {
                let mut binding = AppearanceBinding::new(name.clone());
                for (param, value) in values.iter() {
                    binding = binding.with(param.clone(), *value);
                }
                binding
            })
            .collect();

        let mut model = Self {
            parameters,
            parts: def.parts,
            deformer_params,
            drawables: Vec::new(),
            canvas: v2(canvas),
            depth_sort: def.depth_sort,
            appearances,
        };
        model.recompute_geometry();
        Ok(model)
    }

    fn evaluate_part(&self, index: usize) -> DrawablePart {
        let part = &self.parts[index];
        let mut position = v2(part.position);
        let mut rotation = part.rotation;
        let mut scale = v2(part.scale);
        let mut visible = part.visible;

        for (d, &pi) in part.deformers.iter().zip(self.deformer_params[index].iter()) {
            let value = self.parameters[pi].value;
            position.x += d.position[0] * value;
            position.y += d.position[1] * value;
            rotation += d.rotation * value;
            scale.x += d.scale[0] * value;
            scale.y += d.scale[1] * value;
            if let Some([lo, hi]) = d.visible_range {
                if value < lo || value > hi {
                    visible = false;
                }
            }
        }

        let mut material = MaterialRef::new(part.texture.clone());
        for (name, value) in part.material.iter() {
            material = material.with_override(name.clone(), *value);
        }

        DrawablePart {
            mesh: part.mesh.as_ref().map(|m| MeshRef {
                key: part.id.clone(),
                size: v2(m.size),
                pivot: v2(m.pivot),
            }),
            material,
            order: part.order,
            depth: part.depth,
            transform: LocalTransform {
                position,
                rotation,
                scale,
            },
            visible,
        }
    }
}

impl DeformationModel for RigModel {
    fn parameters(&self) -> &[ModelParameter] {
        &self.parameters
    }

    fn parameters_mut(&mut self) -> &mut [ModelParameter] {
        &mut self.parameters
    }

    fn recompute_geometry(&mut self) {
        let drawables = (0..self.parts.len())
            .map(|i| self.evaluate_part(i))
            .collect();
        self.drawables = drawables;
    }

    fn drawables(&self) -> &[DrawablePart] {
        &self.drawables
    }

    fn depth_sort_mode(&self) -> DepthSortMode {
        self.depth_sort
    }

    fn canvas_size(&self) -> Vector2 {
        self.canvas
    }

    fn appearance_bindings(&self) -> Vec<AppearanceBinding> {
        self.appearances.clone()
    }
}

/// [`ModelProvider`] for JSON rigs.
#[derive(Default)]
pub struct RigProvider;

impl ModelProvider for RigProvider {
    fn instantiate(
        &self,
        resource: &ModelResource,
    ) -> Result<Box<dyn DeformationModel>, ActorError> {
        let def = RigDefinition::from_slice(&resource.id, &resource.bytes)?;
        let model = RigModel::build(&resource.id, def)?;
        Ok(Box::new(model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const RIG: &str = r#"{
        "canvas": [4.0, 6.0],
        "parameters": [
            { "id": "ParamAngleX", "min": -30, "max": 30, "default": 0 },
            { "id": "ParamMouthOpenY", "min": 0, "max": 1, "default": 0 }
        ],
        "parts": [
            { "id": "body", "texture": "hero/body", "mesh": { "size": [4.0, 6.0] }, "order": 0 },
            { "id": "head", "texture": "hero/head", "mesh": { "size": [2.0, 2.0] }, "order": 5,
              "position": [0.0, -2.0],
              "deformers": [ { "parameter": "ParamAngleX", "position": [0.01, 0.0], "rotation": 0.5 } ] },
            { "id": "mouth_open", "texture": "hero/mouth", "mesh": { "size": [0.5, 0.25] }, "order": 6,
              "material": { "opacity": 0.75 },
              "deformers": [ { "parameter": "ParamMouthOpenY", "visible_range": [0.1, 1.0] } ] }
        ],
        "appearances": { "smile": { "ParamMouthOpenY": 0.8 } }
    }"#;

    fn build() -> RigModel {
        let def = RigDefinition::from_slice("hero", RIG.as_bytes()).unwrap();
        RigModel::build("hero", def).unwrap()
    }

    #[test]
    fn builds_at_default_values() {
        let rig = build();
        assert_eq!(rig.parameters().len(), 2);
        assert_eq!(rig.drawables().len(), 3);
        assert_eq!(rig.canvas_size().x, 4.0);
        assert_eq!(rig.canvas_size().y, 6.0);
        assert!(!rig.drawables()[2].visible, "mouth hidden while closed");
    }

    #[test]
    fn deformers_follow_parameter_values() {
        let mut rig = build();
        let idx = rig.parameter_index("ParamAngleX").unwrap();
        rig.parameters_mut()[idx].value = 20.0;
        rig.recompute_geometry();
        let head = &rig.drawables()[1];
        assert!((head.transform.position.x - 0.2).abs() < 1e-6);
        assert!((head.transform.rotation - 10.0).abs() < 1e-6);

        let mouth = rig.parameter_index("ParamMouthOpenY").unwrap();
        rig.parameters_mut()[mouth].value = 0.5;
        rig.recompute_geometry();
        assert!(rig.drawables()[2].visible);
    }

    #[test]
    fn material_overrides_are_carried_per_part() {
        let rig = build();
        assert_eq!(rig.drawables()[2].material.get_override("opacity"), Some(0.75));
        assert_eq!(rig.drawables()[0].material.get_override("opacity"), None);
    }

    #[test]
    fn appearances_come_from_the_rig() {
        let rig = build();
        let bindings = rig.appearance_bindings();
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].name, "smile");
        assert_eq!(bindings[0].get("ParamMouthOpenY"), Some(0.8));
    }

    #[test]
    fn missing_canvas_is_a_configuration_error() {
        let def = RigDefinition::from_slice("bad", br#"{ "parts": [] }"#).unwrap();
        let err = RigModel::build("bad", def).err().unwrap();
        assert!(matches!(err, ActorError::Configuration { .. }));
    }

    #[test]
    fn unknown_deformer_parameter_is_a_configuration_error() {
        let json = br#"{ "canvas": [1, 1], "parts": [
            { "id": "a", "texture": "t", "deformers": [ { "parameter": "Nope" } ] } ] }"#;
        let def = RigDefinition::from_slice("bad", json).unwrap();
        assert!(matches!(
            RigModel::build("bad", def),
            Err(ActorError::Configuration { .. })
        ));
    }

    #[test]
    fn malformed_json_is_a_load_failure() {
        let resource = ModelResource {
            id: "broken".into(),
            bytes: Arc::from(&b"{ not json"[..]),
        };
        let err = RigProvider.instantiate(&resource).err().unwrap();
        assert!(matches!(err, ActorError::LoadFailure { .. }));
    }

    #[test]
    fn inverted_parameter_range_is_a_configuration_error() {
        // max defaults to 1
        let json = br#"{ "canvas": [1, 1],
            "parameters": [ { "id": "ParamBrow", "min": 5, "default": 5 } ] }"#;
        let def = RigDefinition::from_slice("bad", json).unwrap();
        let err = RigModel::build("bad", def).err().unwrap();
        assert!(matches!(err, ActorError::Configuration { .. }));
        assert!(err.to_string().contains("ParamBrow"));
    }

    #[test]
    fn default_outside_range_is_a_configuration_error() {
        let json = br#"{ "canvas": [1, 1],
            "parameters": [ { "id": "ParamBrow", "min": -1, "max": 1, "default": 3 } ] }"#;
        let def = RigDefinition::from_slice("bad", json).unwrap();
        assert!(matches!(
            RigModel::build("bad", def),
            Err(ActorError::Configuration { .. })
        ));
    }
}
