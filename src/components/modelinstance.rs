//! Per-actor model instance and its placement.

use bevy_ecs::prelude::Component;
use raylib::prelude::Vector2;

use crate::model::DeformationModel;

/// The actor's own deformation model. Present only while `Ready`.
#[derive(Component)]
pub struct ModelInstance(pub Box<dyn DeformationModel>);

impl ModelInstance {
    pub fn model(&self) -> &dyn DeformationModel {
        self.0.as_ref()
    }

    pub fn model_mut(&mut self) -> &mut dyn DeformationModel {
        self.0.as_mut()
    }
}

/// Where the model instance sits in model space.
///
/// Every actor gets its own placement slot so instances never overlap.
/// `origin` is in world units; rotation and scale come from the actor's
/// [`Rotation`](super::rotation::Rotation) and [`Scale`](super::scale::Scale).
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct ModelRoot {
    pub slot: usize,
    pub origin: Vector2,
}
