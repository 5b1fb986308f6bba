//! Cached, sorted view of a model's drawable parts.
//!
//! The draw order is computed once when the set is rebuilt and reused every
//! frame afterwards. A per-frame [`DrawableSet::refresh`] only copies the
//! latest transforms, materials and visibility into the cached parts. The
//! order is recomputed when the model reports a new structure revision or
//! the part count changes under it.

use std::cmp::Ordering;

use bevy_ecs::prelude::Component;

use crate::error::RenderWarning;
use crate::model::{DeformationModel, DepthSortMode, DrawablePart};

#[derive(Component, Clone, Debug, Default)]
pub struct DrawableSet {
    parts: Vec<DrawablePart>,
    /// Indices into `parts`, in draw order.
    order: Vec<usize>,
    revision: u64,
    rebuilds: u32,
}

impl DrawableSet {
    /// Recompute the model's geometry and derive a fresh draw order.
    pub fn rebuild(&mut self, model: &mut dyn DeformationModel) -> Result<(), RenderWarning> {
        model.recompute_geometry();
        self.parts.clear();
        self.parts.extend_from_slice(model.drawables());
        self.order = sorted_order(&self.parts, model.depth_sort_mode());
        self.revision = model.structure_revision();
        self.rebuilds += 1;
        if self.parts.is_empty() {
            return Err(RenderWarning::EmptyDrawables);
        }
        Ok(())
    }

    /// Pull this frame's geometry without touching the draw order, unless
    /// the model's structure changed.
    pub fn refresh(&mut self, model: &mut dyn DeformationModel) -> Result<(), RenderWarning> {
        if model.structure_revision() != self.revision {
            return self.rebuild(model);
        }
        model.recompute_geometry();
        let latest = model.drawables();
        if latest.len() != self.parts.len() {
            return self.rebuild(model);
        }
        for (cached, fresh) in self.parts.iter_mut().zip(latest.iter()) {
            cached.transform = fresh.transform;
            cached.visible = fresh.visible;
            cached.material.clone_from(&fresh.material);
            cached.mesh.clone_from(&fresh.mesh);
        }
        if self.parts.is_empty() {
            return Err(RenderWarning::EmptyDrawables);
        }
        Ok(())
    }

    /// Parts in draw order, paired with their index in the model.
    pub fn iter_sorted(&self) -> impl Iterator<Item = (usize, &DrawablePart)> + '_ {
        self.order.iter().map(move |&i| (i, &self.parts[i]))
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// How many times the order was derived from scratch.
    pub fn rebuild_count(&self) -> u32 {
        self.rebuilds
    }
}

/// Stable draw order for `parts` under `mode`.
///
/// Depth is far-to-near (larger first); remaining ties fall back to the
/// source index so the result is total.
pub fn sorted_order(parts: &[DrawablePart], mode: DepthSortMode) -> Vec<usize> {
    let mut order: Vec<usize> = (0..parts.len()).collect();
    order.sort_by(|&a, &b| {
        let (pa, pb) = (&parts[a], &parts[b]);
        let primary = match mode {
            DepthSortMode::OrderThenDepth => pa
                .order
                .cmp(&pb.order)
                .then_with(|| pb.depth.total_cmp(&pa.depth)),
            DepthSortMode::DepthOnly | DepthSortMode::BackToFront => {
                pb.depth.total_cmp(&pa.depth)
            }
        };
        match primary {
            Ordering::Equal => a.cmp(&b),
            other => other,
        }
    });
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LocalTransform, MaterialRef, MeshRef, ModelParameter};
    use raylib::prelude::Vector2;

    fn part(order: i32, depth: f32) -> DrawablePart {
        DrawablePart {
            mesh: Some(MeshRef {
                key: format!("m{order}"),
                size: Vector2 { x: 1.0, y: 1.0 },
                pivot: Vector2 { x: 0.5, y: 0.5 },
            }),
            material: MaterialRef::new("tex"),
            order,
            depth,
            transform: LocalTransform::default(),
            visible: true,
        }
    }

    /// Model whose parts move along x with its single parameter.
    struct Fixture {
        params: Vec<ModelParameter>,
        base: Vec<DrawablePart>,
        drawables: Vec<DrawablePart>,
        revision: u64,
        recomputes: u32,
    }

    impl Fixture {
        fn new(base: Vec<DrawablePart>) -> Self {
            Self {
                params: vec![ModelParameter::new("ParamX", -10.0, 10.0, 0.0)],
                base,
                drawables: Vec::new(),
                revision: 0,
                recomputes: 0,
            }
        }
    }

    impl DeformationModel for Fixture {
        fn parameters(&self) -> &[ModelParameter] {
            &self.params
        }
        fn parameters_mut(&mut self) -> &mut [ModelParameter] {
            &mut self.params
        }
        fn recompute_geometry(&mut self) {
            self.recomputes += 1;
            let dx = self.params[0].value;
            self.drawables = self
                .base
                .iter()
                .cloned()
                .map(|mut p| {
                    p.transform.position.x += dx;
                    p
                })
                .collect();
        }
        fn drawables(&self) -> &[DrawablePart] {
            &self.drawables
        }
        fn depth_sort_mode(&self) -> DepthSortMode {
            DepthSortMode::OrderThenDepth
        }
        fn canvas_size(&self) -> Vector2 {
            Vector2 { x: 1.0, y: 1.0 }
        }
        fn structure_revision(&self) -> u64 {
            self.revision
        }
    }

    #[test]
    fn order_then_depth_sorts_far_to_near_within_an_order() {
        let parts = vec![part(2, 0.0), part(1, 0.1), part(1, 0.9), part(0, 0.5)];
        assert_eq!(
            sorted_order(&parts, DepthSortMode::OrderThenDepth),
            vec![3, 2, 1, 0]
        );
    }

    #[test]
    fn depth_modes_ignore_order_index() {
        let parts = vec![part(0, 0.2), part(9, 0.8), part(5, 0.5)];
        assert_eq!(sorted_order(&parts, DepthSortMode::DepthOnly), vec![1, 2, 0]);
        assert_eq!(
            sorted_order(&parts, DepthSortMode::BackToFront),
            vec![1, 2, 0]
        );
    }

    #[test]
    fn full_ties_fall_back_to_source_index() {
        let parts = vec![part(1, 0.5), part(1, 0.5), part(1, 0.5)];
        assert_eq!(
            sorted_order(&parts, DepthSortMode::OrderThenDepth),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn sort_is_deterministic_across_calls() {
        let parts: Vec<_> = (0..32)
            .map(|i| part((i * 7 % 5) as i32, ((i * 13) % 4) as f32 * 0.25))
            .collect();
        let first = sorted_order(&parts, DepthSortMode::OrderThenDepth);
        for _ in 0..10 {
            assert_eq!(sorted_order(&parts, DepthSortMode::OrderThenDepth), first);
        }
    }

    #[test]
    fn rebuild_forces_a_recompute() {
        let mut model = Fixture::new(vec![part(1, 0.0), part(0, 0.0)]);
        let mut set = DrawableSet::default();
        set.rebuild(&mut model).unwrap();
        assert_eq!(model.recomputes, 1);
        assert_eq!(set.order(), &[1, 0]);
    }

    #[test]
    fn refresh_updates_transforms_without_resorting() {
        let mut model = Fixture::new(vec![part(1, 0.0), part(0, 0.0)]);
        let mut set = DrawableSet::default();
        set.rebuild(&mut model).unwrap();

        model.params[0].value = 2.5;
        set.refresh(&mut model).unwrap();
        assert_eq!(set.rebuild_count(), 1);
        let xs: Vec<f32> = set
            .iter_sorted()
            .map(|(_, p)| p.transform.position.x)
            .collect();
        assert_eq!(xs, vec![2.5, 2.5]);
    }

    #[test]
    fn structure_revision_triggers_a_rebuild() {
        let mut model = Fixture::new(vec![part(1, 0.0), part(0, 0.0)]);
        let mut set = DrawableSet::default();
        set.rebuild(&mut model).unwrap();

        model.base[0].order = -1;
        model.revision = 1;
        set.refresh(&mut model).unwrap();
        assert_eq!(set.rebuild_count(), 2);
        assert_eq!(set.order(), &[0, 1]);
    }

    #[test]
    fn empty_model_is_a_warning() {
        let mut model = Fixture::new(Vec::new());
        let mut set = DrawableSet::default();
        assert_eq!(set.rebuild(&mut model), Err(RenderWarning::EmptyDrawables));
        assert!(set.is_empty());
    }
}
