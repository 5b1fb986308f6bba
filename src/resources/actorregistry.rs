//! Actor id lookup and model placement slots.
//!
//! Each model instance is parked in its own slot of model space so that no
//! two actors' geometry ever overlaps. The [`PlacementAllocator`] hands out
//! disjoint slots and takes them back when an actor is disposed; the lowest
//! free slot is always reused first.

use std::collections::BTreeSet;

use bevy_ecs::prelude::*;
use raylib::prelude::Vector2;
use rustc_hash::FxHashMap;

/// Hands out disjoint placement slots.
#[derive(Debug, Clone)]
pub struct PlacementAllocator {
    spacing: f32,
    next: usize,
    free: BTreeSet<usize>,
}

impl PlacementAllocator {
    pub fn new(spacing: f32) -> Self {
        Self {
            spacing,
            next: 0,
            free: BTreeSet::new(),
        }
    }

    /// Claim a slot. Returns its index and world-space origin.
    pub fn allocate(&mut self) -> (usize, Vector2) {
        let index = match self.free.pop_first() {
            Some(i) => i,
            None => {
                self.next += 1;
                self.next - 1
            }
        };
        (index, self.origin(index))
    }

    /// Give a slot back. Freeing a slot twice is harmless.
    pub fn free(&mut self, index: usize) {
        if index < self.next {
            self.free.insert(index);
        }
    }

    /// Slot origins start one spacing away from the scene origin.
    pub fn origin(&self, index: usize) -> Vector2 {
        Vector2 {
            x: (index + 1) as f32 * self.spacing,
            y: 0.0,
        }
    }

    pub fn in_use(&self) -> usize {
        self.next - self.free.len()
    }
}

impl Default for PlacementAllocator {
    fn default() -> Self {
        Self::new(100.0)
    }
}

/// Actor id -> entity, plus the shared placement allocator.
///
/// Removed actors leave their model id behind so holders can still release
/// what they held through them.
#[derive(Resource, Debug, Default)]
pub struct ActorRegistry {
    actors: FxHashMap<String, Entity>,
    retired: FxHashMap<String, String>,
    pub slots: PlacementAllocator,
}

impl ActorRegistry {
    pub fn new(slot_spacing: f32) -> Self {
        Self {
            actors: FxHashMap::default(),
            retired: FxHashMap::default(),
            slots: PlacementAllocator::new(slot_spacing),
        }
    }

    pub fn get(&self, id: &str) -> Option<Entity> {
        self.actors.get(id).copied()
    }

    pub fn insert(&mut self, id: impl Into<String>, entity: Entity) {
        let id = id.into();
        self.retired.remove(&id);
        self.actors.insert(id, entity);
    }

    /// Forget `id`, remembering the model it was built from.
    pub fn remove(&mut self, id: &str, model: Option<&str>) -> Option<Entity> {
        if let Some(model) = model {
            self.retired.insert(id.to_string(), model.to_string());
        }
        self.actors.remove(id)
    }

    /// Model id of an actor that has been removed.
    pub fn retired_model(&self, id: &str) -> Option<&str> {
        self.retired.get(id).map(String::as_str)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.actors.keys().map(String::as_str)
    }

    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.actors.values().copied()
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removed_actors_remember_their_model_until_reused() {
        let mut registry = ActorRegistry::new(100.0);
        let entity = World::new().spawn_empty().id();
        registry.insert("hero", entity);
        assert_eq!(registry.remove("hero", Some("rig")), Some(entity));
        assert_eq!(registry.get("hero"), None);
        assert_eq!(registry.retired_model("hero"), Some("rig"));

        registry.insert("hero", entity);
        assert_eq!(registry.retired_model("hero"), None);
    }

    #[test]
    fn slots_are_disjoint_until_freed() {
        let mut alloc = PlacementAllocator::new(100.0);
        let (a, oa) = alloc.allocate();
        let (b, ob) = alloc.allocate();
        assert_ne!(a, b);
        assert_ne!(oa, ob);
        assert_eq!(oa.x, 100.0);
        assert_eq!(ob.x, 200.0);
        assert_eq!(alloc.in_use(), 2);
    }

    #[test]
    fn lowest_freed_slot_is_reused_first() {
        let mut alloc = PlacementAllocator::new(10.0);
        let slots: Vec<usize> = (0..4).map(|_| alloc.allocate().0).collect();
        alloc.free(slots[2]);
        alloc.free(slots[1]);
        alloc.free(slots[1]);
        assert_eq!(alloc.allocate().0, 1);
        assert_eq!(alloc.allocate().0, 2);
        assert_eq!(alloc.allocate().0, 4);
    }

    #[test]
    fn freeing_an_unknown_slot_is_ignored() {
        let mut alloc = PlacementAllocator::new(10.0);
        alloc.free(7);
        assert_eq!(alloc.allocate().0, 0);
        assert_eq!(alloc.in_use(), 1);
    }
}
