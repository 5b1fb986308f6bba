//! Loaded model resources and who is holding them.
//!
//! A model resource stays resident while at least one holder needs it.
//! Holders are actors (held automatically from initialization until
//! disposal) or external owners such as a scene that wants certain
//! appearances kept around. Each holder tracks the set of appearance names
//! it needs; dropping the last one drops the holder, and dropping the last
//! holder makes the resource eligible for eviction.

use std::collections::BTreeSet;
use std::sync::Arc;

use bevy_ecs::prelude::*;
use rustc_hash::FxHashMap;

/// Raw bytes of a model, as produced by the loader thread.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelResource {
    pub id: String,
    pub bytes: Arc<[u8]>,
}

impl ModelResource {
    pub fn new(id: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            id: id.into(),
            bytes: bytes.into(),
        }
    }
}

/// Identity of something keeping a model resident.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum HolderId {
    Actor(Entity),
    External(String),
}

/// Holder identity -> appearance names that holder needs.
#[derive(Clone, Debug, Default)]
pub struct HolderSet {
    holders: FxHashMap<HolderId, BTreeSet<String>>,
}

impl HolderSet {
    /// Register `holder`, optionally needing `appearance`.
    pub fn hold(&mut self, holder: HolderId, appearance: Option<&str>) {
        let needs = self.holders.entry(holder).or_default();
        if let Some(a) = appearance {
            needs.insert(a.to_string());
        }
    }

    /// Drop one appearance from `holder`, or the holder entirely when
    /// `appearance` is `None`. Removing a holder's last appearance removes
    /// the holder. Unknown holders are ignored.
    ///
    /// Returns whether the set is now empty.
    pub fn release(&mut self, holder: &HolderId, appearance: Option<&str>) -> bool {
        match appearance {
            None => {
                self.holders.remove(holder);
            }
            Some(a) => {
                if let Some(needs) = self.holders.get_mut(holder) {
                    needs.remove(a);
                    if needs.is_empty() {
                        self.holders.remove(holder);
                    }
                }
            }
        }
        self.holders.is_empty()
    }

    pub fn len(&self) -> usize {
        self.holders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holders.is_empty()
    }

    pub fn contains(&self, holder: &HolderId) -> bool {
        self.holders.contains_key(holder)
    }

    /// Appearances needed by any holder.
    pub fn appearances(&self) -> BTreeSet<&str> {
        self.holders
            .values()
            .flat_map(|s| s.iter().map(String::as_str))
            .collect()
    }
}

#[derive(Clone, Debug, Default)]
pub struct ModelEntry {
    pub holders: HolderSet,
    pub resident: Option<ModelResource>,
}

/// Every model resource the stage knows about, by model id.
#[derive(Resource, Debug, Default)]
pub struct ModelResources {
    entries: FxHashMap<String, ModelEntry>,
}

impl ModelResources {
    pub fn hold(&mut self, model_id: &str, holder: HolderId, appearance: Option<&str>) {
        self.entries
            .entry(model_id.to_string())
            .or_default()
            .holders
            .hold(holder, appearance);
    }

    /// Release a hold. Returns `true` when the model just became evictable.
    pub fn release(&mut self, model_id: &str, holder: &HolderId, appearance: Option<&str>) -> bool {
        match self.entries.get_mut(model_id) {
            Some(entry) if !entry.holders.is_empty() => entry.holders.release(holder, appearance),
            _ => false,
        }
    }

    pub fn holder_count(&self, model_id: &str) -> usize {
        self.entries
            .get(model_id)
            .map(|e| e.holders.len())
            .unwrap_or(0)
    }

    pub fn holders(&self, model_id: &str) -> Option<&HolderSet> {
        self.entries.get(model_id).map(|e| &e.holders)
    }

    /// Nobody holds the model.
    pub fn is_evictable(&self, model_id: &str) -> bool {
        self.holder_count(model_id) == 0
    }

    pub fn insert_resident(&mut self, resource: ModelResource) {
        self.entries
            .entry(resource.id.clone())
            .or_default()
            .resident = Some(resource);
    }

    /// The model's bytes are loaded and usable.
    pub fn is_valid(&self, model_id: &str) -> bool {
        self.resident(model_id).is_some()
    }

    pub fn resident(&self, model_id: &str) -> Option<&ModelResource> {
        self.entries.get(model_id).and_then(|e| e.resident.as_ref())
    }

    /// Drop the resident bytes of an evictable model. Returns whether
    /// anything was evicted.
    pub fn evict(&mut self, model_id: &str) -> bool {
        if !self.is_evictable(model_id) {
            return false;
        }
        self.entries
            .remove(model_id)
            .is_some_and(|e| e.resident.is_some())
    }

    /// Forget every resource and every hold.
    pub fn unload_all(&mut self) -> usize {
        let n = self.entries.len();
        self.entries.clear();
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ext(name: &str) -> HolderId {
        HolderId::External(name.to_string())
    }

    #[test]
    fn retained_while_any_holder_remains() {
        let mut res = ModelResources::default();
        res.insert_resident(ModelResource::new("hero", b"{}".to_vec()));
        res.hold("hero", ext("scene_a"), Some("smile"));
        res.hold("hero", ext("scene_b"), Some("smile"));
        assert_eq!(res.holder_count("hero"), 2);

        assert!(!res.release("hero", &ext("scene_a"), Some("smile")));
        assert!(res.is_valid("hero"));
        assert!(res.release("hero", &ext("scene_b"), Some("smile")));
        assert!(res.is_evictable("hero"));
        assert!(res.evict("hero"));
        assert!(!res.is_valid("hero"));
    }

    #[test]
    fn unknown_holder_release_is_a_no_op() {
        let mut res = ModelResources::default();
        res.hold("hero", ext("scene_a"), None);
        assert!(!res.release("hero", &ext("nobody"), None));
        assert!(!res.release("hero", &ext("nobody"), Some("smile")));
        assert!(!res.release("villain", &ext("scene_a"), None));
        assert_eq!(res.holder_count("hero"), 1);
    }

    #[test]
    fn removing_last_appearance_removes_the_holder() {
        let mut set = HolderSet::default();
        set.hold(ext("a"), Some("smile"));
        set.hold(ext("a"), Some("frown"));
        assert!(!set.release(&ext("a"), Some("smile")));
        assert!(set.contains(&ext("a")));
        assert!(set.release(&ext("a"), Some("frown")));
        assert!(!set.contains(&ext("a")));
    }

    #[test]
    fn releasing_without_appearance_drops_the_holder() {
        let mut set = HolderSet::default();
        set.hold(ext("a"), Some("smile"));
        set.hold(ext("b"), None);
        assert!(!set.release(&ext("a"), None));
        assert_eq!(set.len(), 1);
        assert!(set.appearances().is_empty());
    }

    #[test]
    fn held_models_are_not_evicted() {
        let mut res = ModelResources::default();
        res.insert_resident(ModelResource::new("hero", b"{}".to_vec()));
        let actor = World::new().spawn_empty().id();
        res.hold("hero", HolderId::Actor(actor), None);
        assert!(!res.evict("hero"));
        assert!(res.is_valid("hero"));
    }

    #[test]
    fn unload_all_forgets_everything() {
        let mut res = ModelResources::default();
        res.insert_resident(ModelResource::new("hero", b"{}".to_vec()));
        res.hold("villain", ext("scene"), None);
        assert_eq!(res.unload_all(), 2);
        assert!(!res.is_valid("hero"));
        assert_eq!(res.holder_count("villain"), 0);
    }
}
