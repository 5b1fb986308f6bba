use bevy_ecs::prelude::*;
use smallvec::SmallVec;

/// Observer entities subscribed on behalf of one actor.
///
/// Filled when the actor becomes ready; every observer is despawned when
/// the actor is disposed, whichever path got it there.
#[derive(Component, Clone, Debug, Default)]
pub struct EventSubscriptions {
    pub observers: SmallVec<[Entity; 4]>,
}

impl EventSubscriptions {
    pub fn push(&mut self, observer: Entity) {
        self.observers.push(observer);
    }

    /// Despawn every subscribed observer.
    pub fn unsubscribe_all(&mut self, commands: &mut Commands) {
        for observer in self.observers.drain(..) {
            if let Ok(mut e) = commands.get_entity(observer) {
                e.despawn();
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}
