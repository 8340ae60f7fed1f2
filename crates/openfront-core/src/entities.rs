use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

use openfront_protocol::EntityId;

/// Append-only arena for game entities.
///
/// - Stable iteration order: ascending id.
/// - Entities are deactivated by their owners, never removed, so a handle
///   handed out once stays valid for the whole game.
#[derive(Clone, Debug)]
pub struct EntityStore<Tag, T> {
    items: Vec<T>,
    _tag: PhantomData<Tag>,
}

impl<Tag, T> Default for EntityStore<Tag, T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            _tag: PhantomData,
        }
    }
}

impl<Tag, T> EntityStore<Tag, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the next id and stores the value built for it.
    pub fn insert_with(&mut self, build: impl FnOnce(EntityId<Tag>) -> T) -> EntityId<Tag> {
        let id = EntityId::new(self.items.len() as u32);
        self.items.push(build(id));
        id
    }

    pub fn get(&self, id: EntityId<Tag>) -> Option<&T> {
        self.items.get(id.index())
    }

    pub fn get_mut(&mut self, id: EntityId<Tag>) -> Option<&mut T> {
        self.items.get_mut(id.index())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter_ordered(&self) -> impl Iterator<Item = (EntityId<Tag>, &T)> {
        self.items
            .iter()
            .enumerate()
            .map(|(index, value)| (EntityId::new(index as u32), value))
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

/// Ids only come from `insert_with`, so a miss is an engine bug.
impl<Tag, T> Index<EntityId<Tag>> for EntityStore<Tag, T> {
    type Output = T;

    fn index(&self, id: EntityId<Tag>) -> &T {
        match self.items.get(id.index()) {
            Some(value) => value,
            None => panic!("unknown entity id {id:?}"),
        }
    }
}

impl<Tag, T> IndexMut<EntityId<Tag>> for EntityStore<Tag, T> {
    fn index_mut(&mut self, id: EntityId<Tag>) -> &mut T {
        match self.items.get_mut(id.index()) {
            Some(value) => value,
            None => panic!("unknown entity id {id:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openfront_protocol::UnitTag;

    #[test]
    fn ids_are_sequential_and_stable() {
        let mut store: EntityStore<UnitTag, &'static str> = EntityStore::new();
        let a = store.insert_with(|_| "a");
        let b = store.insert_with(|id| if id.raw == 1 { "b" } else { "?" });
        assert_eq!(a.raw, 0);
        assert_eq!(b.raw, 1);
        assert_eq!(store[b], "b");
        store[a] = "a2";
        assert_eq!(store.get(a), Some(&"a2"));
        let order: Vec<_> = store.iter_ordered().map(|(id, _)| id.raw).collect();
        assert_eq!(order, vec![0, 1]);
    }

    #[test]
    #[should_panic(expected = "unknown entity id")]
    fn indexing_a_foreign_id_panics() {
        let store: EntityStore<UnitTag, u8> = EntityStore::new();
        let _ = store[EntityId::new(3)];
    }
}
