//! Generic arena for dense, ID-indexed storage of netlist entities.
//!
//! The [`Arena`] provides O(1) insertion and lookup by opaque [`ArenaId`]
//! keys. Removal is tombstoned: the slot stays allocated and the ID is never
//! reused, so cleanup passes can delete entities while iterating over a
//! previously collected ID list without invalidating the remaining IDs.

use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// Trait for opaque ID types used as arena keys.
///
/// Implementors must provide a bijection between `u32` indices and the ID type.
pub trait ArenaId: Copy {
    /// Creates an ID from a raw `u32` index.
    fn from_raw(index: u32) -> Self;

    /// Returns the raw `u32` index.
    fn as_raw(self) -> u32;
}

/// A dense, ID-indexed container with tombstoned removal.
///
/// Items are appended and never reordered; removing an item leaves a
/// tombstone so IDs stay stable for the lifetime of the arena.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arena<I: ArenaId, T> {
    slots: Vec<Option<T>>,
    live: usize,
    #[serde(skip)]
    _marker: PhantomData<I>,
}

impl<I: ArenaId, T> Default for Arena<I, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: ArenaId, T> Arena<I, T> {
    /// Creates a new, empty arena.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            live: 0,
            _marker: PhantomData,
        }
    }

    /// Allocates a new item in the arena and returns its ID.
    pub fn alloc(&mut self, item: T) -> I {
        let id = I::from_raw(self.slots.len() as u32);
        self.slots.push(Some(item));
        self.live += 1;
        id
    }

    /// Returns a reference to the item with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if the ID is out of bounds or the item has been removed.
    pub fn get(&self, id: I) -> &T {
        self.slots[id.as_raw() as usize]
            .as_ref()
            .expect("arena id refers to a removed item")
    }

    /// Returns a mutable reference to the item with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if the ID is out of bounds or the item has been removed.
    pub fn get_mut(&mut self, id: I) -> &mut T {
        self.slots[id.as_raw() as usize]
            .as_mut()
            .expect("arena id refers to a removed item")
    }

    /// Returns `true` if the ID refers to a live (not removed) item.
    pub fn contains(&self, id: I) -> bool {
        self.slots
            .get(id.as_raw() as usize)
            .is_some_and(|slot| slot.is_some())
    }

    /// Removes the item with the given ID, leaving a tombstone.
    ///
    /// Returns the item, or `None` if it was already removed.
    pub fn remove(&mut self, id: I) -> Option<T> {
        let slot = self.slots.get_mut(id.as_raw() as usize)?;
        let item = slot.take();
        if item.is_some() {
            self.live -= 1;
        }
        item
    }

    /// Returns the number of live items in the arena.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns `true` if the arena contains no live items.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Iterates over `(ID, &T)` pairs of live items in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|item| (I::from_raw(i as u32), item)))
    }

    /// Iterates over `(ID, &mut T)` pairs of live items in allocation order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (I, &mut T)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_mut().map(|item| (I::from_raw(i as u32), item)))
    }

    /// Collects the IDs of all live items.
    ///
    /// Useful for iteration loops that delete items as they go.
    pub fn ids(&self) -> Vec<I> {
        self.iter().map(|(id, _)| id).collect()
    }

    /// Iterates over references to live items in allocation order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().filter_map(|slot| slot.as_ref())
    }
}

impl<I: ArenaId, T> Index<I> for Arena<I, T> {
    type Output = T;

    fn index(&self, id: I) -> &T {
        self.get(id)
    }
}

impl<I: ArenaId, T> IndexMut<I> for Arena<I, T> {
    fn index_mut(&mut self, id: I) -> &mut T {
        self.get_mut(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::NodeId;

    #[test]
    fn alloc_and_get() {
        let mut arena: Arena<NodeId, String> = Arena::new();
        let id = arena.alloc("and0".to_string());
        assert_eq!(arena[id], "and0");
    }

    #[test]
    fn multiple_allocs() {
        let mut arena: Arena<NodeId, u32> = Arena::new();
        let a = arena.alloc(10);
        let b = arena.alloc(20);
        let c = arena.alloc(30);
        assert_eq!(arena[a], 10);
        assert_eq!(arena[b], 20);
        assert_eq!(arena[c], 30);
        assert_eq!(arena.len(), 3);
    }

    #[test]
    fn get_mut_modifies() {
        let mut arena: Arena<NodeId, String> = Arena::new();
        let id = arena.alloc("original".to_string());
        *arena.get_mut(id) = "modified".to_string();
        assert_eq!(arena[id], "modified");
    }

    #[test]
    fn remove_leaves_tombstone() {
        let mut arena: Arena<NodeId, u32> = Arena::new();
        let a = arena.alloc(1);
        let b = arena.alloc(2);
        assert_eq!(arena.remove(a), Some(1));
        assert!(!arena.contains(a));
        assert!(arena.contains(b));
        assert_eq!(arena.len(), 1);
        // Removing again is a no-op.
        assert_eq!(arena.remove(a), None);
        assert_eq!(arena.len(), 1);
        // IDs allocated after a removal do not reuse the slot.
        let c = arena.alloc(3);
        assert_ne!(a.as_raw(), c.as_raw());
    }

    #[test]
    fn iter_skips_tombstones() {
        let mut arena: Arena<NodeId, &str> = Arena::new();
        arena.alloc("a");
        let b = arena.alloc("b");
        arena.alloc("c");
        arena.remove(b);
        let collected: Vec<_> = arena.iter().map(|(_, v)| *v).collect();
        assert_eq!(collected, vec!["a", "c"]);
    }

    #[test]
    fn delete_while_walking_ids() {
        let mut arena: Arena<NodeId, u32> = Arena::new();
        for i in 0..5 {
            arena.alloc(i);
        }
        for id in arena.ids() {
            if arena[id] % 2 == 0 {
                arena.remove(id);
            }
        }
        let remaining: Vec<u32> = arena.values().copied().collect();
        assert_eq!(remaining, vec![1, 3]);
    }

    #[test]
    fn empty_arena() {
        let arena: Arena<NodeId, u32> = Arena::new();
        assert!(arena.is_empty());
        assert_eq!(arena.len(), 0);
    }

    #[test]
    fn serde_roundtrip() {
        let mut arena: Arena<NodeId, String> = Arena::new();
        arena.alloc("first".to_string());
        arena.alloc("second".to_string());
        let json = serde_json::to_string(&arena).unwrap();
        let restored: Arena<NodeId, String> = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.len(), 2);
        assert_eq!(restored[NodeId::from_raw(1)], "second");
    }
}
