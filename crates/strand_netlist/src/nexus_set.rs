//! Sorted sets of (nexus, bit-range) pairs used as I/O footprints.

use crate::ids::NexusId;
use serde::{Deserialize, Serialize};

/// One entry of a [`NexusSet`]: a bit range within a nexus.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct NexusUse {
    /// The nexus being read or written.
    pub nexus: NexusId,
    /// First bit of the range.
    pub base: u32,
    /// Width of the range in bits.
    pub width: u32,
}

impl NexusUse {
    /// Creates a range entry.
    pub fn new(nexus: NexusId, base: u32, width: u32) -> Self {
        Self { nexus, base, width }
    }

    /// Returns `true` if this range fully covers `other` on the same nexus.
    pub fn covers(&self, other: &NexusUse) -> bool {
        self.nexus == other.nexus
            && self.base <= other.base
            && self.base + self.width >= other.base + other.width
    }
}

/// A sorted, de-duplicated set of (nexus, bit-range) entries.
///
/// Used as a value-semantics answer to "which signals does this statement
/// read/write". At most one entry per nexus; adding an overlapping or
/// disjoint range on the same nexus widens the existing entry to the
/// covering range. Entries are weak references; they do not keep the nexus
/// alive and are invalidated by connectivity mutation.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct NexusSet {
    items: Vec<NexusUse>,
}

impl NexusSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the set has no entries.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the entry at position `idx` (sorted by nexus ID).
    pub fn item(&self, idx: usize) -> &NexusUse {
        &self.items[idx]
    }

    /// Iterates over the entries in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &NexusUse> {
        self.items.iter()
    }

    /// Returns the position of the entry for `nexus`, if present.
    pub fn find_nexus(&self, nexus: NexusId) -> Option<usize> {
        self.items.binary_search_by_key(&nexus, |e| e.nexus).ok()
    }

    /// Adds a range. If an entry for the nexus exists, it is widened to
    /// cover both ranges; adding an already-covered range is a no-op.
    pub fn add(&mut self, entry: NexusUse) {
        match self.items.binary_search_by_key(&entry.nexus, |e| e.nexus) {
            Ok(idx) => {
                let existing = &mut self.items[idx];
                let end = (existing.base + existing.width).max(entry.base + entry.width);
                existing.base = existing.base.min(entry.base);
                existing.width = end - existing.base;
            }
            Err(idx) => self.items.insert(idx, entry),
        }
    }

    /// Adds every entry of `other`.
    pub fn add_set(&mut self, other: &NexusSet) {
        for entry in &other.items {
            self.add(*entry);
        }
    }

    /// Removes the entry for the given nexus, if present.
    pub fn rem(&mut self, nexus: NexusId) {
        if let Some(idx) = self.find_nexus(nexus) {
            self.items.remove(idx);
        }
    }

    /// Removes every nexus mentioned in `other`.
    pub fn rem_set(&mut self, other: &NexusSet) {
        for entry in &other.items {
            self.rem(entry.nexus);
        }
    }

    /// Returns `true` if this set covers the given range.
    pub fn contains(&self, entry: &NexusUse) -> bool {
        self.find_nexus(entry.nexus)
            .is_some_and(|idx| self.items[idx].covers(entry))
    }

    /// Returns `true` if this set covers every entry of `other`.
    pub fn contains_set(&self, other: &NexusSet) -> bool {
        other.items.iter().all(|entry| self.contains(entry))
    }

    /// Returns `true` if any nexus appears in both sets.
    pub fn intersect_set(&self, other: &NexusSet) -> bool {
        other
            .items
            .iter()
            .any(|entry| self.find_nexus(entry.nexus).is_some())
    }
}
