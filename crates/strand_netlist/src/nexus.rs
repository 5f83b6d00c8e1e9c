//! Nexus storage: equivalence classes of electrically joined pins.
//!
//! A [`Nexus`] is the "wire" joining the pins whose electrical value is the
//! same. Instead of the classic intrusive link ring, membership is an
//! explicit vector of [`PinRef`]s held in a central [`NexusTable`]; merging
//! two classes moves the smaller member list into the larger one.
//!
//! The table only manages membership. Everything that needs to look inside
//! the member objects (constant-driver resolution, drive masks, naming)
//! lives on [`Design`](crate::design::Design), which owns both the table and
//! the object arenas and routes every mutation through one place so the
//! cached drive state is invalidated consistently.

use crate::ids::NexusId;
use crate::link::PinRef;
use serde::{Deserialize, Serialize};
use strand_common::LogicVec;

/// Cached result of constant-driver resolution on a nexus.
///
/// Valid only until the nexus membership changes; every mutating table
/// operation resets it to `NoGuess`.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub enum DriveGuess {
    /// Not yet computed.
    #[default]
    NoGuess,
    /// Driven by at most one constant; the value per bit. A completely
    /// undriven nexus is `Constant` of all-Z.
    Constant(LogicVec),
    /// Driven by something that is not a constant, or by more than one
    /// constant. Multi-driver constant resolution is deliberately not
    /// implemented; a second constant driver lands here.
    Var,
}

/// An equivalence class of electrically joined pins.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Nexus {
    /// The member pins. Order is not significant.
    pub(crate) members: Vec<PinRef>,
    /// Width in bits: the maximum width of any member pin ever added.
    pub(crate) width: u32,
    /// Cached constant-drive state.
    pub(crate) driven: DriveGuess,
    /// Lazily computed printable name.
    pub(crate) name: Option<String>,
}

impl Nexus {
    fn new() -> Self {
        Self {
            members: Vec::new(),
            width: 0,
            driven: DriveGuess::NoGuess,
            name: None,
        }
    }

    /// The member pins of this nexus.
    pub fn members(&self) -> &[PinRef] {
        &self.members
    }

    /// Width in bits of the widest member pin.
    pub fn width(&self) -> u32 {
        self.width
    }
}

/// Central storage for all nexa in a design.
///
/// Emptied nexa are retired to a free list and their IDs recycled, so a
/// `NexusId` is stable only while connectivity is unchanged.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NexusTable {
    slots: Vec<Option<Nexus>>,
    free: Vec<u32>,
}

impl NexusTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh, empty nexus.
    pub fn alloc(&mut self) -> NexusId {
        if let Some(raw) = self.free.pop() {
            self.slots[raw as usize] = Some(Nexus::new());
            NexusId::from_raw(raw)
        } else {
            let raw = self.slots.len() as u32;
            self.slots.push(Some(Nexus::new()));
            NexusId::from_raw(raw)
        }
    }

    /// Returns the nexus with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if the ID refers to a retired nexus.
    pub fn get(&self, id: NexusId) -> &Nexus {
        self.slots[id.as_raw() as usize]
            .as_ref()
            .expect("nexus id refers to a retired nexus")
    }

    pub(crate) fn get_mut(&mut self, id: NexusId) -> &mut Nexus {
        self.slots[id.as_raw() as usize]
            .as_mut()
            .expect("nexus id refers to a retired nexus")
    }

    /// Returns `true` if the ID refers to a live nexus.
    pub fn contains(&self, id: NexusId) -> bool {
        self.slots
            .get(id.as_raw() as usize)
            .is_some_and(|slot| slot.is_some())
    }

    /// Adds a member pin of the given width; invalidates cached state.
    pub(crate) fn add_member(&mut self, id: NexusId, pin: PinRef, width: u32) {
        let nexus = self.get_mut(id);
        nexus.members.push(pin);
        nexus.width = nexus.width.max(width);
        self.invalidate(id);
    }

    /// Removes a member pin; invalidates cached state. Retires the nexus if
    /// it has no members left. Returns `true` if the nexus was retired.
    pub(crate) fn remove_member(&mut self, id: NexusId, pin: PinRef) -> bool {
        self.get_mut(id).members.retain(|m| *m != pin);
        self.invalidate(id);
        if self.get(id).members.is_empty() {
            self.retire(id);
            true
        } else {
            false
        }
    }

    /// Empties a nexus and returns its members, retiring the slot.
    pub(crate) fn take_members(&mut self, id: NexusId) -> Vec<PinRef> {
        let members = std::mem::take(&mut self.get_mut(id).members);
        self.retire(id);
        members
    }

    /// Clears cached drive state and name for a nexus.
    pub(crate) fn invalidate(&mut self, id: NexusId) {
        let nexus = self.get_mut(id);
        nexus.driven = DriveGuess::NoGuess;
        nexus.name = None;
    }

    fn retire(&mut self, id: NexusId) {
        self.slots[id.as_raw() as usize] = None;
        self.free.push(id.as_raw());
    }

    /// Number of live nexa.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Returns `true` if the table has no live nexa.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over `(id, &Nexus)` pairs of live nexa.
    pub fn iter(&self) -> impl Iterator<Item = (NexusId, &Nexus)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|nx| (NexusId::from_raw(i as u32), nx)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::NodeId;

    fn pin(n: u32, p: u32) -> PinRef {
        PinRef::node(NodeId::from_raw(n), p)
    }

    #[test]
    fn alloc_add_members() {
        let mut table = NexusTable::new();
        let nx = table.alloc();
        table.add_member(nx, pin(0, 0), 4);
        table.add_member(nx, pin(1, 2), 8);
        assert_eq!(table.get(nx).members().len(), 2);
        assert_eq!(table.get(nx).width(), 8);
    }

    #[test]
    fn remove_last_member_retires() {
        let mut table = NexusTable::new();
        let nx = table.alloc();
        table.add_member(nx, pin(0, 0), 1);
        assert!(!table.remove_member(nx, pin(9, 9)) || table.contains(nx));
        assert!(table.remove_member(nx, pin(0, 0)));
        assert!(!table.contains(nx));
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn retired_slot_is_recycled() {
        let mut table = NexusTable::new();
        let a = table.alloc();
        table.add_member(a, pin(0, 0), 1);
        table.remove_member(a, pin(0, 0));
        let b = table.alloc();
        assert_eq!(a.as_raw(), b.as_raw());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn mutation_clears_cache() {
        let mut table = NexusTable::new();
        let nx = table.alloc();
        table.add_member(nx, pin(0, 0), 1);
        table.get_mut(nx).driven = DriveGuess::Var;
        table.get_mut(nx).name = Some("n".to_string());
        table.add_member(nx, pin(1, 0), 1);
        assert_eq!(table.get(nx).driven, DriveGuess::NoGuess);
        assert!(table.get(nx).name.is_none());
    }

    #[test]
    fn take_members_retires() {
        let mut table = NexusTable::new();
        let nx = table.alloc();
        table.add_member(nx, pin(0, 0), 1);
        table.add_member(nx, pin(1, 0), 1);
        let members = table.take_members(nx);
        assert_eq!(members.len(), 2);
        assert!(!table.contains(nx));
    }
}
