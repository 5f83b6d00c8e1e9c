//! Opaque ID newtypes for all netlist entities.
//!
//! Each ID is a thin `u32` wrapper that is `Copy`, `Hash`, and
//! `Serialize`/`Deserialize`. IDs are created by
//! [`Arena::alloc`](crate::arena::Arena::alloc) and used for O(1) lookup.

use crate::arena::ArenaId;
use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl ArenaId for $name {
            fn from_raw(index: u32) -> Self {
                Self(index)
            }

            fn as_raw(self) -> u32 {
                self.0
            }
        }
    };
}

define_id!(
    /// Opaque, copyable ID for a scope in the design hierarchy.
    ScopeId
);

define_id!(
    /// Opaque, copyable ID for a named signal.
    SignalId
);

define_id!(
    /// Opaque, copyable ID for a structural device node.
    NodeId
);

define_id!(
    /// Opaque, copyable ID for a behavioral process.
    ProcessId
);

define_id!(
    /// Opaque, copyable ID for a nexus (pin equivalence class).
    ///
    /// Nexus IDs are recycled through a free list when a nexus loses its
    /// last member, so a `NexusId` is only meaningful while the
    /// connectivity it was obtained from is unchanged.
    NexusId
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn id_roundtrip() {
        let id = SignalId::from_raw(42);
        assert_eq!(id.as_raw(), 42);
    }

    #[test]
    fn id_equality() {
        let a = NodeId::from_raw(7);
        let b = NodeId::from_raw(7);
        let c = NodeId::from_raw(8);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn id_hash_in_set() {
        let mut set = HashSet::new();
        set.insert(NexusId::from_raw(1));
        set.insert(NexusId::from_raw(2));
        set.insert(NexusId::from_raw(1));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn nexus_ids_order() {
        assert!(NexusId::from_raw(1) < NexusId::from_raw(2));
    }

    #[test]
    fn id_serde_roundtrip() {
        let id = ProcessId::from_raw(99);
        let json = serde_json::to_string(&id).unwrap();
        let restored: ProcessId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, restored);
    }
}
