//! Pin terminals and their drive properties.
//!
//! A [`Link`] is one terminal of one pin of one object. Links are stored
//! inline in their owning object's pin array and are never separately
//! allocated; connectivity between links is recorded in the central
//! [`NexusTable`](crate::nexus::NexusTable) as membership of a
//! [`PinRef`] in a nexus.

use crate::ids::{NexusId, NodeId, SignalId};
use serde::{Deserialize, Serialize};
use strand_common::Logic;

/// The direction of a pin terminal as seen from its owning object.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum PinDir {
    /// Neither drives nor is driven; carries the nexus value. Signal pins
    /// are always passive.
    Passive,
    /// The object reads the nexus value through this pin.
    Input,
    /// The object drives the nexus value through this pin.
    Output,
}

/// Drive strength of an output terminal, weakest to strongest.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Strength {
    /// Not driven at all.
    HighZ,
    /// Weak drive.
    Weak,
    /// Pull drive (resistive).
    Pull,
    /// Normal gate drive.
    Strong,
    /// Power-rail drive; cannot be overridden.
    Supply,
}

/// One terminal of one pin of one object.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Link {
    /// Direction of this terminal.
    pub dir: PinDir,
    /// Strength with which a 0 is driven.
    pub drive0: Strength,
    /// Strength with which a 1 is driven.
    pub drive1: Strength,
    /// Initial value of the terminal.
    pub init: Logic,
    /// Number of bits carried by this pin.
    pub width: u32,
    /// The nexus this link belongs to, if it has been connected.
    ///
    /// Maintained by [`Design::connect`](crate::design::Design::connect) and
    /// [`Design::unlink`](crate::design::Design::unlink); never written
    /// directly.
    pub nexus: Option<NexusId>,
}

impl Link {
    /// Creates a passive terminal of the given width.
    pub fn passive(width: u32) -> Self {
        Self {
            dir: PinDir::Passive,
            drive0: Strength::HighZ,
            drive1: Strength::HighZ,
            init: Logic::X,
            width,
            nexus: None,
        }
    }

    /// Creates an input terminal of the given width.
    pub fn input(width: u32) -> Self {
        Self {
            dir: PinDir::Input,
            drive0: Strength::HighZ,
            drive1: Strength::HighZ,
            init: Logic::X,
            width,
            nexus: None,
        }
    }

    /// Creates an output terminal of the given width with strong drive.
    pub fn output(width: u32) -> Self {
        Self {
            dir: PinDir::Output,
            drive0: Strength::Strong,
            drive1: Strength::Strong,
            init: Logic::X,
            width,
            nexus: None,
        }
    }

    /// Returns `true` if this terminal drives its nexus.
    pub fn is_driver(&self) -> bool {
        self.dir == PinDir::Output
    }
}

/// The object owning a pin: either a named signal or a device node.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum ObjRef {
    /// A named signal; signals have exactly one pin.
    Signal(SignalId),
    /// A structural device node.
    Node(NodeId),
}

/// Identifies one pin terminal: the owning object plus the pin index.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct PinRef {
    /// The object owning the pin.
    pub obj: ObjRef,
    /// The pin index within the owner's pin array (always 0 for signals).
    pub pin: u32,
}

impl PinRef {
    /// The single pin of a signal.
    pub fn signal(sig: SignalId) -> Self {
        Self {
            obj: ObjRef::Signal(sig),
            pin: 0,
        }
    }

    /// Pin `pin` of a device node.
    pub fn node(node: NodeId, pin: u32) -> Self {
        Self {
            obj: ObjRef::Node(node),
            pin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors() {
        let p = Link::passive(8);
        assert_eq!(p.dir, PinDir::Passive);
        assert_eq!(p.width, 8);
        assert!(p.nexus.is_none());
        assert!(!p.is_driver());

        let o = Link::output(1);
        assert!(o.is_driver());
        assert_eq!(o.drive0, Strength::Strong);

        let i = Link::input(4);
        assert_eq!(i.dir, PinDir::Input);
        assert!(!i.is_driver());
    }

    #[test]
    fn strength_ordering() {
        assert!(Strength::HighZ < Strength::Weak);
        assert!(Strength::Pull < Strength::Strong);
        assert!(Strength::Strong < Strength::Supply);
    }

    #[test]
    fn pin_ref_identity() {
        let n = NodeId::from_raw(3);
        assert_eq!(PinRef::node(n, 1), PinRef::node(n, 1));
        assert_ne!(PinRef::node(n, 1), PinRef::node(n, 2));
        assert_ne!(
            PinRef::signal(SignalId::from_raw(3)),
            PinRef::node(NodeId::from_raw(3), 0)
        );
    }
}
