//! The structural netlist core: design container, connectivity, and
//! behavioral trees.
//!
//! A [`Design`] owns arenas of scopes, signals, device [`Node`]s, and
//! behavioral [`Process`]es, plus the [`NexusTable`] that records which
//! pins are electrically joined. Pins reach their nexus through the
//! [`Link`] they carry; a nexus reaches its pins through its membership
//! list, and the two views are kept consistent by routing every
//! connectivity mutation through [`Design::connect`] and
//! [`Design::unlink`].
//!
//! The [`sensitivity`] module answers what a statement reads and writes
//! as [`NexusSet`] footprints, and classifies processes as combinational
//! or clocked for the synthesis engine.

#![warn(missing_docs)]

pub mod arena;
pub mod design;
pub mod expr;
pub mod ids;
pub mod link;
pub mod nexus;
pub mod nexus_set;
pub mod node;
pub mod process;
pub mod scope;
pub mod sensitivity;
pub mod signal;
pub mod stmt;

pub use arena::{Arena, ArenaId};
pub use design::Design;
pub use expr::{BinaryOp, Expr, UnaryOp};
pub use ids::{NexusId, NodeId, ProcessId, ScopeId, SignalId};
pub use link::{Link, ObjRef, PinDir, PinRef, Strength};
pub use nexus::{DriveGuess, Nexus, NexusTable};
pub use nexus_set::{NexusSet, NexusUse};
pub use node::{ArithOp, CaseCmpKind, CmpOp, GateOp, Node, NodeKind, SelDir, ShiftDir};
pub use process::{Process, ProcessKind};
pub use scope::{Attributes, Scope, ScopeKind};
pub use signal::{DataType, NetType, PortType, Signal};
pub use stmt::{AssignTarget, CaseItem, CaseKind, Edge, EventProbe, ForceKind, Stmt};
