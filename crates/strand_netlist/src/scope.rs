//! The scope tree: modules, tasks, functions, and named blocks.

use crate::ids::{ScopeId, SignalId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strand_common::Ident;

/// Per-object key/value attribute store.
///
/// Attributes arrive from HDL attribute instances and pragma comments; the
/// synthesis driver honors `synthesis_off`, `synthesis_cell`, and
/// `combinational`.
pub type Attributes = BTreeMap<Ident, String>;

/// The kind of a scope.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum ScopeKind {
    /// A module instance.
    Module,
    /// A task body.
    Task,
    /// A function body.
    Func,
    /// A named begin/end block.
    Begin,
}

/// One scope in the design hierarchy.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scope {
    /// The scope's own name.
    pub name: Ident,
    /// The enclosing scope; `None` for a root module.
    pub parent: Option<ScopeId>,
    /// What kind of scope this is.
    pub kind: ScopeKind,
    /// Per-scope attributes.
    pub attributes: Attributes,
    /// Lazily created constant-1 singleton net, shared by all users in this
    /// scope.
    pub tie_hi: Option<SignalId>,
    /// Lazily created constant-0 singleton net.
    pub tie_lo: Option<SignalId>,
    /// Counter backing [`local_symbol`](Self::local_symbol).
    local_counter: u32,
}

impl Scope {
    /// Creates a scope.
    pub fn new(name: Ident, parent: Option<ScopeId>, kind: ScopeKind) -> Self {
        Self {
            name,
            parent,
            kind,
            attributes: Attributes::new(),
            tie_hi: None,
            tie_lo: None,
            local_counter: 0,
        }
    }

    /// Returns `true` if this scope has no parent.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Generates a name for a synthesis temporary, unique within this
    /// scope: `_s0`, `_s1`, ...
    pub fn local_symbol(&mut self) -> String {
        let name = format!("_s{}", self.local_counter);
        self.local_counter += 1;
        name
    }

    /// Looks up an attribute value by key.
    pub fn attribute(&self, key: Ident) -> Option<&str> {
        self.attributes.get(&key).map(|s| s.as_str())
    }
}
