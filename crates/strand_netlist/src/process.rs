//! Top-level behavioral processes.

use crate::ids::ScopeId;
use crate::scope::Attributes;
use crate::stmt::Stmt;
use serde::{Deserialize, Serialize};
use strand_source::Span;

/// The kind of a top-level process.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum ProcessKind {
    /// `initial`; never synthesized to hardware.
    Initial,
    /// Plain `always`.
    Always,
    /// `always_comb`.
    AlwaysComb,
    /// `always_ff`.
    AlwaysFf,
    /// `always_latch`.
    AlwaysLatch,
    /// `final`; never synthesized.
    Final,
}

/// A top-level behavioral process: the root of one statement tree.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Process {
    /// The scope the process was elaborated in.
    pub scope: ScopeId,
    /// The process kind.
    pub kind: ProcessKind,
    /// The statement tree.
    pub stmt: Stmt,
    /// Per-process attributes (`synthesis_off` and friends).
    pub attributes: Attributes,
    /// Source location.
    pub span: Span,
}

impl Process {
    /// Creates a process.
    pub fn new(scope: ScopeId, kind: ProcessKind, stmt: Stmt, span: Span) -> Self {
        Self {
            scope,
            kind,
            stmt,
            attributes: Attributes::new(),
            span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construct() {
        let p = Process::new(
            ScopeId::from_raw(0),
            ProcessKind::Always,
            Stmt::Nop { span: Span::DUMMY },
            Span::DUMMY,
        );
        assert_eq!(p.kind, ProcessKind::Always);
        assert!(p.attributes.is_empty());
    }
}
