//! Behavioral statement trees.

use crate::expr::Expr;
use crate::ids::SignalId;
use serde::{Deserialize, Serialize};
use strand_common::Ident;
use strand_source::Span;

/// One l-value fragment of an assignment.
///
/// A concatenated l-value like `{a, b[3:0]} = x` becomes a vector of
/// fragments, most significant first.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AssignTarget {
    /// The assigned signal.
    pub sig: SignalId,
    /// Array word index, if the target is a memory word.
    pub word: Option<Expr>,
    /// First assigned bit of a part select; `None` assigns from bit 0.
    pub base: Option<Expr>,
    /// Number of assigned bits.
    pub width: u32,
}

impl AssignTarget {
    /// Targets the whole of a signal.
    pub fn whole(sig: SignalId, width: u32) -> Self {
        Self {
            sig,
            word: None,
            base: None,
            width,
        }
    }
}

/// Procedural continuous-assignment forms; none are synthesizable.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum ForceKind {
    /// `force`.
    Force,
    /// `release`.
    Release,
    /// `assign` (procedural continuous).
    Cassign,
    /// `deassign`.
    Deassign,
}

/// The flavor of a case statement.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum CaseKind {
    /// Plain `case`.
    Case,
    /// `casez`: Z bits in guards are wildcards.
    CaseZ,
    /// `casex`: X and Z bits in guards are wildcards.
    CaseX,
}

/// One arm of a case statement.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CaseItem {
    /// The guard value; `None` marks the default arm.
    pub guard: Option<Expr>,
    /// The guarded statement.
    pub stmt: Stmt,
}

/// Edge sensitivity of an event probe.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Edge {
    /// Any change (level sensitivity).
    Any,
    /// Rising edge.
    Pos,
    /// Falling edge.
    Neg,
}

/// One probe of an event wait's sensitivity list.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct EventProbe {
    /// The edge the probe triggers on.
    pub edge: Edge,
    /// The probed signal.
    pub sig: SignalId,
}

/// A procedural statement.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Stmt {
    /// A (possibly concatenated-l-value) assignment.
    Assign {
        /// L-value fragments, most significant first.
        lvals: Vec<AssignTarget>,
        /// The assigned expression.
        rval: Expr,
        /// Non-blocking (`<=`) assignment.
        nonblocking: bool,
        /// Source location.
        span: Span,
    },
    /// `force`/`release`/`assign`/`deassign`; rejected by synthesis.
    AssignForce {
        /// Which form.
        kind: ForceKind,
        /// Source location.
        span: Span,
    },
    /// `if (cond) ... else ...`; either branch may be absent.
    Condit {
        /// The condition.
        cond: Expr,
        /// The if-branch.
        if_: Option<Box<Stmt>>,
        /// The else-branch.
        else_: Option<Box<Stmt>>,
        /// Source location.
        span: Span,
    },
    /// `case`/`casez`/`casex`.
    Case {
        /// The case flavor.
        kind: CaseKind,
        /// The selector expression.
        expr: Expr,
        /// The arms, in textual order.
        items: Vec<CaseItem>,
        /// Source location.
        span: Span,
    },
    /// A `begin ... end` sequential block.
    Block {
        /// The statements in program order.
        stmts: Vec<Stmt>,
        /// Source location.
        span: Span,
    },
    /// An `@(...)` event wait guarding a body.
    EvWait {
        /// The sensitivity list.
        events: Vec<EventProbe>,
        /// The guarded statement.
        body: Box<Stmt>,
        /// Source location.
        span: Span,
    },
    /// A `while` loop; not synthesizable by this engine.
    While {
        /// Loop condition.
        cond: Expr,
        /// Loop body.
        body: Box<Stmt>,
        /// Source location.
        span: Span,
    },
    /// A `repeat (n)` loop; not synthesizable by this engine.
    Repeat {
        /// Repetition count.
        count: Expr,
        /// Loop body.
        body: Box<Stmt>,
        /// Source location.
        span: Span,
    },
    /// A `forever` loop; not synthesizable.
    Forever {
        /// Loop body.
        body: Box<Stmt>,
        /// Source location.
        span: Span,
    },
    /// A `for` loop; elaboration unrolls the synthesizable ones, so any
    /// loop that survives to this point is rejected.
    ForLoop {
        /// The initialization assignment.
        init: Box<Stmt>,
        /// The loop condition.
        cond: Expr,
        /// The step assignment.
        step: Box<Stmt>,
        /// The loop body.
        body: Box<Stmt>,
        /// Source location.
        span: Span,
    },
    /// A `#delay`; ignored for synthesis when it has no body.
    Delay {
        /// The delayed statement, if any.
        body: Option<Box<Stmt>>,
        /// Source location.
        span: Span,
    },
    /// A `disable` statement; not synthesizable.
    Disable {
        /// The disabled block's name.
        target: Ident,
        /// Source location.
        span: Span,
    },
    /// A user task enable; not synthesizable.
    TaskCall {
        /// The task name.
        name: Ident,
        /// Source location.
        span: Span,
    },
    /// An empty statement.
    Nop {
        /// Source location.
        span: Span,
    },
}

impl Stmt {
    /// The source location of this statement.
    pub fn span(&self) -> Span {
        match self {
            Stmt::Assign { span, .. }
            | Stmt::AssignForce { span, .. }
            | Stmt::Condit { span, .. }
            | Stmt::Case { span, .. }
            | Stmt::Block { span, .. }
            | Stmt::EvWait { span, .. }
            | Stmt::While { span, .. }
            | Stmt::Repeat { span, .. }
            | Stmt::Forever { span, .. }
            | Stmt::ForLoop { span, .. }
            | Stmt::Delay { span, .. }
            | Stmt::Disable { span, .. }
            | Stmt::TaskCall { span, .. }
            | Stmt::Nop { span } => *span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::const_expr;
    use strand_common::LogicVec;

    #[test]
    fn whole_target() {
        let t = AssignTarget::whole(SignalId::from_raw(0), 8);
        assert!(t.base.is_none());
        assert!(t.word.is_none());
        assert_eq!(t.width, 8);
    }

    #[test]
    fn span_accessor() {
        let s = Stmt::Assign {
            lvals: vec![AssignTarget::whole(SignalId::from_raw(0), 1)],
            rval: const_expr(LogicVec::from_bool(true), Span::DUMMY),
            nonblocking: false,
            span: Span::DUMMY,
        };
        assert!(s.span().is_dummy());
    }

    #[test]
    fn case_default_is_none_guard() {
        let item = CaseItem {
            guard: None,
            stmt: Stmt::Nop { span: Span::DUMMY },
        };
        assert!(item.guard.is_none());
    }
}
