//! Sensitivity analysis: what statements read and write, and whether a
//! process maps to combinational or clocked logic.

use crate::design::Design;
use crate::expr::Expr;
use crate::ids::{NexusId, SignalId};
use crate::nexus_set::{NexusSet, NexusUse};
use crate::process::{Process, ProcessKind};
use crate::stmt::{Edge, Stmt};

fn sig_nexus(design: &Design, sig: SignalId) -> NexusId {
    design.signals[sig]
        .pin
        .nexus
        .expect("registered signal pin always has a nexus")
}

/// The set of nexa an expression reads.
pub fn expr_inputs(design: &Design, expr: &Expr) -> NexusSet {
    let mut set = NexusSet::new();
    collect_expr_inputs(design, expr, &mut set);
    set
}

fn collect_expr_inputs(design: &Design, expr: &Expr, set: &mut NexusSet) {
    match expr {
        Expr::Const { .. } | Expr::ConstReal { .. } => {}
        Expr::Signal { sig, word, .. } => {
            let width = design.signals[*sig].width();
            set.add(NexusUse::new(sig_nexus(design, *sig), 0, width));
            if let Some(word) = word {
                collect_expr_inputs(design, word, set);
            }
        }
        Expr::Unary { operand, .. } => collect_expr_inputs(design, operand, set),
        Expr::Binary { l, r, .. } => {
            collect_expr_inputs(design, l, set);
            collect_expr_inputs(design, r, set);
        }
        Expr::Ternary { cond, t, f, .. } => {
            collect_expr_inputs(design, cond, set);
            collect_expr_inputs(design, t, set);
            collect_expr_inputs(design, f, set);
        }
        Expr::Concat { parts, .. } => {
            for part in parts {
                collect_expr_inputs(design, part, set);
            }
        }
        Expr::Select { base, index, .. } => {
            collect_expr_inputs(design, base, set);
            collect_expr_inputs(design, index, set);
        }
        Expr::Cast { operand, .. } => collect_expr_inputs(design, operand, set),
    }
}

/// The set of nexa a statement reads.
///
/// With `rem_out`, sequential blocks subtract nexa that are written by an
/// earlier statement of the same block before being read, so intra-block
/// temporaries are not mistaken for environment inputs.
pub fn stmt_inputs(design: &Design, stmt: &Stmt, rem_out: bool) -> NexusSet {
    match stmt {
        Stmt::Assign { lvals, rval, .. } => {
            let mut set = expr_inputs(design, rval);
            // Word and base indices of the targets are reads too.
            for lval in lvals {
                if let Some(word) = &lval.word {
                    collect_expr_inputs(design, word, &mut set);
                }
                if let Some(base) = &lval.base {
                    collect_expr_inputs(design, base, &mut set);
                }
            }
            set
        }
        Stmt::AssignForce { .. } => NexusSet::new(),
        Stmt::Condit {
            cond, if_, else_, ..
        } => {
            let mut set = expr_inputs(design, cond);
            if let Some(s) = if_ {
                set.add_set(&stmt_inputs(design, s, rem_out));
            }
            if let Some(s) = else_ {
                set.add_set(&stmt_inputs(design, s, rem_out));
            }
            set
        }
        Stmt::Case { expr, items, .. } => {
            let mut set = expr_inputs(design, expr);
            for item in items {
                if let Some(guard) = &item.guard {
                    set.add_set(&expr_inputs(design, guard));
                }
                set.add_set(&stmt_inputs(design, &item.stmt, rem_out));
            }
            set
        }
        Stmt::Block { stmts, .. } => {
            let mut inputs = NexusSet::new();
            let mut written = NexusSet::new();
            for s in stmts {
                let mut si = stmt_inputs(design, s, rem_out);
                if rem_out {
                    si.rem_set(&written);
                }
                inputs.add_set(&si);
                stmt_outputs(design, s, &mut written);
            }
            inputs
        }
        Stmt::EvWait { body, .. } => stmt_inputs(design, body, rem_out),
        Stmt::While { cond, body, .. } => {
            let mut set = expr_inputs(design, cond);
            set.add_set(&stmt_inputs(design, body, rem_out));
            set
        }
        Stmt::Repeat { count, body, .. } => {
            let mut set = expr_inputs(design, count);
            set.add_set(&stmt_inputs(design, body, rem_out));
            set
        }
        Stmt::Forever { body, .. } => stmt_inputs(design, body, rem_out),
        Stmt::ForLoop {
            init,
            cond,
            step,
            body,
            ..
        } => {
            let mut set = stmt_inputs(design, init, rem_out);
            set.add_set(&expr_inputs(design, cond));
            set.add_set(&stmt_inputs(design, step, rem_out));
            set.add_set(&stmt_inputs(design, body, rem_out));
            set
        }
        Stmt::Delay { body, .. } => body
            .as_ref()
            .map(|s| stmt_inputs(design, s, rem_out))
            .unwrap_or_default(),
        Stmt::Disable { .. } | Stmt::TaskCall { .. } | Stmt::Nop { .. } => NexusSet::new(),
    }
}

/// Accumulates the set of nexa a statement can write.
///
/// An assignment target with a constant part-select base records the
/// precise sub-range; a non-constant word or base index records the whole
/// signal conservatively.
pub fn stmt_outputs(design: &Design, stmt: &Stmt, out: &mut NexusSet) {
    match stmt {
        Stmt::Assign { lvals, .. } => {
            for lval in lvals {
                let nx = sig_nexus(design, lval.sig);
                let sig_width = design.signals[lval.sig].width();
                let variable_word = lval
                    .word
                    .as_ref()
                    .is_some_and(|w| w.eval_const(design).is_none());
                if variable_word {
                    out.add(NexusUse::new(nx, 0, sig_width));
                    continue;
                }
                match &lval.base {
                    None => out.add(NexusUse::new(nx, 0, lval.width.min(sig_width))),
                    Some(base) => match base.eval_const(design).and_then(|v| v.to_u64()) {
                        Some(b) => {
                            let b = (b as u32).min(sig_width);
                            let w = lval.width.min(sig_width - b);
                            out.add(NexusUse::new(nx, b, w));
                        }
                        None => out.add(NexusUse::new(nx, 0, sig_width)),
                    },
                }
            }
        }
        Stmt::AssignForce { .. } => {}
        Stmt::Condit { if_, else_, .. } => {
            if let Some(s) = if_ {
                stmt_outputs(design, s, out);
            }
            if let Some(s) = else_ {
                stmt_outputs(design, s, out);
            }
        }
        Stmt::Case { items, .. } => {
            for item in items {
                stmt_outputs(design, &item.stmt, out);
            }
        }
        Stmt::Block { stmts, .. } => {
            for s in stmts {
                stmt_outputs(design, s, out);
            }
        }
        Stmt::EvWait { body, .. } => stmt_outputs(design, body, out),
        Stmt::While { body, .. } | Stmt::Repeat { body, .. } | Stmt::Forever { body, .. } => {
            stmt_outputs(design, body, out)
        }
        Stmt::ForLoop {
            init, step, body, ..
        } => {
            stmt_outputs(design, init, out);
            stmt_outputs(design, step, out);
            stmt_outputs(design, body, out);
        }
        Stmt::Delay { body, .. } => {
            if let Some(s) = body {
                stmt_outputs(design, s, out);
            }
        }
        Stmt::Disable { .. } | Stmt::TaskCall { .. } | Stmt::Nop { .. } => {}
    }
}

/// The union of the probed signals' nexa of an event wait.
pub fn probe_set(design: &Design, stmt: &Stmt) -> NexusSet {
    let mut set = NexusSet::new();
    if let Stmt::EvWait { events, .. } = stmt {
        for probe in events {
            let width = design.signals[probe.sig].width();
            set.add(NexusUse::new(sig_nexus(design, probe.sig), 0, width));
        }
    }
    set
}

/// Returns `true` if the event wait maps to combinational logic: every
/// probe is any-edge and the probed set covers everything the body reads.
///
/// A posedge/negedge probe makes the process synchronous instead; a probed
/// set that misses a body input implies a latch, which is detected during
/// synthesis, not here.
pub fn evwait_is_asynchronous(design: &Design, stmt: &Stmt) -> bool {
    let Stmt::EvWait { events, body, .. } = stmt else {
        return false;
    };
    if events.iter().any(|p| p.edge != Edge::Any) {
        return false;
    }
    let probes = probe_set(design, stmt);
    let body_inputs = stmt_inputs(design, body, true);
    probes.contains_set(&body_inputs)
}

/// Returns `true` if the event wait maps to clocked logic: at least one
/// probe, and every probe is edge-triggered.
pub fn evwait_is_synchronous(_design: &Design, stmt: &Stmt) -> bool {
    let Stmt::EvWait { events, .. } = stmt else {
        return false;
    };
    !events.is_empty() && events.iter().all(|p| p.edge != Edge::Any)
}

/// Process-level classification; `initial` and `final` processes are never
/// asynchronous-combinational.
pub fn process_is_asynchronous(design: &Design, process: &Process) -> bool {
    if matches!(process.kind, ProcessKind::Initial | ProcessKind::Final) {
        return false;
    }
    evwait_is_asynchronous(design, &process.stmt)
}

/// Process-level synchronous classification.
pub fn process_is_synchronous(design: &Design, process: &Process) -> bool {
    if matches!(process.kind, ProcessKind::Initial | ProcessKind::Final) {
        return false;
    }
    evwait_is_synchronous(design, &process.stmt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{const_expr, BinaryOp, Expr};
    use crate::signal::NetType;
    use crate::stmt::{AssignTarget, EventProbe};
    use strand_common::LogicVec;
    use strand_source::Span;

    fn read(sig: SignalId) -> Expr {
        Expr::Signal {
            sig,
            word: None,
            span: Span::DUMMY,
        }
    }

    fn assign(sig: SignalId, width: u32, rval: Expr) -> Stmt {
        Stmt::Assign {
            lvals: vec![AssignTarget::whole(sig, width)],
            rval,
            nonblocking: false,
            span: Span::DUMMY,
        }
    }

    struct Rig {
        design: Design,
        a: SignalId,
        b: SignalId,
        q: SignalId,
    }

    fn rig() -> Rig {
        let mut design = Design::new();
        let scope = design.new_root_scope("top");
        let a = design.new_signal(scope, "a", NetType::Wire, 0, 0);
        let b = design.new_signal(scope, "b", NetType::Wire, 0, 0);
        let q = design.new_signal(scope, "q", NetType::Reg, 0, 0);
        Rig { design, a, b, q }
    }

    #[test]
    fn assign_inputs_are_rval_reads() {
        let r = rig();
        let s = assign(
            r.q,
            1,
            Expr::Binary {
                op: BinaryOp::And,
                l: Box::new(read(r.a)),
                r: Box::new(read(r.b)),
                span: Span::DUMMY,
            },
        );
        let inputs = stmt_inputs(&r.design, &s, true);
        assert_eq!(inputs.len(), 2);
        let mut outputs = NexusSet::new();
        stmt_outputs(&r.design, &s, &mut outputs);
        assert_eq!(outputs.len(), 1);
        assert_eq!(
            outputs.item(0).nexus,
            r.design.signals[r.q].pin.nexus.unwrap()
        );
    }

    #[test]
    fn block_subtracts_intra_block_temporaries() {
        let mut r = rig();
        let scope = r.design.roots[0];
        let t = r.design.new_signal(scope, "t", NetType::Reg, 0, 0);
        // begin t = a; q = t; end  reads only {a} from the environment.
        let s = Stmt::Block {
            stmts: vec![assign(t, 1, read(r.a)), assign(r.q, 1, read(t))],
            span: Span::DUMMY,
        };
        let inputs = stmt_inputs(&r.design, &s, true);
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs.item(0).nexus, r.design.signals[r.a].pin.nexus.unwrap());

        // Without rem_out the temporary shows up as an input.
        let inputs = stmt_inputs(&r.design, &s, false);
        assert_eq!(inputs.len(), 2);
    }

    #[test]
    fn constant_base_records_precise_range() {
        let mut r = rig();
        let scope = r.design.roots[0];
        let w = r.design.new_signal(scope, "w", NetType::Reg, 7, 0);
        let s = Stmt::Assign {
            lvals: vec![AssignTarget {
                sig: w,
                word: None,
                base: Some(const_expr(LogicVec::from_u64(4, 3), Span::DUMMY)),
                width: 2,
            }],
            rval: read(r.a),
            nonblocking: false,
            span: Span::DUMMY,
        };
        let mut outputs = NexusSet::new();
        stmt_outputs(&r.design, &s, &mut outputs);
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs.item(0).base, 4);
        assert_eq!(outputs.item(0).width, 2);
    }

    #[test]
    fn variable_base_records_whole_signal() {
        let mut r = rig();
        let scope = r.design.roots[0];
        let w = r.design.new_signal(scope, "w", NetType::Reg, 7, 0);
        let idx = r.design.new_signal(scope, "idx", NetType::Wire, 2, 0);
        let s = Stmt::Assign {
            lvals: vec![AssignTarget {
                sig: w,
                word: None,
                base: Some(read(idx)),
                width: 2,
            }],
            rval: read(r.a),
            nonblocking: false,
            span: Span::DUMMY,
        };
        let mut outputs = NexusSet::new();
        stmt_outputs(&r.design, &s, &mut outputs);
        assert_eq!(outputs.item(0).base, 0);
        assert_eq!(outputs.item(0).width, 8);
    }

    #[test]
    fn for_loop_reads_cond_and_writes_targets() {
        let mut r = rig();
        let scope = r.design.roots[0];
        let i = r.design.new_signal(scope, "i", NetType::Reg, 3, 0);
        let s = Stmt::ForLoop {
            init: Box::new(assign(i, 4, const_expr(LogicVec::from_u64(0, 4), Span::DUMMY))),
            cond: Expr::Binary {
                op: BinaryOp::Lt,
                l: Box::new(read(i)),
                r: Box::new(const_expr(LogicVec::from_u64(4, 4), Span::DUMMY)),
                span: Span::DUMMY,
            },
            step: Box::new(assign(i, 4, read(i))),
            body: Box::new(assign(r.q, 1, read(r.a))),
            span: Span::DUMMY,
        };
        let inputs = stmt_inputs(&r.design, &s, false);
        assert!(inputs.find_nexus(r.design.signals[i].pin.nexus.unwrap()).is_some());
        assert!(inputs.find_nexus(r.design.signals[r.a].pin.nexus.unwrap()).is_some());
        let mut outputs = NexusSet::new();
        stmt_outputs(&r.design, &s, &mut outputs);
        assert!(outputs.find_nexus(r.design.signals[i].pin.nexus.unwrap()).is_some());
        assert!(outputs.find_nexus(r.design.signals[r.q].pin.nexus.unwrap()).is_some());
    }

    #[test]
    fn complete_any_edge_list_is_asynchronous() {
        let r = rig();
        let body = assign(
            r.q,
            1,
            Expr::Binary {
                op: BinaryOp::And,
                l: Box::new(read(r.a)),
                r: Box::new(read(r.b)),
                span: Span::DUMMY,
            },
        );
        let s = Stmt::EvWait {
            events: vec![
                EventProbe { edge: Edge::Any, sig: r.a },
                EventProbe { edge: Edge::Any, sig: r.b },
            ],
            body: Box::new(body),
            span: Span::DUMMY,
        };
        assert!(evwait_is_asynchronous(&r.design, &s));
        assert!(!evwait_is_synchronous(&r.design, &s));
    }

    #[test]
    fn missing_probe_is_not_asynchronous() {
        let r = rig();
        let body = assign(
            r.q,
            1,
            Expr::Binary {
                op: BinaryOp::And,
                l: Box::new(read(r.a)),
                r: Box::new(read(r.b)),
                span: Span::DUMMY,
            },
        );
        let s = Stmt::EvWait {
            events: vec![EventProbe { edge: Edge::Any, sig: r.a }],
            body: Box::new(body),
            span: Span::DUMMY,
        };
        assert!(!evwait_is_asynchronous(&r.design, &s));
    }

    #[test]
    fn edge_probe_makes_process_synchronous() {
        let mut r = rig();
        let scope = r.design.roots[0];
        let clk = r.design.new_signal(scope, "clk", NetType::Wire, 0, 0);
        let s = Stmt::EvWait {
            events: vec![EventProbe { edge: Edge::Pos, sig: clk }],
            body: Box::new(assign(r.q, 1, read(r.a))),
            span: Span::DUMMY,
        };
        assert!(!evwait_is_asynchronous(&r.design, &s));
        assert!(evwait_is_synchronous(&r.design, &s));
    }

    #[test]
    fn initial_process_never_asynchronous() {
        let r = rig();
        let s = Stmt::EvWait {
            events: vec![EventProbe { edge: Edge::Any, sig: r.a }],
            body: Box::new(assign(r.q, 1, read(r.a))),
            span: Span::DUMMY,
        };
        let p = Process::new(r.design.roots[0], ProcessKind::Initial, s, Span::DUMMY);
        assert!(!process_is_asynchronous(&r.design, &p));
    }
}
