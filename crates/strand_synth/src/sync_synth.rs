//! Synchronous (edge-triggered) statement synthesis.
//!
//! A synchronous process becomes one DFF per driven output. The clock is
//! the one edge probe whose signal the body never reads; every other
//! probe is an asynchronous set/clear trigger, and the conditional that
//! tests it must load a constant into the whole register. The remaining
//! body synthesizes combinationally in front of the D input, with the
//! flop output fed back as the baseline so untouched slots hold state.

use crate::bus::Frame;
use crate::engine::{Drive, Synth};
use strand_common::LogicVec;
use strand_diagnostics::code::codes;
use strand_diagnostics::Diagnostic;
use strand_netlist::sensitivity::{expr_inputs, stmt_inputs, stmt_outputs};
use strand_netlist::{
    Edge, EventProbe, Expr, GateOp, Link, NexusSet, NexusUse, NodeKind, ObjRef, PinRef, ProcessId,
    ScopeId, SignalId, Stmt,
};
use strand_source::Span;

/// One recognized asynchronous set or clear clause.
struct AsyncClause {
    /// The 1-bit gate condition, already synthesized.
    gate: SignalId,
    /// The constant loaded into each output while the gate is active.
    values: Vec<Option<LogicVec>>,
}

/// Asynchronous controls collected while walking the body.
#[derive(Default)]
struct SyncCtl {
    aset: Option<AsyncClause>,
    aclr: Option<AsyncClause>,
}

impl<'a> Synth<'a> {
    /// Synthesizes a whole edge-triggered process into DFF devices.
    pub(crate) fn synth_sync_top(&mut self, pid: ProcessId) -> bool {
        let proc = self.design.processes[pid].clone();
        let scope = proc.scope;
        let span = proc.span;
        let Stmt::EvWait { events, body, .. } = &proc.stmt else {
            self.sink
                .sorry("synchronous process without a top-level event wait", span);
            return false;
        };

        let inputs = stmt_inputs(self.design, body, true);
        let (clock, triggers) = match self.split_clock(events, &inputs, span) {
            Some(split) => split,
            None => return false,
        };
        let neg_clock = clock.edge == Edge::Neg;

        let mut map = NexusSet::new();
        stmt_outputs(self.design, body, &mut map);
        if map.is_empty() {
            return true;
        }
        let outs: Vec<SignalId> = map
            .iter()
            .map(|u| {
                self.design
                    .nexa
                    .get(u.nexus)
                    .members()
                    .iter()
                    .find_map(|m| match m.obj {
                        ObjRef::Signal(s) => Some(s),
                        _ => None,
                    })
                    .expect("assigned output nexus always has a signal member")
            })
            .collect();

        let mut frame = Frame::new(self, scope, &map, span);
        // Feed the flop output back as the baseline: any slot the body
        // leaves untouched reads the registered value and holds.
        for (i, out_sig) in outs.iter().enumerate() {
            self.design
                .connect(PinRef::signal(*out_sig), frame.out.pin(i));
        }
        frame.rebase(self.design);

        let mut ctl = SyncCtl::default();
        let ok = self.synth_sync_stmt(scope, body, &map, &mut frame, &triggers, &mut ctl);
        if !ok {
            frame.free(self.design);
            return false;
        }

        for i in 0..frame.len() {
            let aset = ctl.aset.as_ref().and_then(|c| c.values[i].clone());
            let aclr = ctl.aclr.as_ref().and_then(|c| c.values[i].clone());
            if !frame.drove(self.design, i) && aset.is_none() && aclr.is_none() {
                continue;
            }
            let width = frame.widths[i];
            let en = self.drive_state(scope, frame.ena.pin(i));
            let d = self.class_net(scope, frame.out.pin(i));
            let node = self.new_node(
                scope,
                NodeKind::Dff {
                    width,
                    neg_clock,
                    aset_value: aset.map(|v| fit_const(v, width)),
                    aclr_value: aclr.map(|v| fit_const(v, width)),
                },
                vec![
                    Link::output(width),
                    Link::input(width),
                    Link::input(1),
                    Link::input(1),
                    Link::input(1),
                    Link::input(1),
                ],
                span,
            );
            self.design
                .connect(PinRef::signal(outs[i]), PinRef::node(node, 0));
            self.connect_in(node, 1, d);
            self.connect_in(node, 2, clock.sig);
            if let Drive::Net(ce) = en {
                self.connect_in(node, 3, ce);
            }
            if let Some(c) = &ctl.aset {
                if c.values[i].is_some() {
                    self.connect_in(node, 4, c.gate);
                }
            }
            if let Some(c) = &ctl.aclr {
                if c.values[i].is_some() {
                    self.connect_in(node, 5, c.gate);
                }
            }
        }
        frame.free(self.design);
        true
    }

    /// Separates the clock probe from the asynchronous trigger probes.
    /// The clock is the exactly-one probe the body never reads.
    fn split_clock(
        &mut self,
        events: &[EventProbe],
        inputs: &NexusSet,
        span: Span,
    ) -> Option<(EventProbe, NexusSet)> {
        let mut clock = None;
        let mut triggers = NexusSet::new();
        let mut extra = 0usize;
        for probe in events {
            let nx = self.design.signal_nexus(probe.sig);
            let width = self.design.nexus_width(nx);
            if inputs.find_nexus(nx).is_some() {
                triggers.add(NexusUse::new(nx, 0, width));
            } else if clock.is_none() {
                clock = Some(*probe);
            } else {
                extra += 1;
            }
        }
        match clock {
            Some(c) if extra == 0 => Some((c, triggers)),
            Some(_) => {
                self.sink.emit(Diagnostic::error(
                    codes::TOO_MANY_CLOCKS,
                    format!("process waits on {} clock edges", extra + 1),
                    span,
                ));
                None
            }
            None => {
                self.sink.emit(Diagnostic::error(
                    codes::TOO_MANY_CLOCKS,
                    "no clock found: every probed signal is read by the body",
                    span,
                ));
                None
            }
        }
    }

    fn synth_sync_stmt(
        &mut self,
        scope: ScopeId,
        stmt: &Stmt,
        map: &NexusSet,
        frame: &mut Frame,
        triggers: &NexusSet,
        ctl: &mut SyncCtl,
    ) -> bool {
        match stmt {
            Stmt::Condit {
                cond,
                if_,
                else_,
                span,
            } if expr_inputs(self.design, cond).intersect_set(triggers) => {
                if !self.collect_async_clause(scope, cond, if_.as_deref(), *span, map, frame, ctl) {
                    return false;
                }
                match else_ {
                    Some(rest) => self.synth_sync_stmt(scope, rest, map, frame, triggers, ctl),
                    None => true,
                }
            }
            Stmt::Block { stmts, .. } => {
                for stmt in stmts {
                    if !self.synth_sync_stmt(scope, stmt, map, frame, triggers, ctl) {
                        return false;
                    }
                }
                true
            }
            Stmt::EvWait { span, .. } => {
                self.sink
                    .sorry("nested event wait in a synchronous process", *span);
                false
            }
            _ => {
                let span = stmt.span();
                let mut child = Frame::child(self, scope, frame, span);
                if !self.synth_async(scope, stmt, map, &mut child) {
                    child.free(self.design);
                    return false;
                }
                self.merge_sequential(scope, frame, child, span);
                true
            }
        }
    }

    /// Recognizes `if (trigger) <const loads>` as an asynchronous set or
    /// clear and records it on the controls.
    fn collect_async_clause(
        &mut self,
        scope: ScopeId,
        cond: &Expr,
        body: Option<&Stmt>,
        span: Span,
        map: &NexusSet,
        frame: &Frame,
        ctl: &mut SyncCtl,
    ) -> bool {
        let Some(gate) = self.synthesize_expr(scope, cond) else {
            return false;
        };
        let gate = self.reduce(scope, GateOp::Or, gate, span);
        let mut values: Vec<Option<LogicVec>> = vec![None; frame.len()];
        if let Some(body) = body {
            if !self.collect_async_assigns(body, map, frame, &mut values) {
                return false;
            }
        }
        let all_zero = values
            .iter()
            .flatten()
            .all(|v| v.is_all_zero());
        let clause = AsyncClause { gate, values };
        let slot = if all_zero { &mut ctl.aclr } else { &mut ctl.aset };
        if slot.is_some() {
            self.sink
                .sorry("multiple asynchronous set/clear conditions", span);
            return false;
        }
        *slot = Some(clause);
        true
    }

    fn collect_async_assigns(
        &mut self,
        stmt: &Stmt,
        map: &NexusSet,
        frame: &Frame,
        values: &mut Vec<Option<LogicVec>>,
    ) -> bool {
        match stmt {
            Stmt::Assign {
                lvals, rval, span, ..
            } => {
                let Some(value) = rval.eval_const(self.design) else {
                    self.sink.emit(Diagnostic::error(
                        codes::NONCONST_ASYNC_VALUE,
                        "asynchronous set/clear loads a non-constant value",
                        *span,
                    ));
                    return false;
                };
                let mut off = 0;
                for lval in lvals.iter().rev() {
                    let part = value.slice(off, lval.width);
                    off += lval.width;
                    let nx = self.design.signal_nexus(lval.sig);
                    let Some(i) = map.find_nexus(nx) else {
                        continue;
                    };
                    if lval.word.is_some()
                        || lval.base.is_some()
                        || lval.width != frame.widths[i]
                    {
                        self.sink.emit(Diagnostic::error(
                            codes::PARTIAL_FF_ASSIGN,
                            "asynchronous set/clear must assign the whole register",
                            *span,
                        ));
                        return false;
                    }
                    values[i] = Some(part);
                }
                true
            }
            Stmt::Block { stmts, .. } => stmts
                .iter()
                .all(|s| self.collect_async_assigns(s, map, frame, values)),
            Stmt::Nop { .. } => true,
            s => {
                self.sink
                    .sorry("statement in an asynchronous set/clear branch", s.span());
                false
            }
        }
    }
}

/// Zero-extends or crops a constant to the register width.
fn fit_const(v: LogicVec, width: u32) -> LogicVec {
    if v.width() == width {
        v
    } else if v.width() > width {
        v.slice(0, width)
    } else {
        v.zero_extend(width)
    }
}
