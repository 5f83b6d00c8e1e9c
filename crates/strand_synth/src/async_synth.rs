//! Asynchronous (combinational) statement synthesis.
//!
//! The engine walks a process's statement tree bottom-up, carrying a
//! [`Frame`] per recursion level. Leaf assignments replace value pins,
//! sequential blocks fold later statements over earlier ones, and
//! conditionals multiplex the frames of their branches. The finished top
//! frame is then bound to the real output signals, inferring latches where
//! the process fails to drive an output on every path.

use std::collections::HashMap;

use crate::bus::Frame;
use crate::engine::{Drive, Synth};
use strand_diagnostics::code::codes;
use strand_diagnostics::Diagnostic;
use strand_netlist::{
    CaseCmpKind, CaseItem, CaseKind, Expr, GateOp, Link, NexusSet, NodeKind, ObjRef, ProcessId,
    ScopeId, SignalId, Stmt,
};
use strand_source::Span;

/// Selector values wider than this many bits refuse dense case synthesis.
const MAX_CASE_SEL_BITS: u32 = 20;

/// Where one selector slot of a dense case takes its value from.
#[derive(Clone, Copy)]
enum SlotSrc {
    Arm(usize),
    Default,
    Baseline,
}

impl<'a> Synth<'a> {
    /// Synthesizes one statement into `frame`. Returns false after
    /// reporting a diagnostic for anything unsynthesizable.
    pub(crate) fn synth_async(
        &mut self,
        scope: ScopeId,
        stmt: &Stmt,
        map: &NexusSet,
        frame: &mut Frame,
    ) -> bool {
        match stmt {
            Stmt::Assign {
                lvals, rval, span, ..
            } => self.synth_async_assign(scope, lvals, rval, *span, map, frame),
            Stmt::Block { stmts, span } => self.synth_async_block(scope, stmts, *span, map, frame),
            Stmt::Condit {
                cond,
                if_,
                else_,
                span,
            } => self.synth_async_condit(
                scope,
                cond,
                if_.as_deref(),
                else_.as_deref(),
                *span,
                map,
                frame,
            ),
            Stmt::Case {
                kind,
                expr,
                items,
                span,
            } => self.synth_async_case(scope, *kind, expr, items, *span, map, frame),
            Stmt::Nop { .. } => true,
            Stmt::Delay { body, .. } => match body {
                Some(body) => self.synth_async(scope, body, map, frame),
                None => true,
            },
            Stmt::AssignForce { span, .. } => {
                self.sink
                    .sorry("force and release are not synthesizable", *span);
                false
            }
            Stmt::EvWait { span, .. } => {
                self.sink
                    .sorry("event wait inside a combinational process", *span);
                false
            }
            Stmt::While { span, .. }
            | Stmt::Repeat { span, .. }
            | Stmt::Forever { span, .. }
            | Stmt::ForLoop { span, .. } => {
                self.sink.sorry("loop in a synthesized process", *span);
                false
            }
            Stmt::Disable { span, .. } => {
                self.sink.sorry("disable in a synthesized process", *span);
                false
            }
            Stmt::TaskCall { span, .. } => {
                self.sink.sorry("task call in a synthesized process", *span);
                false
            }
        }
    }

    /// An assignment replaces the value pins of the targeted outputs. The
    /// r-value is synthesized at the combined l-value width and split
    /// across the fragments, least significant fragment first.
    fn synth_async_assign(
        &mut self,
        scope: ScopeId,
        lvals: &[strand_netlist::AssignTarget],
        rval: &Expr,
        span: Span,
        map: &NexusSet,
        frame: &mut Frame,
    ) -> bool {
        let total: u32 = lvals.iter().map(|l| l.width).sum();
        let Some(rsig) = self.synthesize_expr_width(scope, rval, total) else {
            return false;
        };
        let mut off = 0;
        for lval in lvals.iter().rev() {
            if lval.word.is_some() {
                self.sink.sorry("assignment to a memory word", span);
                return false;
            }
            let part = self.select_net(scope, rsig, off, lval.width, span);
            off += lval.width;
            let nx = self.design.signal_nexus(lval.sig);
            let Some(i) = map.find_nexus(nx) else {
                continue;
            };
            let base = match &lval.base {
                None => 0,
                Some(e) => match e.eval_const(self.design).and_then(|v| v.to_u64()) {
                    Some(b) => b as u32,
                    None => {
                        self.sink
                            .sorry("non-constant l-value part select base", span);
                        return false;
                    }
                },
            };
            let full = frame.widths[i];
            if base >= full {
                continue;
            }
            let width = lval.width.min(full - base);
            if base == 0 && width == full {
                self.set_frame_value(frame, i, part);
            } else {
                // Splice the fragment into the prior value of the output.
                let prior = self.class_net(scope, frame.out.pin(i));
                let node = self.new_node(
                    scope,
                    NodeKind::Substitute {
                        width: full,
                        base,
                        sub_width: width,
                    },
                    vec![Link::output(full), Link::input(full), Link::input(width)],
                    span,
                );
                self.connect_in(node, 1, prior);
                self.connect_in(node, 2, part);
                let out = self.out_net(scope, node);
                self.set_frame_value(frame, i, out);
            }
            self.set_frame_enable(scope, frame, i, Drive::High);
            for b in base..base + width {
                frame.masks[i][b as usize] = true;
            }
        }
        true
    }

    /// A sequential block folds each statement's frame over the running
    /// value, later assignments shadowing earlier ones.
    fn synth_async_block(
        &mut self,
        scope: ScopeId,
        stmts: &[Stmt],
        span: Span,
        map: &NexusSet,
        frame: &mut Frame,
    ) -> bool {
        for stmt in stmts {
            let mut child = Frame::child(self, scope, frame, span);
            if !self.synth_async(scope, stmt, map, &mut child) {
                child.free(self.design);
                return false;
            }
            self.merge_sequential(scope, frame, child, span);
        }
        true
    }

    pub(crate) fn merge_sequential(
        &mut self,
        scope: ScopeId,
        frame: &mut Frame,
        child: Frame,
        span: Span,
    ) {
        for i in 0..frame.len() {
            if child.drove(self.design, i) {
                let v = self.class_net(scope, child.out.pin(i));
                self.set_frame_value(frame, i, v);
            }
            let pe = self.drive_state(scope, frame.ena.pin(i));
            let ce = self.drive_state(scope, child.ena.pin(i));
            let merged = match (pe, ce) {
                (Drive::High, _) | (_, Drive::High) => Drive::High,
                (Drive::Low, e) | (e, Drive::Low) => e,
                (Drive::Net(a), Drive::Net(b)) => {
                    Drive::Net(self.gate(scope, GateOp::Or, &[a, b], span))
                }
            };
            self.set_frame_enable(scope, frame, i, merged);
            for b in 0..frame.widths[i] as usize {
                let m = child.masks[i][b];
                frame.masks[i][b] |= m;
            }
        }
        child.free(self.design);
    }

    fn synth_async_condit(
        &mut self,
        scope: ScopeId,
        cond: &Expr,
        if_: Option<&Stmt>,
        else_: Option<&Stmt>,
        span: Span,
        map: &NexusSet,
        frame: &mut Frame,
    ) -> bool {
        let Some(csig) = self.synthesize_expr(scope, cond) else {
            return false;
        };
        let csig = self.reduce(scope, GateOp::Or, csig, span);
        let mut t_frame = Frame::child(self, scope, frame, span);
        let mut f_frame = Frame::child(self, scope, frame, span);
        if let Some(stmt) = if_ {
            if !self.synth_async(scope, stmt, map, &mut t_frame) {
                t_frame.free(self.design);
                f_frame.free(self.design);
                return false;
            }
        }
        if let Some(stmt) = else_ {
            if !self.synth_async(scope, stmt, map, &mut f_frame) {
                t_frame.free(self.design);
                f_frame.free(self.design);
                return false;
            }
        }
        self.merge_conditional(scope, csig, t_frame, f_frame, frame, span);
        true
    }

    /// Folds the frames of two branches into the parent through a 2:1
    /// select on `sel`. When only one branch drives an output and the
    /// other carries no enable, the mux is elided and the branch value
    /// passes through with its enable qualified by the select.
    pub(crate) fn merge_conditional(
        &mut self,
        scope: ScopeId,
        sel: SignalId,
        t: Frame,
        f: Frame,
        parent: &mut Frame,
        span: Span,
    ) {
        for i in 0..parent.len() {
            let t_drove = t.drove(self.design, i);
            let f_drove = f.drove(self.design, i);
            if !t_drove && !f_drove {
                continue;
            }
            let t_en = self.drive_state(scope, t.ena.pin(i));
            let f_en = self.drive_state(scope, f.ena.pin(i));
            let (val, en) = if t_drove && !f_drove && matches!(f_en, Drive::Low) {
                let v = self.class_net(scope, t.out.pin(i));
                (v, self.qualify_enable(scope, sel, t_en, span))
            } else if f_drove && !t_drove && matches!(t_en, Drive::Low) {
                let v = self.class_net(scope, f.out.pin(i));
                let nsel = self.not_net(scope, sel, span);
                (v, self.qualify_enable(scope, nsel, f_en, span))
            } else {
                let tv = self.class_net(scope, t.out.pin(i));
                let fv = self.class_net(scope, f.out.pin(i));
                let v = self.mux_net(scope, sel, fv, tv, span);
                (v, self.multiplex_enables(scope, sel, t_en, f_en, span))
            };
            self.set_frame_value(parent, i, val);
            self.set_frame_enable(scope, parent, i, en);
            // A bit counts as covered only when both branches assign it.
            for b in 0..parent.widths[i] as usize {
                parent.masks[i][b] = t.masks[i][b] && f.masks[i][b];
            }
        }
        t.free(self.design);
        f.free(self.design);
    }

    fn synth_async_case(
        &mut self,
        scope: ScopeId,
        kind: CaseKind,
        expr: &Expr,
        items: &[CaseItem],
        span: Span,
        map: &NexusSet,
        frame: &mut Frame,
    ) -> bool {
        match kind {
            CaseKind::CaseZ => {
                return self
                    .synth_async_case_priority(scope, expr, items, CaseCmpKind::EqZ, span, map, frame)
            }
            CaseKind::CaseX => {
                return self
                    .synth_async_case_priority(scope, expr, items, CaseCmpKind::EqX, span, map, frame)
            }
            CaseKind::Case => {}
        }
        let mut guards: Vec<(u64, &Stmt)> = Vec::new();
        let mut default: Option<&Stmt> = None;
        let mut all_const = true;
        for item in items {
            match &item.guard {
                None => {
                    if default.is_none() {
                        default = Some(&item.stmt);
                    }
                }
                Some(g) => match g.eval_const(self.design).and_then(|v| v.to_u64()) {
                    Some(v) => guards.push((v, &item.stmt)),
                    None => all_const = false,
                },
            }
        }
        if !all_const {
            // Non-constant guards still synthesize as a priority chain
            // when the selector itself is constant.
            if expr.eval_const(self.design).is_some() {
                return self
                    .synth_async_case_priority(scope, expr, items, CaseCmpKind::Eq, span, map, frame);
            }
            self.sink.emit(Diagnostic::error(
                codes::NONCONST_CASE_GUARD,
                "case guard is not a constant",
                span,
            ));
            return false;
        }
        self.synth_async_case_dense(scope, expr, guards, default, span, map, frame)
    }

    /// A plain case with constant guards becomes one wide multiplexer
    /// indexed by the (possibly truncated) selector.
    fn synth_async_case_dense(
        &mut self,
        scope: ScopeId,
        sel_expr: &Expr,
        mut guards: Vec<(u64, &Stmt)>,
        default: Option<&Stmt>,
        span: Span,
        map: &NexusSet,
        frame: &mut Frame,
    ) -> bool {
        let Some(ssig) = self.synthesize_expr(scope, sel_expr) else {
            return false;
        };
        let se_w = self.sig_width(ssig);

        // Keep the first arm of any duplicated guard value.
        let mut gmap: HashMap<u64, usize> = HashMap::new();
        let mut unique: Vec<(u64, &Stmt)> = Vec::new();
        for (v, stmt) in guards.drain(..) {
            if gmap.contains_key(&v) {
                self.sink.emit(Diagnostic::warning(
                    codes::DUPLICATE_CASE_VALUE,
                    format!("case value {v} appears more than once; first arm wins"),
                    span,
                ));
                continue;
            }
            gmap.insert(v, unique.len());
            unique.push((v, stmt));
        }

        // Guards the selector can never take are unreachable.
        if se_w < 64 {
            let limit = 1u64 << se_w;
            unique.retain(|(v, _)| {
                if *v >= limit {
                    self.sink.emit(Diagnostic::warning(
                        codes::UNREACHABLE_CASE_VALUE,
                        format!("case value {v} is wider than the selector and never matches"),
                        span,
                    ));
                    gmap.remove(v);
                    false
                } else {
                    true
                }
            });
            gmap.clear();
            for (idx, (v, _)) in unique.iter().enumerate() {
                gmap.insert(*v, idx);
            }
        }
        if unique.is_empty() {
            if let Some(d) = default {
                return self.synth_async(scope, d, map, frame);
            }
            return true;
        }

        let max_guard = unique.iter().map(|g| g.0).max().unwrap_or(0);
        let need = (64 - max_guard.leading_zeros()).clamp(1, se_w);
        // One extra selector bit routes every value above the guard range
        // to the default arm.
        let extra = default.is_some() && se_w > need;
        let total = need + extra as u32;
        if total >= MAX_CASE_SEL_BITS {
            self.sink
                .sorry("case selector too wide for single-selector synthesis", span);
            return false;
        }
        let slots = 1usize << total;

        let mut sel = self.select_net(scope, ssig, 0, need, span);
        if extra {
            let high = self.select_net(scope, ssig, need, se_w - need, span);
            let msb = self.reduce(scope, GateOp::Or, high, span);
            sel = self.concat_net(scope, &[sel, msb], span);
        }

        // The default arm is synthesized once and fanned out to every
        // slot it covers.
        let mut dframe: Option<Frame> = None;
        if let Some(d) = default {
            let mut fr = Frame::child(self, scope, frame, span);
            if !self.synth_async(scope, d, map, &mut fr) {
                fr.free(self.design);
                return false;
            }
            dframe = Some(fr);
        }
        let mut arm_frames: Vec<Frame> = Vec::new();
        for (_, stmt) in &unique {
            let mut fr = Frame::child(self, scope, frame, span);
            if !self.synth_async(scope, stmt, map, &mut fr) {
                fr.free(self.design);
                for fr in arm_frames {
                    fr.free(self.design);
                }
                if let Some(fr) = dframe {
                    fr.free(self.design);
                }
                return false;
            }
            arm_frames.push(fr);
        }

        let half = slots / 2;
        let src = |s: usize| -> SlotSrc {
            if extra && s >= half {
                SlotSrc::Default
            } else if let Some(&k) = gmap.get(&(s as u64)) {
                SlotSrc::Arm(k)
            } else if dframe.is_some() {
                SlotSrc::Default
            } else {
                SlotSrc::Baseline
            }
        };

        for i in 0..frame.len() {
            let drove_any = arm_frames.iter().any(|f| f.drove(self.design, i))
                || dframe
                    .as_ref()
                    .map_or(false, |f| f.drove(self.design, i));
            if !drove_any {
                continue;
            }
            let width = frame.widths[i];
            let mut inputs = Vec::with_capacity(slots);
            for s in 0..slots {
                let pin = match src(s) {
                    SlotSrc::Arm(k) => arm_frames[k].out.pin(i),
                    SlotSrc::Default => dframe.as_ref().unwrap().out.pin(i),
                    SlotSrc::Baseline => frame.out.pin(i),
                };
                inputs.push(self.class_net(scope, pin));
            }
            let mut pins = vec![Link::output(width), Link::input(total)];
            pins.extend((0..slots).map(|_| Link::input(width)));
            let node = self.new_node(
                scope,
                NodeKind::Mux {
                    width,
                    sel_width: total,
                    inputs: slots as u32,
                },
                pins,
                span,
            );
            self.connect_in(node, 1, sel);
            for (s, sig) in inputs.into_iter().enumerate() {
                self.connect_in(node, s as u32 + 2, sig);
            }
            let out = self.out_net(scope, node);
            self.set_frame_value(frame, i, out);

            // The case drives the output outright only when every slot
            // assigns every bit unconditionally.
            let mut all_high = true;
            let mut covered = vec![true; width as usize];
            for s in 0..slots {
                match src(s) {
                    SlotSrc::Baseline => {
                        all_high = false;
                        covered.iter_mut().for_each(|c| *c = false);
                    }
                    SlotSrc::Arm(_) | SlotSrc::Default => {
                        let fr = match src(s) {
                            SlotSrc::Arm(k) => &arm_frames[k],
                            _ => dframe.as_ref().unwrap(),
                        };
                        let en = self.drive_state(scope, fr.ena.pin(i));
                        if !matches!(en, Drive::High) || !fr.masks[i].iter().all(|m| *m) {
                            all_high = false;
                        }
                        for (b, c) in covered.iter_mut().enumerate() {
                            *c &= fr.masks[i][b];
                        }
                    }
                }
            }
            let en = if all_high { Drive::High } else { Drive::Low };
            self.set_frame_enable(scope, frame, i, en);
            frame.masks[i].copy_from_slice(&covered);
        }

        for fr in arm_frames {
            fr.free(self.design);
        }
        if let Some(fr) = dframe {
            fr.free(self.design);
        }
        true
    }

    /// `casez`/`casex` (and plain case with a constant selector) become a
    /// priority chain: arms are folded in reverse textual order over the
    /// default, each guarded by a case-comparison device.
    fn synth_async_case_priority(
        &mut self,
        scope: ScopeId,
        expr: &Expr,
        items: &[CaseItem],
        kind: CaseCmpKind,
        span: Span,
        map: &NexusSet,
        frame: &mut Frame,
    ) -> bool {
        let Some(ssig) = self.synthesize_expr(scope, expr) else {
            return false;
        };
        let cw = self.sig_width(ssig);
        let mut acc = Frame::child(self, scope, frame, span);
        if let Some(item) = items.iter().find(|it| it.guard.is_none()) {
            if !self.synth_async(scope, &item.stmt, map, &mut acc) {
                acc.free(self.design);
                return false;
            }
        }
        for item in items.iter().rev() {
            let Some(guard) = &item.guard else { continue };
            let Some(gsig) = self.synthesize_expr_width(scope, guard, cw) else {
                acc.free(self.design);
                return false;
            };
            let node = self.new_node(
                scope,
                NodeKind::CaseCmp { kind, width: cw },
                vec![Link::output(1), Link::input(cw), Link::input(cw)],
                span,
            );
            self.connect_in(node, 1, ssig);
            self.connect_in(node, 2, gsig);
            let csig = self.out_net(scope, node);
            let mut arm = Frame::child(self, scope, frame, span);
            if !self.synth_async(scope, &item.stmt, map, &mut arm) {
                arm.free(self.design);
                acc.free(self.design);
                return false;
            }
            let mut res = Frame::child(self, scope, frame, span);
            self.merge_conditional(scope, csig, arm, acc, &mut res, span);
            acc = res;
        }
        self.adopt_frame(scope, frame, acc);
        true
    }

    /// Moves a fully folded child frame's state into the parent.
    fn adopt_frame(&mut self, scope: ScopeId, frame: &mut Frame, child: Frame) {
        for i in 0..frame.len() {
            if child.drove(self.design, i) {
                let v = self.class_net(scope, child.out.pin(i));
                self.set_frame_value(frame, i, v);
            }
            let en = self.drive_state(scope, child.ena.pin(i));
            if !matches!(en, Drive::Low) {
                self.set_frame_enable(scope, frame, i, en);
            }
            for b in 0..frame.widths[i] as usize {
                let m = child.masks[i][b];
                frame.masks[i][b] |= m;
            }
        }
        child.free(self.design);
    }

    /// Synthesizes a whole combinational process and binds the result to
    /// its output signals.
    pub(crate) fn synth_async_top(&mut self, pid: ProcessId) -> bool {
        let proc = self.design.processes[pid].clone();
        let scope = proc.scope;
        let span = proc.span;
        let body = match &proc.stmt {
            Stmt::EvWait { body, .. } => body.as_ref(),
            s => s,
        };
        let mut map = NexusSet::new();
        strand_netlist::sensitivity::stmt_outputs(self.design, body, &mut map);
        if map.is_empty() {
            return true;
        }
        // Capture signal handles up front; nexus IDs shift as synthesis
        // merges classes, signal handles do not.
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
        if !self.synth_async(scope, body, &map, &mut frame) {
            frame.free(self.design);
            return false;
        }
        let mut ok = true;
        for i in 0..frame.len() {
            let out_sig = outs[i];
            if !frame.drove(self.design, i) {
                continue;
            }
            let en = self.drive_state(scope, frame.ena.pin(i));
            if matches!(en, Drive::High) {
                self.design
                    .connect(strand_netlist::PinRef::signal(out_sig), frame.out.pin(i));
                continue;
            }
            if frame.masks[i].iter().any(|m| *m) {
                let nx = self.design.signal_nexus(out_sig);
                let name = self.design.nexus_name(nx);
                self.sink.emit(
                    Diagnostic::error(
                        codes::CANNOT_SYNTHESIZE,
                        format!("some bits of '{name}' are not driven on every path"),
                        span,
                    )
                    .with_note("a latch cannot enable individual bits"),
                );
                ok = false;
                continue;
            }
            self.infer_latch(scope, &frame, i, out_sig, en, span);
        }
        frame.free(self.design);
        ok
    }

    fn infer_latch(
        &mut self,
        scope: ScopeId,
        frame: &Frame,
        i: usize,
        out_sig: SignalId,
        en: Drive,
        span: Span,
    ) {
        let width = frame.widths[i];
        let d = self.class_net(scope, frame.out.pin(i));
        let node = self.new_node(
            scope,
            NodeKind::Latch { width },
            vec![Link::output(width), Link::input(width), Link::input(1)],
            span,
        );
        self.connect_in(node, 1, d);
        self.design
            .connect(strand_netlist::PinRef::signal(out_sig), strand_netlist::PinRef::node(node, 0));
        let nx = self.design.signal_nexus(out_sig);
        let name = self.design.nexus_name(nx);
        let mut diag = Diagnostic::warning(
            codes::INFERRED_LATCH,
            format!("latch inferred for '{name}'"),
            span,
        );
        if let Drive::Net(e) = en {
            self.connect_in(node, 2, e);
            if self.design.signals[e].local {
                diag = diag
                    .with_note("the latch enable is driven by synthesized logic and may glitch");
            }
        }
        self.sink.emit(diag);
    }
}
