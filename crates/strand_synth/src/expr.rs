//! Expression synthesis: behavioral expression trees to structural nets.
//!
//! Each call returns the signal carrying the expression value, or `None`
//! after reporting a diagnostic. Constant shift distances and constant
//! select bases are resolved into static rewiring here; only genuinely
//! dynamic distances and indices produce shifter and part-select devices.

use crate::engine::Synth;
use strand_common::{Logic, LogicVec};
use strand_diagnostics::code::codes;
use strand_diagnostics::Diagnostic;
use strand_netlist::{
    ArithOp, BinaryOp, CaseCmpKind, CmpOp, Expr, GateOp, Link, NodeKind, ScopeId, ShiftDir,
    SignalId, UnaryOp,
};
use strand_source::Span;

impl<'a> Synth<'a> {
    /// Synthesizes an expression and pads or crops the result to an exact
    /// width, sign-extending when the expression is statically signed.
    pub(crate) fn synthesize_expr_width(
        &mut self,
        scope: ScopeId,
        expr: &Expr,
        width: u32,
    ) -> Option<SignalId> {
        let sig = self.synthesize_expr(scope, expr)?;
        let signed = expr.signed(self.design);
        Some(self.pad_net(scope, sig, width, signed, expr.span()))
    }

    /// Synthesizes an expression to a net carrying its value.
    pub(crate) fn synthesize_expr(&mut self, scope: ScopeId, expr: &Expr) -> Option<SignalId> {
        let span = expr.span();
        match expr {
            Expr::Const { value, .. } => {
                if value.width() == 0 {
                    self.sink.emit(Diagnostic::error(
                        codes::CANNOT_SYNTHESIZE,
                        "zero width constant cannot be synthesized",
                        span,
                    ));
                    return None;
                }
                Some(self.const_net(scope, value.clone(), span))
            }
            Expr::ConstReal { value, .. } => Some(self.const_real_net(scope, *value, span)),
            Expr::Signal { sig, word, .. } => {
                if word.is_some() {
                    self.sink
                        .sorry("synthesis of memory word reads", span);
                    return None;
                }
                Some(*sig)
            }
            Expr::Unary { op, operand, .. } => self.synth_unary(scope, *op, operand, span),
            Expr::Binary { op, l, r, .. } => self.synth_binary(scope, *op, l, r, span),
            Expr::Ternary { cond, t, f, .. } => self.synth_ternary(scope, cond, t, f, expr, span),
            Expr::Concat { parts, repeat, .. } => self.synth_concat(scope, parts, *repeat, span),
            Expr::Select {
                base, index, width, ..
            } => self.synth_select(scope, base, index, *width, span),
            // Casts carry no hardware; signedness is consulted statically
            // by the padding and comparison paths.
            Expr::Cast { operand, .. } => self.synthesize_expr(scope, operand),
        }
    }

    fn reject_real(&mut self, e: &Expr, span: Span) -> bool {
        if e.is_real(self.design) {
            self.sink.emit(Diagnostic::error(
                codes::REAL_OPERAND,
                "real-valued operand is not representable as a bit vector",
                span,
            ));
            true
        } else {
            false
        }
    }

    fn synth_unary(
        &mut self,
        scope: ScopeId,
        op: UnaryOp,
        operand: &Expr,
        span: Span,
    ) -> Option<SignalId> {
        if self.reject_real(operand, span) {
            return None;
        }
        let sig = self.synthesize_expr(scope, operand)?;
        let net = match op {
            UnaryOp::Not => self.gate(scope, GateOp::Not, &[sig], span),
            UnaryOp::Neg => {
                let width = self.sig_width(sig);
                let zero = self.const_net(scope, LogicVec::filled(Logic::Zero, width), span);
                let node = self.new_node(
                    scope,
                    NodeKind::AddSub {
                        op: ArithOp::Sub,
                        width,
                    },
                    vec![Link::output(width), Link::input(width), Link::input(width)],
                    span,
                );
                self.connect_in(node, 1, zero);
                self.connect_in(node, 2, sig);
                self.out_net(scope, node)
            }
            UnaryOp::LogicNot | UnaryOp::ReduceNor => self.reduce(scope, GateOp::Nor, sig, span),
            UnaryOp::ReduceAnd => self.reduce(scope, GateOp::And, sig, span),
            UnaryOp::ReduceOr => self.reduce(scope, GateOp::Or, sig, span),
            UnaryOp::ReduceXor => self.reduce(scope, GateOp::Xor, sig, span),
            UnaryOp::ReduceNand => self.reduce(scope, GateOp::Nand, sig, span),
            UnaryOp::ReduceXnor => self.reduce(scope, GateOp::Xnor, sig, span),
        };
        Some(net)
    }

    fn synth_binary(
        &mut self,
        scope: ScopeId,
        op: BinaryOp,
        l: &Expr,
        r: &Expr,
        span: Span,
    ) -> Option<SignalId> {
        // Real operands bypass the bit-vector paths entirely; add and
        // subtract are the only operators that accept them.
        if matches!(op, BinaryOp::Add | BinaryOp::Sub)
            && (l.is_real(self.design) || r.is_real(self.design))
        {
            return self.synth_real_addsub(scope, op, l, r, span);
        }
        if self.reject_real(l, span) || self.reject_real(r, span) {
            return None;
        }
        match op {
            BinaryOp::Add | BinaryOp::Sub => {
                let width = l.width(self.design).max(r.width(self.design));
                let a = self.synthesize_expr_width(scope, l, width)?;
                let b = self.synthesize_expr_width(scope, r, width)?;
                let arith = if op == BinaryOp::Add {
                    ArithOp::Add
                } else {
                    ArithOp::Sub
                };
                let node = self.new_node(
                    scope,
                    NodeKind::AddSub { op: arith, width },
                    vec![Link::output(width), Link::input(width), Link::input(width)],
                    span,
                );
                self.connect_in(node, 1, a);
                self.connect_in(node, 2, b);
                Some(self.out_net(scope, node))
            }
            BinaryOp::And | BinaryOp::Or | BinaryOp::Xor | BinaryOp::Xnor => {
                let width = l.width(self.design).max(r.width(self.design));
                let a = self.synthesize_expr_width(scope, l, width)?;
                let b = self.synthesize_expr_width(scope, r, width)?;
                let gop = match op {
                    BinaryOp::And => GateOp::And,
                    BinaryOp::Or => GateOp::Or,
                    BinaryOp::Xor => GateOp::Xor,
                    _ => GateOp::Xnor,
                };
                Some(self.gate(scope, gop, &[a, b], span))
            }
            BinaryOp::LogicAnd | BinaryOp::LogicOr => {
                let a = self.synthesize_expr(scope, l)?;
                let b = self.synthesize_expr(scope, r)?;
                let a = self.reduce(scope, GateOp::Or, a, span);
                let b = self.reduce(scope, GateOp::Or, b, span);
                let gop = if op == BinaryOp::LogicAnd {
                    GateOp::And
                } else {
                    GateOp::Or
                };
                Some(self.gate(scope, gop, &[a, b], span))
            }
            BinaryOp::Eq | BinaryOp::Ne => {
                // 1-bit equality is a single XNOR/XOR gate.
                if l.width(self.design) == 1 && r.width(self.design) == 1 {
                    let a = self.synthesize_expr(scope, l)?;
                    let b = self.synthesize_expr(scope, r)?;
                    let gop = if op == BinaryOp::Eq {
                        GateOp::Xnor
                    } else {
                        GateOp::Xor
                    };
                    return Some(self.gate(scope, gop, &[a, b], span));
                }
                self.synth_compare(
                    scope,
                    if op == BinaryOp::Eq { CmpOp::Eq } else { CmpOp::Ne },
                    l,
                    r,
                    span,
                )
            }
            BinaryOp::Lt => self.synth_compare(scope, CmpOp::Lt, l, r, span),
            BinaryOp::Le => self.synth_compare(scope, CmpOp::Le, l, r, span),
            BinaryOp::Gt => self.synth_compare(scope, CmpOp::Gt, l, r, span),
            BinaryOp::Ge => self.synth_compare(scope, CmpOp::Ge, l, r, span),
            BinaryOp::CaseEq | BinaryOp::CaseNe => {
                let width = l.width(self.design).max(r.width(self.design));
                let a = self.synthesize_expr_width(scope, l, width)?;
                let b = self.synthesize_expr_width(scope, r, width)?;
                let kind = if op == BinaryOp::CaseEq {
                    CaseCmpKind::Eq
                } else {
                    CaseCmpKind::Ne
                };
                let node = self.new_node(
                    scope,
                    NodeKind::CaseCmp { kind, width },
                    vec![Link::output(1), Link::input(width), Link::input(width)],
                    span,
                );
                self.connect_in(node, 1, a);
                self.connect_in(node, 2, b);
                Some(self.out_net(scope, node))
            }
            BinaryOp::ShiftL | BinaryOp::ShiftR | BinaryOp::ShiftRS => {
                self.synth_shift(scope, op, l, r, span)
            }
        }
    }

    /// A net carrying a real-valued constant.
    fn const_real_net(&mut self, scope: ScopeId, value: f64, span: Span) -> SignalId {
        let node = self.new_node(
            scope,
            NodeKind::ConstReal { value },
            vec![Link::output(1)],
            span,
        );
        let sig = self.out_net(scope, node);
        self.design.signals[sig].data_type = strand_netlist::DataType::Real;
        sig
    }

    /// Real-valued add/sub. Two literals fold; otherwise an `AddSub`
    /// device is built over real-typed nets, with constant vector
    /// operands promoted to real literals.
    fn synth_real_addsub(
        &mut self,
        scope: ScopeId,
        op: BinaryOp,
        l: &Expr,
        r: &Expr,
        span: Span,
    ) -> Option<SignalId> {
        if let (Some(a), Some(b)) = (real_value(self.design, l), real_value(self.design, r)) {
            let value = if op == BinaryOp::Add { a + b } else { a - b };
            return Some(self.const_real_net(scope, value, span));
        }
        let a = self.real_operand(scope, l, span)?;
        let b = self.real_operand(scope, r, span)?;
        let arith = if op == BinaryOp::Add {
            ArithOp::Add
        } else {
            ArithOp::Sub
        };
        let node = self.new_node(
            scope,
            NodeKind::AddSub { op: arith, width: 1 },
            vec![Link::output(1), Link::input(1), Link::input(1)],
            span,
        );
        self.connect_in(node, 1, a);
        self.connect_in(node, 2, b);
        let sig = self.out_net(scope, node);
        self.design.signals[sig].data_type = strand_netlist::DataType::Real;
        Some(sig)
    }

    fn real_operand(&mut self, scope: ScopeId, e: &Expr, span: Span) -> Option<SignalId> {
        if let Some(v) = real_value(self.design, e) {
            return Some(self.const_real_net(scope, v, span));
        }
        if e.is_real(self.design) {
            return self.synthesize_expr(scope, e);
        }
        // A live vector net feeding real arithmetic would need a
        // conversion device the taxonomy does not have.
        self.sink
            .sorry("casting a synthesized vector to a real value", span);
        None
    }

    fn synth_compare(
        &mut self,
        scope: ScopeId,
        op: CmpOp,
        l: &Expr,
        r: &Expr,
        span: Span,
    ) -> Option<SignalId> {
        let width = l.width(self.design).max(r.width(self.design));
        // Signed comparison only when both operands are statically signed.
        let signed = l.signed(self.design) && r.signed(self.design);
        let a = self.synthesize_expr_width(scope, l, width)?;
        let b = self.synthesize_expr_width(scope, r, width)?;
        let node = self.new_node(
            scope,
            NodeKind::Compare { op, width, signed },
            vec![Link::output(1), Link::input(width), Link::input(width)],
            span,
        );
        self.connect_in(node, 1, a);
        self.connect_in(node, 2, b);
        Some(self.out_net(scope, node))
    }

    fn synth_shift(
        &mut self,
        scope: ScopeId,
        op: BinaryOp,
        l: &Expr,
        r: &Expr,
        span: Span,
    ) -> Option<SignalId> {
        let width = l.width(self.design);
        let signed = l.signed(self.design);
        let data = self.synthesize_expr(scope, l)?;
        if let Some(dist) = r.eval_const(self.design) {
            // A constant distance is a static rewiring, never a shifter.
            let Some(dist) = dist.to_u64() else {
                return Some(self.const_net(scope, LogicVec::all_x(width), span));
            };
            let dist = u32::try_from(dist).unwrap_or(width);
            return Some(self.shift_rewire(scope, op, data, width, signed, dist, span));
        }
        let dist = self.synthesize_expr(scope, r)?;
        let dist_width = self.sig_width(dist);
        let dir = if op == BinaryOp::ShiftL {
            ShiftDir::Left
        } else {
            ShiftDir::Right
        };
        let node = self.new_node(
            scope,
            NodeKind::Shift {
                dir,
                width,
                signed_pad: op == BinaryOp::ShiftRS && signed,
            },
            vec![
                Link::output(width),
                Link::input(width),
                Link::input(dist_width),
            ],
            span,
        );
        self.connect_in(node, 1, data);
        self.connect_in(node, 2, dist);
        Some(self.out_net(scope, node))
    }

    fn shift_rewire(
        &mut self,
        scope: ScopeId,
        op: BinaryOp,
        data: SignalId,
        width: u32,
        signed: bool,
        dist: u32,
        span: Span,
    ) -> SignalId {
        if dist == 0 {
            return data;
        }
        let arith = op == BinaryOp::ShiftRS && signed;
        if dist >= width {
            return if arith {
                let sign = self.select_net(scope, data, width - 1, 1, span);
                self.replicate_net(scope, sign, width, span)
            } else {
                self.const_net(scope, LogicVec::filled(Logic::Zero, width), span)
            };
        }
        match op {
            BinaryOp::ShiftL => {
                let kept = self.select_net(scope, data, 0, width - dist, span);
                let zeros = self.const_net(scope, LogicVec::filled(Logic::Zero, dist), span);
                self.concat_net(scope, &[zeros, kept], span)
            }
            _ => {
                let kept = self.select_net(scope, data, dist, width - dist, span);
                let fill = if arith {
                    let sign = self.select_net(scope, data, width - 1, 1, span);
                    self.replicate_net(scope, sign, dist, span)
                } else {
                    self.const_net(scope, LogicVec::filled(Logic::Zero, dist), span)
                };
                self.concat_net(scope, &[kept, fill], span)
            }
        }
    }

    fn replicate_net(
        &mut self,
        scope: ScopeId,
        sig: SignalId,
        count: u32,
        span: Span,
    ) -> SignalId {
        if count == 1 {
            return sig;
        }
        let width = self.sig_width(sig);
        let node = self.new_node(
            scope,
            NodeKind::Replicate { width, count },
            vec![Link::output(width * count), Link::input(width)],
            span,
        );
        self.connect_in(node, 1, sig);
        self.out_net(scope, node)
    }

    fn synth_ternary(
        &mut self,
        scope: ScopeId,
        cond: &Expr,
        t: &Expr,
        f: &Expr,
        whole: &Expr,
        span: Span,
    ) -> Option<SignalId> {
        if t.is_real(self.design) != f.is_real(self.design) {
            self.sink.emit(Diagnostic::error(
                codes::REAL_OPERAND,
                "ternary branches mix real and vector values",
                span,
            ));
            return None;
        }
        let csig = self.synthesize_expr(scope, cond)?;
        let csig = self.reduce(scope, GateOp::Or, csig, span);
        let width = whole.width(self.design);
        let tsig = self.synthesize_expr_width(scope, t, width)?;
        let fsig = self.synthesize_expr_width(scope, f, width)?;
        Some(self.mux_net(scope, csig, fsig, tsig, span))
    }

    fn synth_concat(
        &mut self,
        scope: ScopeId,
        parts: &[Expr],
        repeat: u32,
        span: Span,
    ) -> Option<SignalId> {
        // Zero-width parts are dropped; the result is defined unsigned.
        let mut nets = Vec::new();
        for part in parts.iter().rev() {
            if part.width(self.design) == 0 {
                continue;
            }
            nets.push(self.synthesize_expr(scope, part)?);
        }
        if nets.is_empty() || repeat == 0 {
            self.sink.emit(Diagnostic::error(
                codes::CANNOT_SYNTHESIZE,
                "concatenation synthesizes to zero width",
                span,
            ));
            return None;
        }
        let base = self.concat_net(scope, &nets, span);
        Some(self.replicate_net(scope, base, repeat, span))
    }

    fn synth_select(
        &mut self,
        scope: ScopeId,
        base: &Expr,
        index: &Expr,
        width: u32,
        span: Span,
    ) -> Option<SignalId> {
        let vec = self.synthesize_expr(scope, base)?;
        let vec_width = self.sig_width(vec);
        if let Some(idx) = index.eval_const(self.design) {
            // Constant base: rewire, padding out-of-range bits with X.
            let Some(idx) = idx.to_u64() else {
                return Some(self.const_net(scope, LogicVec::all_x(width), span));
            };
            let idx = u32::try_from(idx).unwrap_or(vec_width);
            if idx >= vec_width {
                return Some(self.const_net(scope, LogicVec::all_x(width), span));
            }
            let in_width = width.min(vec_width - idx);
            let part = self.select_net(scope, vec, idx, in_width, span);
            if in_width == width {
                return Some(part);
            }
            let pad = self.const_net(scope, LogicVec::all_x(width - in_width), span);
            return Some(self.concat_net(scope, &[part, pad], span));
        }
        let idx = self.synthesize_expr(scope, index)?;
        let idx_width = self.sig_width(idx);
        let node = self.new_node(
            scope,
            NodeKind::PartSelect {
                dir: strand_netlist::SelDir::VP,
                width,
                base: None,
            },
            vec![
                Link::output(width),
                Link::input(vec_width),
                Link::input(idx_width),
            ],
            span,
        );
        self.connect_in(node, 1, vec);
        self.connect_in(node, 2, idx);
        Some(self.out_net(scope, node))
    }
}

/// The compile-time real value of an expression: a real literal, or a
/// constant vector promoted to real.
fn real_value(design: &strand_netlist::Design, e: &Expr) -> Option<f64> {
    match e {
        Expr::ConstReal { value, .. } => Some(*value),
        Expr::Cast { operand, .. } => real_value(design, operand),
        _ => e
            .eval_const(design)
            .and_then(|v| v.to_u64())
            .map(|n| n as f64),
    }
}
