//! Shared net-construction helpers for the synthesis engine.
//!
//! Every structural object the engine emits goes through [`Synth`], which
//! pairs the design under mutation with the diagnostic sink. The helpers
//! here build single devices and return the local signal carrying the
//! device output, so the recursive synthesis code reads as a sequence of
//! net constructions.

use strand_common::{Logic, LogicVec};
use strand_diagnostics::DiagnosticSink;
use strand_netlist::{
    Design, GateOp, Link, Node, NodeId, NodeKind, ObjRef, PinRef, ScopeId, SelDir, SignalId,
};
use strand_source::Span;

/// The mutable synthesis context: the design being rewritten plus the sink
/// collecting diagnostics.
pub(crate) struct Synth<'a> {
    pub design: &'a mut Design,
    pub sink: &'a DiagnosticSink,
}

/// The resolved drive condition of a 1-bit enable terminal.
#[derive(Clone, Copy, PartialEq, Debug)]
pub(crate) enum Drive {
    /// Provably tied to constant 1.
    High,
    /// Provably constant 0 or undriven.
    Low,
    /// Driven by a synthesized net.
    Net(SignalId),
}

impl<'a> Synth<'a> {
    pub(crate) fn new(design: &'a mut Design, sink: &'a DiagnosticSink) -> Self {
        Self { design, sink }
    }

    /// Creates a node with a scope-unique generated name.
    pub(crate) fn new_node(
        &mut self,
        scope: ScopeId,
        kind: NodeKind,
        pins: Vec<Link>,
        span: Span,
    ) -> NodeId {
        let name = self.design.scopes[scope].local_symbol();
        let name = self.design.intern(&name);
        self.design.add_node(Node::new(scope, name, kind, pins, span))
    }

    /// Binds a fresh temporary signal to a node's output (pin 0).
    pub(crate) fn out_net(&mut self, scope: ScopeId, node: NodeId) -> SignalId {
        let width = self.design.nodes[node].pin(0).width;
        let sig = self.design.local_signal(scope, width);
        self.design
            .connect(PinRef::signal(sig), PinRef::node(node, 0));
        sig
    }

    /// Connects a signal to an input pin of a node.
    ///
    /// The signal side is passed first so its equivalence class survives
    /// the merge; synthesis relies on signal nexus IDs staying stable.
    pub(crate) fn connect_in(&mut self, node: NodeId, pin: u32, sig: SignalId) {
        self.design
            .connect(PinRef::signal(sig), PinRef::node(node, pin));
    }

    pub(crate) fn sig_width(&self, sig: SignalId) -> u32 {
        self.design.signals[sig].width()
    }

    /// A net driven by a constant.
    pub(crate) fn const_net(&mut self, scope: ScopeId, value: LogicVec, span: Span) -> SignalId {
        let width = value.width();
        let node = self.new_node(
            scope,
            NodeKind::Const { value },
            vec![Link::output(width)],
            span,
        );
        self.out_net(scope, node)
    }

    /// A single logic gate over equal-width inputs.
    pub(crate) fn gate(
        &mut self,
        scope: ScopeId,
        op: GateOp,
        inputs: &[SignalId],
        span: Span,
    ) -> SignalId {
        let width = self.sig_width(inputs[0]);
        let mut pins = vec![Link::output(width)];
        pins.extend(inputs.iter().map(|_| Link::input(width)));
        let node = self.new_node(scope, NodeKind::Gate { op, width }, pins, span);
        for (i, sig) in inputs.iter().enumerate() {
            self.connect_in(node, i as u32 + 1, *sig);
        }
        self.out_net(scope, node)
    }

    pub(crate) fn not_net(&mut self, scope: ScopeId, sig: SignalId, span: Span) -> SignalId {
        self.gate(scope, GateOp::Not, &[sig], span)
    }

    /// Reduces a vector to one bit by feeding each bit into one wide gate.
    pub(crate) fn reduce(
        &mut self,
        scope: ScopeId,
        op: GateOp,
        sig: SignalId,
        span: Span,
    ) -> SignalId {
        let width = self.sig_width(sig);
        if width == 1 {
            return if matches!(op, GateOp::Nand | GateOp::Nor | GateOp::Xnor | GateOp::Not) {
                self.not_net(scope, sig, span)
            } else {
                sig
            };
        }
        let bits: Vec<SignalId> = (0..width)
            .map(|i| self.select_net(scope, sig, i, 1, span))
            .collect();
        self.gate(scope, op, &bits, span)
    }

    /// Reads `width` bits starting at `base`; the identity select returns
    /// the signal itself.
    pub(crate) fn select_net(
        &mut self,
        scope: ScopeId,
        sig: SignalId,
        base: u32,
        width: u32,
        span: Span,
    ) -> SignalId {
        let vec_width = self.sig_width(sig);
        if base == 0 && width == vec_width {
            return sig;
        }
        let node = self.new_node(
            scope,
            NodeKind::PartSelect {
                dir: SelDir::VP,
                width,
                base: Some(base),
            },
            vec![Link::output(width), Link::input(vec_width)],
            span,
        );
        self.connect_in(node, 1, sig);
        self.out_net(scope, node)
    }

    /// Concatenates nets, first part lowest.
    pub(crate) fn concat_net(
        &mut self,
        scope: ScopeId,
        parts: &[SignalId],
        span: Span,
    ) -> SignalId {
        if parts.len() == 1 {
            return parts[0];
        }
        let widths: Vec<u32> = parts.iter().map(|p| self.sig_width(*p)).collect();
        let total: u32 = widths.iter().sum();
        let mut pins = vec![Link::output(total)];
        pins.extend(widths.iter().map(|w| Link::input(*w)));
        let node = self.new_node(scope, NodeKind::Concat { width: total }, pins, span);
        for (i, part) in parts.iter().enumerate() {
            self.connect_in(node, i as u32 + 1, *part);
        }
        self.out_net(scope, node)
    }

    /// Pads or crops a net to an exact width. Narrowing uses a part
    /// select, widening a zero concat or a sign extension node.
    pub(crate) fn pad_net(
        &mut self,
        scope: ScopeId,
        sig: SignalId,
        width: u32,
        signed: bool,
        span: Span,
    ) -> SignalId {
        let w = self.sig_width(sig);
        if w == width {
            sig
        } else if w > width {
            self.select_net(scope, sig, 0, width, span)
        } else if signed {
            let node = self.new_node(
                scope,
                NodeKind::SignExt { width },
                vec![Link::output(width), Link::input(w)],
                span,
            );
            self.connect_in(node, 1, sig);
            self.out_net(scope, node)
        } else {
            let zeros = self.const_net(scope, LogicVec::filled(Logic::Zero, width - w), span);
            self.concat_net(scope, &[sig, zeros], span)
        }
    }

    /// A 2:1 multiplexer; input 0 is taken when the select is 0.
    pub(crate) fn mux_net(
        &mut self,
        scope: ScopeId,
        sel: SignalId,
        f: SignalId,
        t: SignalId,
        span: Span,
    ) -> SignalId {
        let width = self.sig_width(t);
        let node = self.new_node(
            scope,
            NodeKind::Mux {
                width,
                sel_width: 1,
                inputs: 2,
            },
            vec![
                Link::output(width),
                Link::input(1),
                Link::input(width),
                Link::input(width),
            ],
            span,
        );
        self.connect_in(node, 1, sel);
        self.connect_in(node, 2, f);
        self.connect_in(node, 3, t);
        self.out_net(scope, node)
    }

    /// A signal carrying the value of an arbitrary pin's nexus: an existing
    /// signal member if the class has one, else a fresh temporary bound in.
    pub(crate) fn class_net(&mut self, scope: ScopeId, pin: PinRef) -> SignalId {
        let nx = self.design.pin_nexus(pin);
        for member in self.design.nexa.get(nx).members() {
            if let ObjRef::Signal(sig) = member.obj {
                return sig;
            }
        }
        let width = self.design.nexus_width(nx);
        let sig = self.design.local_signal(scope, width);
        self.design.connect(PinRef::signal(sig), pin);
        sig
    }

    /// Classifies what drives a 1-bit terminal: constant high, constant
    /// low (or nothing), or a genuine net.
    ///
    /// A class with no structural driver still counts as a net when it
    /// carries a named signal: that signal can be driven from outside the
    /// region being synthesized. Only a class of anonymous temporaries and
    /// device pins is provably low.
    pub(crate) fn drive_state(&mut self, scope: ScopeId, pin: PinRef) -> Drive {
        let nx = self.design.pin_nexus(pin);
        if self.design.drivers_constant(nx) {
            match self.design.driven_value(nx) {
                Some(Logic::One) => return Drive::High,
                Some(Logic::Zero) => return Drive::Low,
                _ => {
                    let named = self.design.nexa.get(nx).members().iter().any(
                        |m| matches!(m.obj, ObjRef::Signal(s) if !self.design.signals[s].local),
                    );
                    if !named {
                        return Drive::Low;
                    }
                }
            }
        }
        Drive::Net(self.class_net(scope, pin))
    }

    /// Gates an enable so it is active only while `sel` is 1.
    pub(crate) fn qualify_enable(
        &mut self,
        scope: ScopeId,
        sel: SignalId,
        ena: Drive,
        span: Span,
    ) -> Drive {
        match ena {
            Drive::Low => Drive::Low,
            Drive::High => Drive::Net(sel),
            Drive::Net(e) => Drive::Net(self.gate(scope, GateOp::And, &[sel, e], span)),
        }
    }

    /// Merges the enables of two conditional branches through a select,
    /// applying the boolean-algebra shortcuts before falling back to an
    /// actual 2:1 mux.
    pub(crate) fn multiplex_enables(
        &mut self,
        scope: ScopeId,
        sel: SignalId,
        t: Drive,
        f: Drive,
        span: Span,
    ) -> Drive {
        match (t, f) {
            (Drive::High, Drive::High) => Drive::High,
            (Drive::Low, Drive::Low) => Drive::Low,
            (t, Drive::Low) => self.qualify_enable(scope, sel, t, span),
            (Drive::Low, f) => {
                let nsel = self.not_net(scope, sel, span);
                self.qualify_enable(scope, nsel, f, span)
            }
            (Drive::High, Drive::Net(e)) => Drive::Net(self.gate(scope, GateOp::Or, &[sel, e], span)),
            (Drive::Net(e), Drive::High) => {
                let nsel = self.not_net(scope, sel, span);
                Drive::Net(self.gate(scope, GateOp::Or, &[nsel, e], span))
            }
            (Drive::Net(t), Drive::Net(f)) => Drive::Net(self.mux_net(scope, sel, f, t, span)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strand_netlist::NetType;

    fn ctx() -> (Design, DiagnosticSink, ScopeId) {
        let mut design = Design::new();
        let scope = design.new_root_scope("top");
        let sink = DiagnosticSink::new();
        (design, sink, scope)
    }

    #[test]
    fn const_net_value_round_trip() {
        let (mut design, sink, scope) = ctx();
        let mut synth = Synth::new(&mut design, &sink);
        let v = LogicVec::from_binary_str("1010").unwrap();
        let sig = synth.const_net(scope, v.clone(), Span::DUMMY);
        let nx = design.signal_nexus(sig);
        assert_eq!(design.driven_vector(nx), Some(v));
    }

    #[test]
    fn gate_connects_all_inputs() {
        let (mut design, sink, scope) = ctx();
        let a = design.new_signal(scope, "a", NetType::Wire, 3, 0);
        let b = design.new_signal(scope, "b", NetType::Wire, 3, 0);
        let mut synth = Synth::new(&mut design, &sink);
        let out = synth.gate(scope, GateOp::And, &[a, b], Span::DUMMY);
        assert_eq!(design.signals[out].width(), 4);
        let and_gates = design
            .nodes
            .values()
            .filter(|n| matches!(n.kind, NodeKind::Gate { op: GateOp::And, .. }))
            .count();
        assert_eq!(and_gates, 1);
    }

    #[test]
    fn select_identity_is_free() {
        let (mut design, sink, scope) = ctx();
        let a = design.new_signal(scope, "a", NetType::Wire, 7, 0);
        let mut synth = Synth::new(&mut design, &sink);
        let same = synth.select_net(scope, a, 0, 8, Span::DUMMY);
        assert_eq!(same, a);
        assert!(design.nodes.is_empty());
    }

    #[test]
    fn pad_widens_with_zeros() {
        let (mut design, sink, scope) = ctx();
        let a = design.new_signal(scope, "a", NetType::Wire, 3, 0);
        let mut synth = Synth::new(&mut design, &sink);
        let wide = synth.pad_net(scope, a, 8, false, Span::DUMMY);
        assert_eq!(design.signals[wide].width(), 8);
        let concats = design
            .nodes
            .values()
            .filter(|n| matches!(n.kind, NodeKind::Concat { .. }))
            .count();
        assert_eq!(concats, 1);
    }

    #[test]
    fn pad_signed_uses_sign_extension() {
        let (mut design, sink, scope) = ctx();
        let a = design.new_signal(scope, "a", NetType::Wire, 3, 0);
        let mut synth = Synth::new(&mut design, &sink);
        let wide = synth.pad_net(scope, a, 8, true, Span::DUMMY);
        assert_eq!(design.signals[wide].width(), 8);
        assert!(design
            .nodes
            .values()
            .any(|n| matches!(n.kind, NodeKind::SignExt { width: 8 })));
    }

    #[test]
    fn drive_state_sees_ties() {
        let (mut design, sink, scope) = ctx();
        let hi = design.tie_hi(scope);
        let lo = design.tie_lo(scope);
        let mut synth = Synth::new(&mut design, &sink);
        assert_eq!(
            synth.drive_state(scope, PinRef::signal(hi)),
            Drive::High
        );
        assert_eq!(synth.drive_state(scope, PinRef::signal(lo)), Drive::Low);
    }

    #[test]
    fn undriven_named_wire_is_a_net_not_low() {
        let (mut design, sink, scope) = ctx();
        // A named wire with no structural driver is still an enable: it
        // can be driven from outside the synthesized region.
        let free = design.new_signal(scope, "free", NetType::Wire, 0, 0);
        let tmp = design.local_signal(scope, 1);
        let mut synth = Synth::new(&mut design, &sink);
        assert_eq!(
            synth.drive_state(scope, PinRef::signal(free)),
            Drive::Net(free)
        );
        // Anonymous temporaries with no driver are provably low.
        assert_eq!(synth.drive_state(scope, PinRef::signal(tmp)), Drive::Low);
    }

    #[test]
    fn multiplex_enables_shortcuts() {
        let (mut design, sink, scope) = ctx();
        let sel = design.new_signal(scope, "sel", NetType::Wire, 0, 0);
        let mut synth = Synth::new(&mut design, &sink);
        assert_eq!(
            synth.multiplex_enables(scope, sel, Drive::High, Drive::High, Span::DUMMY),
            Drive::High
        );
        // High in the taken branch, nothing in the other: the select is
        // the enable.
        assert_eq!(
            synth.multiplex_enables(scope, sel, Drive::High, Drive::Low, Span::DUMMY),
            Drive::Net(sel)
        );
    }
}
