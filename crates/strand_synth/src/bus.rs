//! Anonymous pin buses carrying partial synthesis results.
//!
//! A [`Frame`] is the per-statement state of the recursive synthesis
//! engine: a value bus whose pin `i` carries the current value of output
//! `i`, an enable bus whose pin `i` says whether the statement drives
//! output `i` unconditionally, and a per-bit mask of touched bits. Bus
//! pins are plain passive terminals on a `NodeKind::Bus` junction node;
//! the node never survives into the finished netlist.

use crate::engine::{Drive, Synth};
use strand_netlist::{Design, Link, NexusId, NexusSet, NodeKind, PinRef, ScopeId, SignalId};
use strand_source::Span;

/// An anonymous junction node used as an array of value-carrying pins.
pub(crate) struct Bus {
    node: strand_netlist::NodeId,
}

impl Bus {
    pub(crate) fn new(synth: &mut Synth, scope: ScopeId, widths: &[u32], span: Span) -> Bus {
        let pins: Vec<Link> = widths.iter().map(|w| Link::passive(*w)).collect();
        let node = synth.new_node(
            scope,
            NodeKind::Bus {
                pin_count: widths.len() as u32,
            },
            pins,
            span,
        );
        Bus { node }
    }

    pub(crate) fn pin(&self, i: usize) -> PinRef {
        PinRef::node(self.node, i as u32)
    }

    pub(crate) fn free(self, design: &mut Design) {
        design.del_node(self.node);
    }
}

/// The synthesis state threaded through one statement's recursion.
pub(crate) struct Frame {
    /// Pin `i` carries the value output `i` takes after this statement.
    pub out: Bus,
    /// Pin `i` is tied high iff the statement unconditionally drives
    /// every bit it touches of output `i`.
    pub ena: Bus,
    /// Which individual bits of output `i` some executed path assigns.
    pub masks: Vec<Vec<bool>>,
    /// Width of each output nexus.
    pub widths: Vec<u32>,
    /// The class each value pin started in, used to detect whether a
    /// statement replaced the baseline.
    base: Vec<NexusId>,
}

impl Frame {
    /// A fresh frame over the given output set; value pins start in their
    /// own singleton classes (an undriven baseline).
    pub(crate) fn new(synth: &mut Synth, scope: ScopeId, map: &NexusSet, span: Span) -> Frame {
        let widths: Vec<u32> = map
            .iter()
            .map(|u| synth.design.nexus_width(u.nexus))
            .collect();
        Frame::with_widths(synth, scope, widths, span)
    }

    fn with_widths(synth: &mut Synth, scope: ScopeId, widths: Vec<u32>, span: Span) -> Frame {
        let out = Bus::new(synth, scope, &widths, span);
        let ones = vec![1u32; widths.len()];
        let ena = Bus::new(synth, scope, &ones, span);
        let masks = widths.iter().map(|w| vec![false; *w as usize]).collect();
        let base = (0..widths.len())
            .map(|i| synth.design.pin_nexus(out.pin(i)))
            .collect();
        Frame {
            out,
            ena,
            masks,
            widths,
            base,
        }
    }

    /// A child frame whose baseline is the parent's current value: used
    /// for branches and for statements inside a sequential block.
    pub(crate) fn child(synth: &mut Synth, scope: ScopeId, parent: &Frame, span: Span) -> Frame {
        let mut frame = Frame::with_widths(synth, scope, parent.widths.clone(), span);
        for i in 0..frame.len() {
            synth.design.connect(parent.out.pin(i), frame.out.pin(i));
        }
        frame.rebase(synth.design);
        frame
    }

    pub(crate) fn len(&self) -> usize {
        self.widths.len()
    }

    /// Re-records the baseline classes; called after the caller wires the
    /// value pins to an externally supplied baseline.
    pub(crate) fn rebase(&mut self, design: &mut Design) {
        for i in 0..self.base.len() {
            self.base[i] = design.pin_nexus(self.out.pin(i));
        }
    }

    /// Whether the statement moved output `i` off its baseline value.
    pub(crate) fn drove(&self, design: &mut Design, i: usize) -> bool {
        design.pin_nexus(self.out.pin(i)) != self.base[i]
    }

    pub(crate) fn free(self, design: &mut Design) {
        self.out.free(design);
        self.ena.free(design);
    }
}

impl<'a> Synth<'a> {
    /// Replaces the value of output `i` with a synthesized net.
    pub(crate) fn set_frame_value(&mut self, frame: &Frame, i: usize, sig: SignalId) {
        self.design.unlink(frame.out.pin(i));
        self.design.connect(PinRef::signal(sig), frame.out.pin(i));
    }

    /// Replaces the enable of output `i`. A low enable is represented by
    /// leaving the pin undriven.
    pub(crate) fn set_frame_enable(&mut self, scope: ScopeId, frame: &Frame, i: usize, state: Drive) {
        self.design.unlink(frame.ena.pin(i));
        match state {
            Drive::Low => {}
            Drive::High => {
                let hi = self.design.tie_hi(scope);
                self.design.connect(PinRef::signal(hi), frame.ena.pin(i));
            }
            Drive::Net(e) => {
                self.design.connect(PinRef::signal(e), frame.ena.pin(i));
            }
        }
    }
}
