//! The design container: arenas, the nexus table, and all connectivity
//! mutation.
//!
//! Every operation that changes which pins share a nexus goes through
//! [`Design::connect`] and [`Design::unlink`], so the cached constant-drive
//! state on affected nexa is invalidated in exactly one place.

use crate::arena::Arena;
use crate::ids::{NexusId, NodeId, ProcessId, ScopeId, SignalId};
use crate::link::{Link, ObjRef, PinDir, PinRef};
use crate::nexus::{DriveGuess, NexusTable};
use crate::node::{Node, NodeKind};
use crate::process::Process;
use crate::scope::{Scope, ScopeKind};
use crate::signal::{NetType, PortType, Signal};
use strand_common::{Ident, Interner, Logic, LogicVec};
use strand_source::Span;

/// The whole elaborated design: scope tree, signals, device nodes,
/// behavioral processes, and the nexus connectivity table.
pub struct Design {
    /// The scope hierarchy.
    pub scopes: Arena<ScopeId, Scope>,
    /// All named signals.
    pub signals: Arena<SignalId, Signal>,
    /// All structural device nodes.
    pub nodes: Arena<NodeId, Node>,
    /// All behavioral processes.
    pub processes: Arena<ProcessId, Process>,
    /// The nexus table.
    pub nexa: NexusTable,
    /// The string interner shared by everything in the design.
    pub interner: Interner,
    /// Root (top-level module) scopes.
    pub roots: Vec<ScopeId>,
}

impl Design {
    /// Creates an empty design.
    pub fn new() -> Self {
        Self {
            scopes: Arena::new(),
            signals: Arena::new(),
            nodes: Arena::new(),
            processes: Arena::new(),
            nexa: NexusTable::new(),
            interner: Interner::new(),
            roots: Vec::new(),
        }
    }

    /// Interns a string in the design's interner.
    pub fn intern(&self, s: &str) -> Ident {
        self.interner.get_or_intern(s)
    }

    // ------------------------------------------------------------------
    // Scopes

    /// Creates a root module scope.
    pub fn new_root_scope(&mut self, name: &str) -> ScopeId {
        let name = self.intern(name);
        let id = self.scopes.alloc(Scope::new(name, None, ScopeKind::Module));
        self.roots.push(id);
        id
    }

    /// Creates a child scope.
    pub fn new_scope(&mut self, parent: ScopeId, name: &str, kind: ScopeKind) -> ScopeId {
        let name = self.intern(name);
        self.scopes.alloc(Scope::new(name, Some(parent), kind))
    }

    /// The full hierarchical path of a scope, segments joined with `.`.
    pub fn scope_path(&self, scope: ScopeId) -> String {
        let mut segments = Vec::new();
        let mut cur = Some(scope);
        while let Some(id) = cur {
            let s = &self.scopes[id];
            segments.push(self.interner.resolve(s.name).to_string());
            cur = s.parent;
        }
        segments.reverse();
        segments.join(".")
    }

    // ------------------------------------------------------------------
    // Signals

    /// Registers a signal, placing its pin in a fresh nexus.
    pub fn add_signal(&mut self, signal: Signal) -> SignalId {
        let width = signal.pin.width;
        let id = self.signals.alloc(signal);
        let nx = self.nexa.alloc();
        self.nexa.add_member(nx, PinRef::signal(id), width);
        self.signals[id].pin.nexus = Some(nx);
        id
    }

    /// Creates and registers a signal with the packed range `[msb:lsb]`.
    pub fn new_signal(
        &mut self,
        scope: ScopeId,
        name: &str,
        net_type: NetType,
        msb: i32,
        lsb: i32,
    ) -> SignalId {
        let name = self.intern(name);
        self.add_signal(Signal::new(scope, name, net_type, msb, lsb, Span::DUMMY))
    }

    /// Creates a synthesis-temporary wire of the given width.
    pub fn local_signal(&mut self, scope: ScopeId, width: u32) -> SignalId {
        let name = self.scopes[scope].local_symbol();
        let name = self.intern(&name);
        let mut sig = Signal::new(
            scope,
            name,
            NetType::Wire,
            width as i32 - 1,
            0,
            Span::DUMMY,
        );
        sig.local = true;
        self.add_signal(sig)
    }

    /// Unlinks a signal's pin and removes the signal.
    pub fn rem_signal(&mut self, sig: SignalId) {
        self.unlink(PinRef::signal(sig));
        self.signals.remove(sig);
    }

    // ------------------------------------------------------------------
    // Nodes

    /// Registers a node, placing each pin in its own fresh nexus.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let widths: Vec<u32> = node.pins.iter().map(|p| p.width).collect();
        let id = self.nodes.alloc(node);
        for (pin, width) in widths.into_iter().enumerate() {
            let nx = self.nexa.alloc();
            self.nexa.add_member(nx, PinRef::node(id, pin as u32), width);
            self.nodes[id].pins[pin].nexus = Some(nx);
        }
        id
    }

    /// Unlinks every pin of a node, then removes the node.
    pub fn del_node(&mut self, node: NodeId) {
        let pin_count = self.nodes[node].pin_count();
        for pin in 0..pin_count {
            self.unlink(PinRef::node(node, pin));
        }
        self.nodes.remove(node);
    }

    // ------------------------------------------------------------------
    // Processes

    /// Registers a behavioral process.
    pub fn add_process(&mut self, process: Process) -> ProcessId {
        self.processes.alloc(process)
    }

    /// Removes a behavioral process.
    pub fn delete_process(&mut self, process: ProcessId) {
        self.processes.remove(process);
    }

    // ------------------------------------------------------------------
    // Connectivity

    /// The link at a pin.
    pub fn link(&self, pin: PinRef) -> &Link {
        match pin.obj {
            ObjRef::Signal(sig) => &self.signals[sig].pin,
            ObjRef::Node(node) => self.nodes[node].pin(pin.pin),
        }
    }

    fn link_mut(&mut self, pin: PinRef) -> &mut Link {
        match pin.obj {
            ObjRef::Signal(sig) => &mut self.signals[sig].pin,
            ObjRef::Node(node) => self.nodes[node].pin_mut(pin.pin),
        }
    }

    /// The nexus a pin belongs to, creating a singleton nexus on demand.
    pub fn pin_nexus(&mut self, pin: PinRef) -> NexusId {
        if let Some(nx) = self.link(pin).nexus {
            return nx;
        }
        let width = self.link(pin).width;
        let nx = self.nexa.alloc();
        self.nexa.add_member(nx, pin, width);
        self.link_mut(pin).nexus = Some(nx);
        nx
    }

    /// The nexus of a signal's pin.
    pub fn signal_nexus(&mut self, sig: SignalId) -> NexusId {
        self.pin_nexus(PinRef::signal(sig))
    }

    /// Electrically joins two pins, merging their equivalence classes.
    ///
    /// The smaller class is folded into the larger one; cached drive state
    /// on the surviving nexus is invalidated.
    pub fn connect(&mut self, a: PinRef, b: PinRef) {
        let na = self.pin_nexus(a);
        let nb = self.pin_nexus(b);
        if na == nb {
            return;
        }
        let (keep, drop) =
            if self.nexa.get(na).members().len() >= self.nexa.get(nb).members().len() {
                (na, nb)
            } else {
                (nb, na)
            };
        let moved = self.nexa.take_members(drop);
        for pin in moved {
            let width = self.link(pin).width;
            self.link_mut(pin).nexus = Some(keep);
            self.nexa.add_member(keep, pin, width);
        }
    }

    /// Removes a pin from its nexus. A nexus left without members is
    /// retired.
    pub fn unlink(&mut self, pin: PinRef) {
        if let Some(nx) = self.link(pin).nexus {
            self.link_mut(pin).nexus = None;
            self.nexa.remove_member(nx, pin);
        }
    }

    /// Returns `true` if two pins share a nexus.
    pub fn connected(&mut self, a: PinRef, b: PinRef) -> bool {
        self.pin_nexus(a) == self.pin_nexus(b)
    }

    /// Width in bits of a nexus.
    pub fn nexus_width(&self, nx: NexusId) -> u32 {
        self.nexa.get(nx).width()
    }

    // ------------------------------------------------------------------
    // Constant-driver resolution

    fn compute_driven(&self, nx: NexusId) -> DriveGuess {
        let width = self.nexa.get(nx).width();
        let mut candidate: Option<LogicVec> = None;
        let mut supply: Option<Logic> = None;

        for pin in self.nexa.get(nx).members() {
            match pin.obj {
                ObjRef::Signal(sid) => {
                    let sig = &self.signals[sid];
                    match sig.net_type {
                        NetType::Supply0 => supply = Some(Logic::Zero),
                        NetType::Supply1 => supply = Some(Logic::One),
                        _ => {
                            // An input port of a root scope is driven from
                            // outside the design; nothing can be assumed.
                            if self.scopes[sig.scope].is_root()
                                && matches!(sig.port_type, PortType::Input | PortType::Inout)
                            {
                                return DriveGuess::Var;
                            }
                            if sig.lref > 0 {
                                return DriveGuess::Var;
                            }
                        }
                    }
                }
                ObjRef::Node(nid) => {
                    let node = &self.nodes[nid];
                    let link = node.pin(pin.pin);
                    if link.dir != PinDir::Output {
                        continue;
                    }
                    match &node.kind {
                        NodeKind::Const { value } => {
                            if candidate.is_some() {
                                // A second constant driver: resolution is
                                // deliberately not implemented.
                                return DriveGuess::Var;
                            }
                            candidate = Some(value.clone());
                        }
                        _ => return DriveGuess::Var,
                    }
                }
            }
        }

        if let Some(rail) = supply {
            return DriveGuess::Constant(LogicVec::filled(rail, width));
        }
        match candidate {
            Some(v) if v.width() >= width => DriveGuess::Constant(v.slice(0, width)),
            // Bits beyond the constant's width stay undriven.
            Some(v) => {
                let pad = LogicVec::filled(Logic::Z, width - v.width());
                DriveGuess::Constant(v.concat(&pad))
            }
            None => DriveGuess::Constant(LogicVec::filled(Logic::Z, width)),
        }
    }

    fn driven(&mut self, nx: NexusId) -> DriveGuess {
        if self.nexa.get(nx).driven == DriveGuess::NoGuess {
            let guess = self.compute_driven(nx);
            self.nexa.get_mut(nx).driven = guess;
        }
        self.nexa.get(nx).driven.clone()
    }

    /// Returns `true` if the nexus is driven by at most one constant (an
    /// undriven nexus counts: its value is all Z).
    ///
    /// The result is cached on the nexus and invalidated by any
    /// connectivity mutation.
    pub fn drivers_constant(&mut self, nx: NexusId) -> bool {
        !matches!(self.driven(nx), DriveGuess::Var)
    }

    /// The constant value of the nexus, or `None` if not constant-driven.
    pub fn driven_vector(&mut self, nx: NexusId) -> Option<LogicVec> {
        match self.driven(nx) {
            DriveGuess::Constant(v) => Some(v),
            _ => None,
        }
    }

    /// The single constant value driven onto every bit, or `None` if the
    /// nexus is not constant-driven or its bits differ.
    pub fn driven_value(&mut self, nx: NexusId) -> Option<Logic> {
        let v = self.driven_vector(nx)?;
        let first = v.get(0);
        (0..v.width()).all(|i| v.get(i) == first).then_some(first)
    }

    /// Per-bit "some structural driver touches this bit".
    ///
    /// Each driving link covers its own width starting at bit 0.
    pub fn driven_mask(&self, nx: NexusId) -> Vec<bool> {
        let width = self.nexa.get(nx).width() as usize;
        let mut mask = vec![false; width];
        for pin in self.nexa.get(nx).members() {
            let link = self.link(*pin);
            if link.is_driver() {
                let covered = (link.width as usize).min(width);
                for bit in mask.iter_mut().take(covered) {
                    *bit = true;
                }
            }
        }
        mask
    }

    /// A printable name for the nexus, cached lazily: the hierarchical name
    /// of a member signal (preferring non-temporaries), or a synthetic
    /// placeholder if only device pins are connected.
    pub fn nexus_name(&mut self, nx: NexusId) -> String {
        if let Some(name) = &self.nexa.get(nx).name {
            return name.clone();
        }
        let mut best: Option<SignalId> = None;
        for pin in self.nexa.get(nx).members() {
            if let ObjRef::Signal(sid) = pin.obj {
                let replace = match best {
                    None => true,
                    Some(cur) => self.signals[cur].local && !self.signals[sid].local,
                };
                if replace {
                    best = Some(sid);
                }
            }
        }
        let name = match best {
            Some(sid) => {
                let sig = &self.signals[sid];
                format!(
                    "{}.{}",
                    self.scope_path(sig.scope),
                    self.interner.resolve(sig.name)
                )
            }
            None => format!("<nexus {}>", nx.as_raw()),
        };
        self.nexa.get_mut(nx).name = Some(name.clone());
        name
    }

    // ------------------------------------------------------------------
    // Tie rails

    fn make_tie(&mut self, scope: ScopeId, bit: Logic, name: &str) -> SignalId {
        let ident = self.intern(name);
        let mut sig = Signal::new(scope, ident, NetType::Wire, 0, 0, Span::DUMMY);
        sig.local = true;
        let sig = self.add_signal(sig);
        let node_name = self.intern(name);
        let node = Node::new(
            scope,
            node_name,
            NodeKind::Const {
                value: LogicVec::filled(bit, 1),
            },
            vec![Link::output(1)],
            Span::DUMMY,
        );
        let node = self.add_node(node);
        self.connect(PinRef::signal(sig), PinRef::node(node, 0));
        sig
    }

    /// The scope's shared constant-1 net, created on first use.
    pub fn tie_hi(&mut self, scope: ScopeId) -> SignalId {
        if let Some(sig) = self.scopes[scope].tie_hi {
            return sig;
        }
        let sig = self.make_tie(scope, Logic::One, "_tie_hi");
        self.scopes[scope].tie_hi = Some(sig);
        sig
    }

    /// The scope's shared constant-0 net, created on first use.
    pub fn tie_lo(&mut self, scope: ScopeId) -> SignalId {
        if let Some(sig) = self.scopes[scope].tie_lo {
            return sig;
        }
        let sig = self.make_tie(scope, Logic::Zero, "_tie_lo");
        self.scopes[scope].tie_lo = Some(sig);
        sig
    }
}

impl Default for Design {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn const_node(design: &mut Design, scope: ScopeId, bits: &str) -> NodeId {
        let value = LogicVec::from_binary_str(bits).unwrap();
        let width = value.width();
        let name = design.intern("c");
        design.add_node(Node::new(
            scope,
            name,
            NodeKind::Const { value },
            vec![Link::output(width)],
            Span::DUMMY,
        ))
    }

    #[test]
    fn connect_is_transitive_and_symmetric() {
        let mut design = Design::new();
        let scope = design.new_root_scope("top");
        let a = design.new_signal(scope, "a", NetType::Wire, 0, 0);
        let b = design.new_signal(scope, "b", NetType::Wire, 0, 0);
        let c = design.new_signal(scope, "c", NetType::Wire, 0, 0);

        design.connect(PinRef::signal(a), PinRef::signal(b));
        design.connect(PinRef::signal(b), PinRef::signal(c));

        assert!(design.connected(PinRef::signal(a), PinRef::signal(c)));
        assert!(design.connected(PinRef::signal(c), PinRef::signal(a)));
        let nx = design.signal_nexus(a);
        assert_eq!(design.signal_nexus(b), nx);
        assert_eq!(design.signal_nexus(c), nx);
        assert_eq!(design.nexa.get(nx).members().len(), 3);
    }

    #[test]
    fn unlink_removes_from_class() {
        let mut design = Design::new();
        let scope = design.new_root_scope("top");
        let a = design.new_signal(scope, "a", NetType::Wire, 0, 0);
        let b = design.new_signal(scope, "b", NetType::Wire, 0, 0);
        design.connect(PinRef::signal(a), PinRef::signal(b));
        design.unlink(PinRef::signal(a));
        assert!(!design.connected(PinRef::signal(a), PinRef::signal(b)));
    }

    #[test]
    fn constant_drive_round_trip() {
        let mut design = Design::new();
        let scope = design.new_root_scope("top");
        let q = design.new_signal(scope, "q", NetType::Wire, 3, 0);
        let c = const_node(&mut design, scope, "1010");
        design.connect(PinRef::signal(q), PinRef::node(c, 0));

        let nx = design.signal_nexus(q);
        assert!(design.drivers_constant(nx));
        let v = design.driven_vector(nx).unwrap();
        assert_eq!(format!("{v}"), "1010");
    }

    #[test]
    fn second_constant_driver_disqualifies() {
        let mut design = Design::new();
        let scope = design.new_root_scope("top");
        let q = design.new_signal(scope, "q", NetType::Wire, 3, 0);
        let c1 = const_node(&mut design, scope, "1010");
        design.connect(PinRef::signal(q), PinRef::node(c1, 0));
        let nx = design.signal_nexus(q);
        assert!(design.drivers_constant(nx));

        let c2 = const_node(&mut design, scope, "0101");
        design.connect(PinRef::signal(q), PinRef::node(c2, 0));
        let nx = design.signal_nexus(q);
        assert!(!design.drivers_constant(nx));
        assert!(design.driven_vector(nx).is_none());
    }

    #[test]
    fn undriven_nexus_is_constant_z() {
        let mut design = Design::new();
        let scope = design.new_root_scope("top");
        let q = design.new_signal(scope, "q", NetType::Wire, 1, 0);
        let nx = design.signal_nexus(q);
        assert!(design.drivers_constant(nx));
        assert_eq!(design.driven_value(nx), Some(Logic::Z));
    }

    #[test]
    fn root_input_port_is_var() {
        let mut design = Design::new();
        let scope = design.new_root_scope("top");
        let a = design.new_signal(scope, "a", NetType::Wire, 0, 0);
        design.signals[a].port_type = PortType::Input;
        let nx = design.signal_nexus(a);
        assert!(!design.drivers_constant(nx));
    }

    #[test]
    fn lref_disqualifies_constant() {
        let mut design = Design::new();
        let scope = design.new_root_scope("top");
        let q = design.new_signal(scope, "q", NetType::Reg, 0, 0);
        design.signals[q].lref = 1;
        let c = const_node(&mut design, scope, "1");
        design.connect(PinRef::signal(q), PinRef::node(c, 0));
        let nx = design.signal_nexus(q);
        assert!(!design.drivers_constant(nx));
    }

    #[test]
    fn supply_rail_decides_value() {
        let mut design = Design::new();
        let scope = design.new_root_scope("top");
        let vcc = design.new_signal(scope, "vcc", NetType::Supply1, 0, 0);
        let a = design.new_signal(scope, "a", NetType::Wire, 0, 0);
        design.connect(PinRef::signal(vcc), PinRef::signal(a));
        let nx = design.signal_nexus(a);
        assert!(design.drivers_constant(nx));
        assert_eq!(design.driven_value(nx), Some(Logic::One));
    }

    #[test]
    fn mutation_invalidates_drive_cache() {
        let mut design = Design::new();
        let scope = design.new_root_scope("top");
        let q = design.new_signal(scope, "q", NetType::Wire, 0, 0);
        let nx = design.signal_nexus(q);
        assert_eq!(design.driven_value(nx), Some(Logic::Z));

        let c = const_node(&mut design, scope, "1");
        design.connect(PinRef::signal(q), PinRef::node(c, 0));
        let nx = design.signal_nexus(q);
        assert_eq!(design.driven_value(nx), Some(Logic::One));
    }

    #[test]
    fn driven_mask_covers_driver_width() {
        let mut design = Design::new();
        let scope = design.new_root_scope("top");
        let q = design.new_signal(scope, "q", NetType::Wire, 7, 0);
        let c = const_node(&mut design, scope, "1010");
        design.connect(PinRef::signal(q), PinRef::node(c, 0));
        let nx = design.signal_nexus(q);
        let mask = design.driven_mask(nx);
        assert_eq!(mask.len(), 8);
        assert!(mask[..4].iter().all(|b| *b));
        assert!(mask[4..].iter().all(|b| !*b));
    }

    #[test]
    fn del_node_unlinks_pins() {
        let mut design = Design::new();
        let scope = design.new_root_scope("top");
        let q = design.new_signal(scope, "q", NetType::Wire, 3, 0);
        let c = const_node(&mut design, scope, "1111");
        design.connect(PinRef::signal(q), PinRef::node(c, 0));
        design.del_node(c);
        let nx = design.signal_nexus(q);
        assert_eq!(design.nexa.get(nx).members().len(), 1);
        assert!(!design.nodes.contains(c));
    }

    #[test]
    fn tie_rails_are_singletons() {
        let mut design = Design::new();
        let scope = design.new_root_scope("top");
        let hi1 = design.tie_hi(scope);
        let hi2 = design.tie_hi(scope);
        let lo = design.tie_lo(scope);
        assert_eq!(hi1, hi2);
        assert_ne!(hi1, lo);
        let nx = design.signal_nexus(hi1);
        assert_eq!(design.driven_value(nx), Some(Logic::One));
        let nx = design.signal_nexus(lo);
        assert_eq!(design.driven_value(nx), Some(Logic::Zero));
    }

    #[test]
    fn nexus_name_prefers_non_local_signal() {
        let mut design = Design::new();
        let scope = design.new_root_scope("top");
        let tmp = design.local_signal(scope, 1);
        let q = design.new_signal(scope, "q", NetType::Wire, 0, 0);
        design.connect(PinRef::signal(tmp), PinRef::signal(q));
        let nx = design.signal_nexus(q);
        assert_eq!(design.nexus_name(nx), "top.q");
    }

    #[test]
    fn local_signal_is_temporary() {
        let mut design = Design::new();
        let scope = design.new_root_scope("top");
        let t0 = design.local_signal(scope, 4);
        let t1 = design.local_signal(scope, 1);
        assert!(design.signals[t0].local);
        assert_eq!(design.signals[t0].width(), 4);
        assert_ne!(design.signals[t0].name, design.signals[t1].name);
    }
}
