//! BUFZ elision.
//!
//! Synthesis and elaboration insert `Bufz` devices wherever a value has
//! to cross a net boundary without changing it. Once strength resolution
//! is out of the picture the buffer is an identity and its two sides can
//! be shorted together.

use strand_netlist::{Design, GateOp, NodeKind, PinRef};

/// Splices out every `Bufz` device by connecting its input class to its
/// output class. Returns the number of devices removed.
pub fn nobufz(design: &mut Design) -> usize {
    let mut removed = 0usize;
    for id in design.nodes.ids() {
        if !design.nodes.contains(id) {
            continue;
        }
        if !matches!(
            design.nodes[id].kind,
            NodeKind::Gate {
                op: GateOp::Bufz,
                ..
            }
        ) {
            continue;
        }
        design.connect(PinRef::node(id, 1), PinRef::node(id, 0));
        design.del_node(id);
        removed += 1;
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use strand_netlist::{Link, NetType, Node};
    use strand_source::Span;

    #[test]
    fn bufz_is_spliced_out() {
        let mut design = Design::new();
        let scope = design.new_root_scope("top");
        let a = design.new_signal(scope, "a", NetType::Wire, 3, 0);
        let b = design.new_signal(scope, "b", NetType::Wire, 3, 0);
        let name = design.intern("bz");
        let node = design.add_node(Node::new(
            scope,
            name,
            NodeKind::Gate {
                op: GateOp::Bufz,
                width: 4,
            },
            vec![Link::output(4), Link::input(4)],
            Span::DUMMY,
        ));
        design.connect(PinRef::signal(b), PinRef::node(node, 0));
        design.connect(PinRef::signal(a), PinRef::node(node, 1));
        assert!(!design.connected(PinRef::signal(a), PinRef::signal(b)));

        assert_eq!(nobufz(&mut design), 1);
        assert!(!design.nodes.contains(node));
        // The two sides are now one class.
        assert!(design.connected(PinRef::signal(a), PinRef::signal(b)));
    }

    #[test]
    fn ordinary_buffers_are_kept() {
        let mut design = Design::new();
        let scope = design.new_root_scope("top");
        let name = design.intern("b");
        let node = design.add_node(Node::new(
            scope,
            name,
            NodeKind::Gate {
                op: GateOp::Buf,
                width: 1,
            },
            vec![Link::output(1), Link::input(1)],
            Span::DUMMY,
        ));
        assert_eq!(nobufz(&mut design), 0);
        assert!(design.nodes.contains(node));
    }
}
