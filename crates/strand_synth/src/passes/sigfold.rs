//! Folding of synthesized temporaries onto user signals.
//!
//! Every net the expression synthesizer builds gets a local temporary as
//! its handle. When the class later merges with a user-named signal the
//! temporary is pure noise: the user signal already names the class. This
//! pass drops such temporaries so the finished netlist reads in terms of
//! the user's names.

use strand_netlist::{Design, ObjRef};

/// Removes local temporaries that share a class with an equal-width
/// non-local signal, plus any locals left with no class at all. Returns
/// the number of signals removed.
pub fn sigfold(design: &mut Design) -> usize {
    let mut removed = 0usize;
    for sid in design.signals.ids() {
        if !design.signals.contains(sid) {
            continue;
        }
        let sig = &design.signals[sid];
        if !sig.local || sig.referenced() {
            continue;
        }
        let Some(nx) = sig.pin.nexus else {
            design.rem_signal(sid);
            removed += 1;
            continue;
        };
        let width = sig.width();
        let shadowed = design.nexa.get(nx).members().iter().any(|p| match p.obj {
            ObjRef::Signal(other) => {
                other != sid && !design.signals[other].local && design.signals[other].width() == width
            }
            ObjRef::Node(_) => false,
        });
        if shadowed {
            design.rem_signal(sid);
            removed += 1;
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use strand_netlist::{NetType, PinRef};

    #[test]
    fn shadowed_temporary_is_folded() {
        let mut design = Design::new();
        let scope = design.new_root_scope("top");
        let user = design.new_signal(scope, "user", NetType::Wire, 3, 0);
        let tmp = design.local_signal(scope, 4);
        design.connect(PinRef::signal(user), PinRef::signal(tmp));
        assert_eq!(sigfold(&mut design), 1);
        assert!(!design.signals.contains(tmp));
        assert!(design.signals.contains(user));
    }

    #[test]
    fn narrower_peer_does_not_shadow() {
        let mut design = Design::new();
        let scope = design.new_root_scope("top");
        let user = design.new_signal(scope, "user", NetType::Wire, 1, 0);
        let tmp = design.local_signal(scope, 4);
        design.connect(PinRef::signal(tmp), PinRef::signal(user));
        assert_eq!(sigfold(&mut design), 0);
        assert!(design.signals.contains(tmp));
    }

    #[test]
    fn tie_nets_survive() {
        let mut design = Design::new();
        let scope = design.new_root_scope("top");
        let lo = design.tie_lo(scope);
        // The tie class holds only the constant device and the local
        // handle; nothing shadows it.
        assert_eq!(sigfold(&mut design), 0);
        assert!(design.signals.contains(lo));
    }
}
