//! Removal of dangling signals.
//!
//! Synthesis leaves behind local temporaries whose classes collapsed to
//! nothing, and user code sometimes reads wires nothing drives. This pass
//! deletes the former and warns about the latter. Deletion runs to a
//! fixpoint: removing one signal can empty the class of another.

use std::collections::HashSet;

use strand_diagnostics::code::codes;
use strand_diagnostics::{Diagnostic, DiagnosticSink};
use strand_netlist::{Design, NetType, PortType, SignalId};
use strand_source::Span;

/// Deletes unconnected local temporaries and warns once per undriven,
/// read, non-port signal. Returns the number of signals removed.
pub fn nodangle(design: &mut Design, sink: &DiagnosticSink) -> usize {
    let cell_key = design.intern("synthesis_cell");
    let mut tested: HashSet<SignalId> = HashSet::new();
    let mut removed = 0usize;
    loop {
        let mut changed = false;
        for sid in design.signals.ids() {
            if !design.signals.contains(sid) {
                continue;
            }
            let sig = &design.signals[sid];
            // Library cells keep their internals no matter what.
            if design.scopes[sig.scope].attribute(cell_key).is_some() {
                continue;
            }
            let self_drives = matches!(
                sig.net_type,
                NetType::Supply0 | NetType::Supply1 | NetType::Tri0 | NetType::Tri1
            );
            let members = sig
                .pin
                .nexus
                .map_or(0, |nx| design.nexa.get(nx).members().len());
            let driven = match sig.pin.nexus {
                Some(nx) => design
                    .nexa
                    .get(nx)
                    .members()
                    .iter()
                    .any(|p| design.link(*p).is_driver()),
                None => false,
            };

            if !sig.local
                && sig.port_type == PortType::NotAPort
                && sig.eref > 0
                && !driven
                && !self_drives
                && !tested.contains(&sid)
            {
                tested.insert(sid);
                let name = format!(
                    "{}.{}",
                    design.scope_path(sig.scope),
                    design.interner.resolve(sig.name)
                );
                sink.emit(Diagnostic::warning(
                    codes::DANGLING_SIGNAL,
                    format!("signal '{name}' is read but never driven"),
                    sig.span,
                ));
            }

            if sig.local && !sig.referenced() && members <= 1 {
                design.rem_signal(sid);
                removed += 1;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    if removed > 0 {
        sink.emit(Diagnostic::note(
            codes::DANGLING_SIGNAL,
            format!("removed {removed} dangling local signals"),
            Span::DUMMY,
        ));
    }
    removed
}
