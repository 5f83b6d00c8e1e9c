//! Statement synthesis: behavioral processes to structural devices.
//!
//! The entry point is [`synthesize`], which classifies every process in a
//! design as combinational or edge-triggered, rewrites it into gates,
//! muxes, latches, and flip-flops, and then runs the cleanup passes over
//! the result. Processes that synthesize successfully are deleted from
//! the design; anything unsynthesizable is reported through the
//! diagnostic sink and left in place.

#![warn(missing_docs)]

mod async_synth;
mod bus;
mod engine;
mod expr;
mod sync_synth;

pub mod passes;

pub use passes::{nodangle, nobufz, sigfold};

use engine::Synth;
use strand_diagnostics::code::codes;
use strand_diagnostics::{Diagnostic, DiagnosticSink};
use strand_netlist::sensitivity::{process_is_asynchronous, process_is_synchronous};
use strand_netlist::{Design, Edge, ProcessKind, Stmt};

enum Action {
    Skip,
    NotHardware,
    Async,
    Sync,
    Incomplete,
    NotCombinational,
    Unsupported,
}

/// Synthesizes every process in the design and runs the cleanup passes.
///
/// Returns `true` when no errors were reported; warnings and unsupported
/// constructs do not fail the run.
pub fn synthesize(design: &mut Design, sink: &DiagnosticSink) -> bool {
    let off_key = design.intern("synthesis_off");
    let comb_key = design.intern("combinational");
    for pid in design.processes.ids() {
        let (action, span) = {
            let proc = &design.processes[pid];
            let action = if proc.attributes.contains_key(&off_key) {
                Action::Skip
            } else {
                match proc.kind {
                    ProcessKind::Initial | ProcessKind::Final => Action::NotHardware,
                    _ => {
                        if process_is_asynchronous(design, proc) {
                            Action::Async
                        } else if proc.attributes.contains_key(&comb_key) {
                            Action::NotCombinational
                        } else if process_is_synchronous(design, proc) {
                            Action::Sync
                        } else if matches!(
                            &proc.stmt,
                            Stmt::EvWait { events, .. }
                                if events.iter().all(|p| p.edge == Edge::Any)
                        ) {
                            Action::Incomplete
                        } else {
                            Action::Unsupported
                        }
                    }
                }
            };
            (action, proc.span)
        };
        match action {
            Action::Skip => {}
            Action::NotHardware => {
                sink.emit(Diagnostic::note(
                    codes::SORRY,
                    "initial/final processes are not synthesized",
                    span,
                ));
            }
            Action::Async => {
                let done = Synth::new(design, sink).synth_async_top(pid);
                if done {
                    design.delete_process(pid);
                }
            }
            Action::Sync => {
                let done = Synth::new(design, sink).synth_sync_top(pid);
                if done {
                    design.delete_process(pid);
                }
            }
            Action::Incomplete => {
                sink.emit(Diagnostic::error(
                    codes::INCOMPLETE_SENSITIVITY,
                    "sensitivity list does not cover every signal the body reads",
                    span,
                ));
            }
            Action::NotCombinational => {
                sink.emit(Diagnostic::error(
                    codes::CANNOT_SYNTHESIZE,
                    "process is marked combinational but does not synthesize as such",
                    span,
                ));
            }
            Action::Unsupported => {
                sink.sorry("process form is not synthesizable", span);
            }
        }
    }
    nodangle(design, sink);
    nobufz(design);
    sigfold(design);
    !sink.has_errors()
}
