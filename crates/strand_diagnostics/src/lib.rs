//! Diagnostic creation, severity management, and rendering.
//!
//! This crate provides structured [`Diagnostic`] messages with severity
//! levels, error codes, and notes. The thread-safe [`DiagnosticSink`]
//! accumulates diagnostics during synthesis; passes report problems into the
//! sink and keep going, so one run surfaces as many independent problems as
//! possible. The caller checks [`DiagnosticSink::error_count`] afterwards to
//! decide whether the design is still usable.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use renderer::{DiagnosticRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
