//! Diagnostic rendering for terminal output.

use crate::diagnostic::Diagnostic;
use strand_source::SourceDb;

/// Trait for rendering diagnostics into formatted output strings.
pub trait DiagnosticRenderer {
    /// Renders a single diagnostic into a formatted string.
    fn render(&self, diag: &Diagnostic, source_db: &SourceDb) -> String;
}

/// Renders diagnostics in the classic compiler one-line format:
///
/// ```text
/// counter.v:14: error[E102]: too many clocks in process
///   note: fork/join blocks cannot be synthesized
/// ```
///
/// Diagnostics with dummy spans omit the location prefix.
pub struct TerminalRenderer;

impl TerminalRenderer {
    /// Creates a new terminal renderer.
    pub fn new() -> Self {
        Self
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic, source_db: &SourceDb) -> String {
        let mut out = String::new();

        if diag.primary_span.is_dummy() {
            out.push_str(&format!(
                "{}[{}]: {}\n",
                diag.severity, diag.code, diag.message
            ));
        } else {
            let resolved = source_db.resolve_span(diag.primary_span);
            out.push_str(&format!(
                "{}:{}: {}[{}]: {}\n",
                resolved.file_path.display(),
                resolved.start_line,
                diag.severity,
                diag.code,
                diag.message
            ));
        }

        for note in &diag.notes {
            out.push_str(&format!("  note: {note}\n"));
        }

        out
    }
}
