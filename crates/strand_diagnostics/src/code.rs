//! Diagnostic codes with category prefixes for structured error identification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The category of a diagnostic code, determining its prefix letter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// Error diagnostics, prefixed with `E`.
    Error,
    /// Warning diagnostics, prefixed with `W`.
    Warning,
    /// Unsupported-construct diagnostics ("sorry"), prefixed with `S`. These
    /// mark constructs the synthesizer recognizes but cannot yet translate.
    Unsupported,
}

impl Category {
    /// Returns the single-character prefix for this category.
    pub fn prefix(self) -> char {
        match self {
            Category::Error => 'E',
            Category::Warning => 'W',
            Category::Unsupported => 'S',
        }
    }
}

/// A structured diagnostic code combining a category prefix and a numeric
/// identifier.
///
/// Displayed as the category prefix followed by a zero-padded 3-digit number,
/// e.g., `E101`, `W203`, `S005`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// The category of this diagnostic.
    pub category: Category,
    /// The numeric identifier within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// Creates a new diagnostic code.
    pub const fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}

/// Diagnostic codes emitted by the synthesis engine.
pub mod codes {
    use super::{Category, DiagnosticCode};

    /// An asynchronous process reads signals outside its sensitivity list.
    pub const INCOMPLETE_SENSITIVITY: DiagnosticCode =
        DiagnosticCode::new(Category::Error, 101);
    /// A synchronous process waits on more than one clock edge.
    pub const TOO_MANY_CLOCKS: DiagnosticCode = DiagnosticCode::new(Category::Error, 102);
    /// An asynchronous set/clear path assigns a non-constant value.
    pub const NONCONST_ASYNC_VALUE: DiagnosticCode = DiagnosticCode::new(Category::Error, 103);
    /// A statement assigns only some bits of a flip-flop output.
    pub const PARTIAL_FF_ASSIGN: DiagnosticCode = DiagnosticCode::new(Category::Error, 104);
    /// A case guard is not a compile-time constant.
    pub const NONCONST_CASE_GUARD: DiagnosticCode = DiagnosticCode::new(Category::Error, 105);
    /// A bitwise operator was applied to a real-valued operand.
    pub const REAL_OPERAND: DiagnosticCode = DiagnosticCode::new(Category::Error, 106);
    /// General statement synthesis failure.
    pub const CANNOT_SYNTHESIZE: DiagnosticCode = DiagnosticCode::new(Category::Error, 110);

    /// A combinational process infers a latch.
    pub const INFERRED_LATCH: DiagnosticCode = DiagnosticCode::new(Category::Warning, 201);
    /// A signal is driven but never read.
    pub const DANGLING_SIGNAL: DiagnosticCode = DiagnosticCode::new(Category::Warning, 202);
    /// A case statement lists the same guard value more than once.
    pub const DUPLICATE_CASE_VALUE: DiagnosticCode = DiagnosticCode::new(Category::Warning, 203);
    /// A case guard value can never match the selector.
    pub const UNREACHABLE_CASE_VALUE: DiagnosticCode = DiagnosticCode::new(Category::Warning, 204);

    /// A construct the synthesizer recognizes but cannot yet translate.
    pub const SORRY: DiagnosticCode = DiagnosticCode::new(Category::Unsupported, 1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_prefixes() {
        assert_eq!(Category::Error.prefix(), 'E');
        assert_eq!(Category::Warning.prefix(), 'W');
        assert_eq!(Category::Unsupported.prefix(), 'S');
    }

    #[test]
    fn display_format() {
        assert_eq!(format!("{}", codes::TOO_MANY_CLOCKS), "E102");
        assert_eq!(format!("{}", codes::INFERRED_LATCH), "W201");
        assert_eq!(format!("{}", codes::SORRY), "S001");
    }

    #[test]
    fn serde_roundtrip() {
        let code = DiagnosticCode::new(Category::Error, 101);
        let json = serde_json::to_string(&code).unwrap();
        let back: DiagnosticCode = serde_json::from_str(&json).unwrap();
        assert_eq!(code, back);
    }
}
