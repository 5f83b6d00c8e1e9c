//! Common result and error types for the Strand netlist core.

/// The standard result type for fallible internal operations.
///
/// `Ok` contains the result value (which may be partial or degraded after
/// error recovery). `Err` indicates an unrecoverable internal error (a bug
/// in Strand), not a user-facing error. User errors are reported through
/// `DiagnosticSink` and the operation still returns `Ok`.
pub type StrandResult<T> = Result<T, InternalError>;

/// An internal compiler error indicating a bug in Strand, not a user input
/// problem.
///
/// These errors should never occur during normal operation. If one does occur,
/// it means there is a logic error in the compiler that should be fixed.
#[derive(Debug, thiserror::Error)]
#[error("internal compiler error: {message}")]
pub struct InternalError {
    /// Description of the internal error.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_format() {
        let err = InternalError::new("nexus table corrupted");
        assert_eq!(
            format!("{err}"),
            "internal compiler error: nexus table corrupted"
        );
    }

    #[test]
    fn ok_path() {
        let r: StrandResult<u32> = Ok(7);
        assert_eq!(r.ok(), Some(7));
    }

    #[test]
    fn from_string() {
        let err: InternalError = "pin index out of range".to_string().into();
        assert_eq!(err.message, "pin index out of range");
    }
}
