//! Compile-time error reporting.
//!
//! Matching itself never fails: absence of a match is an ordinary `None`.
//! Everything that can go wrong goes wrong while turning a pattern string
//! into a state machine, and is reported as a [`CompileError`] carrying a
//! human-readable message and the 0-based character offset into the pattern
//! where the fault was detected.

/// An error produced while parsing or compiling a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    /// What went wrong.
    pub message: String,
    /// 0-based character offset into the pattern.
    pub offset: usize,
}

impl CompileError {
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        CompileError {
            message: message.into(),
            offset,
        }
    }
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (at index {})", self.message, self.offset)
    }
}

impl std::error::Error for CompileError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_offset() {
        let err = CompileError::new("Unmatched parenthesis", 4);
        assert_eq!(err.to_string(), "Unmatched parenthesis (at index 4)");
    }
}
