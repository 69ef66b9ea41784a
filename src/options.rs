//! Matching options.

use bitflags::bitflags;

bitflags! {
    /// Flags that alter how a pattern is compiled and matched.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Options: u8 {
        /// Fold case when comparing literal characters, literal runs,
        /// character-set members and backreferenced text.
        const CASE_INSENSITIVE = 1 << 0;
        /// Split the input on `\n` before matching; `^` and `$` then bind
        /// to line boundaries instead of the whole string.
        const MULTILINE = 1 << 1;
        /// Let `.` match `\n` as well.
        const DOT_MATCHES_LINE_SEPARATORS = 1 << 2;
    }
}

impl Options {
    pub fn is_case_insensitive(self) -> bool {
        self.contains(Options::CASE_INSENSITIVE)
    }

    pub fn is_multiline(self) -> bool {
        self.contains(Options::MULTILINE)
    }

    pub fn dot_matches_line_separators(self) -> bool {
        self.contains(Options::DOT_MATCHES_LINE_SEPARATORS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty() {
        let opts = Options::default();
        assert!(!opts.is_case_insensitive());
        assert!(!opts.is_multiline());
        assert!(!opts.dot_matches_line_separators());
    }

    #[test]
    fn test_flags_combine() {
        let opts = Options::CASE_INSENSITIVE | Options::MULTILINE;
        assert!(opts.is_case_insensitive());
        assert!(opts.is_multiline());
        assert!(!opts.dot_matches_line_separators());
    }
}
