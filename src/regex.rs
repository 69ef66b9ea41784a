//! Public façade: compiled patterns and match records.

use std::collections::HashMap;
use std::ops::Range;

use crate::compile::{compile, CompiledRegex};
use crate::error::CompileError;
use crate::matcher;
use crate::options::Options;

/// A compiled regular expression.
///
/// Compilation validates the pattern; matching never fails. A `Regex` is
/// immutable after construction and can be shared freely across threads
/// for read-only matching.
#[derive(Debug)]
pub struct Regex {
    compiled: CompiledRegex,
}

impl Regex {
    /// Compile `pattern` with default options.
    pub fn new(pattern: &str) -> Result<Self, CompileError> {
        Self::with_options(pattern, Options::default())
    }

    /// Compile `pattern` with the given options.
    pub fn with_options(pattern: &str, options: Options) -> Result<Self, CompileError> {
        Ok(Regex {
            compiled: compile(pattern, options)?,
        })
    }

    pub fn options(&self) -> Options {
        self.compiled.options
    }

    /// Invoke `callback` once per match, left to right. Return `false`
    /// from the callback to stop early.
    pub fn for_each_match<'t>(
        &self,
        input: &'t str,
        mut callback: impl FnMut(&Match<'t>) -> bool,
    ) {
        matcher::for_each_match(&self.compiled, input, |record| {
            let found = Match {
                input,
                range: record.range,
                groups: record.groups,
            };
            callback(&found)
        });
    }

    /// All matches in `input`.
    pub fn matches<'t>(&self, input: &'t str) -> Vec<Match<'t>> {
        let mut out = Vec::new();
        matcher::for_each_match(&self.compiled, input, |record| {
            out.push(Match {
                input,
                range: record.range,
                groups: record.groups,
            });
            true
        });
        out
    }

    /// The first match, if any.
    pub fn first_match<'t>(&self, input: &'t str) -> Option<Match<'t>> {
        let mut found = None;
        matcher::for_each_match(&self.compiled, input, |record| {
            found = Some(Match {
                input,
                range: record.range,
                groups: record.groups,
            });
            false
        });
        found
    }

    /// Whether `input` contains a match.
    pub fn is_match(&self, input: &str) -> bool {
        self.first_match(input).is_some()
    }

    /// The substrings between matches.
    pub fn split<'t>(&self, input: &'t str) -> Vec<&'t str> {
        let mut out = Vec::new();
        let mut last = 0;
        matcher::for_each_match(&self.compiled, input, |record| {
            out.push(&input[last..record.range.start]);
            last = record.range.end;
            true
        });
        out.push(&input[last..]);
        out
    }

    /// Replace every match with `replacement`, literally.
    pub fn replace(&self, input: &str, replacement: &str) -> String {
        let mut out = String::with_capacity(input.len());
        let mut last = 0;
        matcher::for_each_match(&self.compiled, input, |record| {
            out.push_str(&input[last..record.range.start]);
            out.push_str(replacement);
            last = record.range.end;
            true
        });
        out.push_str(&input[last..]);
        out
    }
}

/// One match: the matched slice, its position, and captured groups.
#[derive(Debug, Clone, PartialEq)]
pub struct Match<'t> {
    input: &'t str,
    range: Range<usize>,
    groups: HashMap<usize, Range<usize>>,
}

impl<'t> Match<'t> {
    /// The full matched text.
    pub fn full_match(&self) -> &'t str {
        &self.input[self.range.clone()]
    }

    /// Byte range of the full match in the input.
    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    /// Byte offset just past the match.
    pub fn end_index(&self) -> usize {
        self.range.end
    }

    /// Captured text of group `index`; 0 is the full match. Groups that
    /// did not participate return `None`.
    pub fn group(&self, index: usize) -> Option<&'t str> {
        self.group_range(index).map(|range| &self.input[range])
    }

    /// Byte range of group `index`; 0 is the full match.
    pub fn group_range(&self, index: usize) -> Option<Range<usize>> {
        if index == 0 {
            return Some(self.range.clone());
        }
        self.groups.get(&index).cloned()
    }

    /// All participating groups, 0 included. Missing groups are absent
    /// from the mapping rather than present-but-empty.
    pub fn groups(&self) -> HashMap<usize, &'t str> {
        let mut out: HashMap<usize, &'t str> = self
            .groups
            .iter()
            .map(|(&index, range)| (index, &self.input[range.clone()]))
            .collect();
        out.insert(0, self.full_match());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_match_and_is_match() {
        let regex = Regex::new("b+").unwrap();
        let found = regex.first_match("abbba").unwrap();
        assert_eq!(found.full_match(), "bbb");
        assert_eq!(found.range(), 1..4);
        assert_eq!(found.end_index(), 4);
        assert!(regex.is_match("ab"));
        assert!(!regex.is_match("ac"));
    }

    #[test]
    fn test_groups_surface() {
        let regex = Regex::new("(\\d+)-(\\d+)?").unwrap();
        let found = regex.first_match("12-").unwrap();
        assert_eq!(found.group(0), Some("12-"));
        assert_eq!(found.group(1), Some("12"));
        assert_eq!(found.group(2), None);
        let groups = found.groups();
        assert_eq!(groups[&0], "12-");
        assert_eq!(groups[&1], "12");
        assert!(!groups.contains_key(&2));
    }

    #[test]
    fn test_split() {
        let regex = Regex::new(",\\s*").unwrap();
        assert_eq!(regex.split("a, b,c"), vec!["a", "b", "c"]);
        assert_eq!(regex.split("abc"), vec!["abc"]);
    }

    #[test]
    fn test_replace() {
        let regex = Regex::new("\\d+").unwrap();
        assert_eq!(regex.replace("a1b22c", "#"), "a#b#c");
    }

    #[test]
    fn test_compile_error_surface() {
        let err = Regex::new("(a").unwrap_err();
        assert_eq!(err.message, "Unmatched parenthesis");
    }
}
