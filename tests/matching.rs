//! End-to-end matching scenarios through the public API.

use regex_machine::{Options, Regex};

fn full_matches(pattern: &str, input: &str) -> Vec<String> {
    Regex::new(pattern)
        .unwrap()
        .matches(input)
        .iter()
        .map(|found| found.full_match().to_string())
        .collect()
}

#[test]
fn test_quantified_group_captures() {
    let regex = Regex::new("a(b+)c").unwrap();
    let matches = regex.matches("aabbbcdabc");
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].full_match(), "abbbc");
    assert_eq!(matches[0].group(1), Some("bbb"));
    assert_eq!(matches[1].full_match(), "abc");
    assert_eq!(matches[1].group(1), Some("b"));
}

#[test]
fn test_starred_alternation_keeps_last_iteration_capture() {
    let regex = Regex::new("(a|b)*").unwrap();
    let matches = regex.matches("abba");
    assert_eq!(matches[0].full_match(), "abba");
    assert_eq!(matches[0].group(1), Some("a"));
    // The empty-matching pattern also matches once at end of input.
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[1].full_match(), "");
}

#[test]
fn test_counted_digits() {
    assert_eq!(
        full_matches("\\d{2,4}", "1 12 123 1234 12345"),
        vec!["12", "123", "1234", "1234"]
    );
}

#[test]
fn test_multiline_start_anchor() {
    let regex = Regex::with_options("^foo", Options::MULTILINE).unwrap();
    let matches = regex.matches("foo\nbar\nfoobar");
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].range(), 0..3);
    assert_eq!(matches[1].range(), 8..11);
}

#[test]
fn test_backreference_pairs() {
    let regex = Regex::new("(cat|dog)\\1").unwrap();
    let matches = regex.matches("catcat dogdog catdog");
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].full_match(), "catcat");
    assert_eq!(matches[0].group(1), Some("cat"));
    assert_eq!(matches[1].full_match(), "dogdog");
    assert_eq!(matches[1].group(1), Some("dog"));
}

#[test]
fn test_dot_stops_at_newline_by_default() {
    assert!(full_matches("a.*b", "a\nxb").is_empty());
    let dotall = Regex::with_options("a.*b", Options::DOT_MATCHES_LINE_SEPARATORS).unwrap();
    assert!(dotall.is_match("a\nxb"));
}

#[test]
fn test_case_insensitive_matching() {
    let regex = Regex::with_options("he[l]lo", Options::CASE_INSENSITIVE).unwrap();
    assert!(regex.is_match("HeLLo there"));
    assert!(!regex.is_match("Hallo"));
}

#[test]
fn test_multiline_line_anchors_bind_per_line() {
    let regex = Regex::with_options("^\\w+$", Options::MULTILINE).unwrap();
    let matches = regex.matches("one\ntwo three\nfour");
    let texts: Vec<_> = matches.iter().map(|found| found.full_match()).collect();
    assert_eq!(texts, vec!["one", "four"]);
}

#[test]
fn test_previous_match_end_anchor_chains() {
    // \G re-anchors each match where the previous one ended.
    assert_eq!(full_matches("\\Ga", "aab"), vec!["a", "a"]);
    assert_eq!(full_matches("a", "aab"), vec!["a", "a"]);
}

#[test]
fn test_absolute_anchors() {
    assert_eq!(full_matches("\\Aab", "abab"), vec!["ab"]);
    assert_eq!(full_matches("ab\\z", "abab"), vec!["ab"]);
    assert!(full_matches("ab\\z", "ab\n").is_empty());
    assert_eq!(full_matches("ab\\Z", "ab\n"), vec!["ab"]);
}

#[test]
fn test_word_boundaries() {
    assert_eq!(full_matches("\\bcat\\b", "cat catalog bobcat cat"), {
        vec!["cat", "cat"]
    });
    assert_eq!(full_matches("\\Bcat", "bobcat cat"), vec!["cat"]);
}

#[test]
fn test_partially_anchored_alternation_still_scans() {
    // Only the first branch is anchored; the second must keep matching
    // at later offsets.
    let regex = Regex::new("^a|b").unwrap();
    assert!(regex.is_match("xb"));
    assert_eq!(full_matches("^a|b", "xb"), vec!["b"]);
    assert_eq!(full_matches("^a|b", "ab"), vec!["a", "b"]);

    // Same shape through the backtracking interpreter.
    let regex = Regex::new("^a|(b)\\1").unwrap();
    assert!(regex.is_match("xbb"));
    assert_eq!(regex.first_match("xbb").unwrap().full_match(), "bb");
}

#[test]
fn test_empty_pattern_is_a_compile_error() {
    let err = Regex::new("").unwrap_err();
    assert_eq!(err.message, "Pattern is empty");
    assert_eq!(err.offset, 0);
}

#[test]
fn test_empty_matches_once_per_position_plus_end() {
    assert_eq!(full_matches("a*", "bb"), vec!["", "", ""]);
    assert_eq!(full_matches("a*", "ba"), vec!["", "a", ""]);
}

#[test]
fn test_compile_errors_carry_offsets() {
    for (pattern, message, offset) in [
        ("a{3,1}", "Invalid quantifier range", 1),
        ("+a", "Nothing to repeat", 0),
        ("(a", "Unmatched parenthesis", 2),
        ("[ab", "Character group missing closing bracket", 0),
        ("(a)\\3", "Backreference to unknown group \\3", 3),
        ("a\\", "Pattern may not end with a trailing backslash", 1),
    ] {
        let err = Regex::new(pattern).unwrap_err();
        assert_eq!(err.message, message, "pattern {pattern:?}");
        assert_eq!(err.offset, offset, "pattern {pattern:?}");
    }
}

#[test]
fn test_non_capturing_groups_skip_indices() {
    let regex = Regex::new("(?:ab)+(c)").unwrap();
    let found = regex.first_match("ababc").unwrap();
    assert_eq!(found.full_match(), "ababc");
    assert_eq!(found.group(1), Some("c"));
    assert_eq!(found.group(2), None);
}

#[test]
fn test_nested_groups() {
    let regex = Regex::new("((\\d+)-)+x").unwrap();
    let found = regex.first_match("1-22-x").unwrap();
    assert_eq!(found.full_match(), "1-22-x");
    assert_eq!(found.group(1), Some("22-"));
    assert_eq!(found.group(2), Some("22"));
}

#[test]
fn test_unicode_input() {
    let regex = Regex::new("ñ+").unwrap();
    let found = regex.first_match("añññb").unwrap();
    assert_eq!(found.full_match(), "ñññ");

    let any = Regex::new("a.c").unwrap();
    assert!(any.is_match("añc"));
}

#[test]
fn test_early_termination_via_callback() {
    let regex = Regex::new("\\d").unwrap();
    let mut seen = Vec::new();
    regex.for_each_match("1 2 3 4", |found| {
        seen.push(found.full_match().to_string());
        seen.len() < 3
    });
    assert_eq!(seen, vec!["1", "2", "3"]);
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Every captured group is a contiguous subrange of the full match.
        #[test]
        fn prop_groups_lie_within_full_match(input in "[ab ]{0,24}") {
            let regex = Regex::new("(a+)(b+)?").unwrap();
            for found in regex.matches(&input) {
                let full = found.range();
                for index in 1..=2 {
                    if let Some(range) = found.group_range(index) {
                        prop_assert!(range.start >= full.start);
                        prop_assert!(range.end <= full.end);
                    }
                }
            }
        }

        /// Matches arrive in order and the matcher always makes progress.
        #[test]
        fn prop_matches_are_ordered(input in "[abc]{0,24}") {
            let regex = Regex::new("ab?").unwrap();
            let matches = regex.matches(&input);
            for pair in matches.windows(2) {
                prop_assert!(pair[1].range().start >= pair[0].range().end);
                prop_assert!(pair[1].range().start > pair[0].range().start);
            }
        }

        /// A pattern of literal characters always matches itself.
        #[test]
        fn prop_literal_self_match(text in "[a-z]{1,12}") {
            let regex = Regex::new(&text).unwrap();
            let found = regex.first_match(&text).unwrap();
            prop_assert_eq!(found.full_match(), text.as_str());
        }
    }
}
