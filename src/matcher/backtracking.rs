//! Recursive backtracking interpreter.
//!
//! Used whenever the compiled pattern is not regular: backreferences
//! need the capture state of the single path being explored, which the
//! parallel simulation does not keep. One state is visited at a time with
//! a cheap cursor copy per branch; transitions are tried in compile order
//! and the first successful descendant wins, which gives leftmost-first
//! semantics with greedy quantifiers (the compiler emits loop edges
//! first). Failure is an ordinary `None`, never an error.

use std::collections::HashSet;

use super::{update_capture_groups, MatchRecord};
use crate::compile::CompiledRegex;
use crate::cursor::Cursor;
use crate::fsm::StateId;

/// Find the leftmost match from the cursor's start position, trying each
/// later origin in turn unless the pattern is anchored to the slice start.
pub(crate) fn first_match(regex: &CompiledRegex, cursor: Cursor<'_>) -> Option<MatchRecord> {
    let slice = cursor.slice();
    let mut origin = cursor.start_index();
    loop {
        let mut attempt = cursor.clone();
        attempt.start_at(origin);
        let mut visited = HashSet::new();
        if let Some(found) = try_match(regex, regex.fragment.start, attempt, &mut visited) {
            return Some(MatchRecord::from_cursor(&found));
        }
        if regex.is_from_start_of_string || origin >= slice.end {
            return None;
        }
        origin = match cursor.input()[origin..slice.end].chars().next() {
            Some(c) => origin + c.len_utf8(),
            None => return None,
        };
    }
}

/// Visit `state` with a private cursor. Returns the cursor at the match
/// end on success. `visited` holds the (state, position) pairs of the
/// current path so ε-cycles from quantifiers terminate.
fn try_match<'t>(
    regex: &CompiledRegex,
    state: StateId,
    mut cursor: Cursor<'t>,
    visited: &mut HashSet<(StateId, usize)>,
) -> Option<Cursor<'t>> {
    if !visited.insert((state, cursor.index())) {
        return None;
    }
    update_capture_groups(regex, state, &mut cursor);

    if regex.state(state).is_end {
        return Some(cursor);
    }

    for transition in &regex.state(state).transitions {
        let consumed = match transition.condition.evaluate(&cursor, regex.options) {
            Some(consumed) => consumed,
            None => continue,
        };
        log::trace!(
            "state {} takes {} consuming {} bytes",
            regex.symbols.description(state),
            transition.condition,
            consumed.bytes()
        );
        let mut next = cursor.clone();
        next.advance_to(cursor.index() + consumed.bytes());
        if let Some(found) = try_match(regex, transition.end, next, visited) {
            return Some(found);
        }
    }

    visited.remove(&(state, cursor.index()));
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::compile;
    use crate::options::Options;

    fn find(pattern: &str, input: &str) -> Option<MatchRecord> {
        let regex = compile(pattern, Options::default()).unwrap();
        first_match(&regex, Cursor::new(input, 0..input.len()))
    }

    fn find_str(pattern: &str, input: &str) -> Option<String> {
        find(pattern, input).map(|record| input[record.range].to_string())
    }

    #[test]
    fn test_backreference_match() {
        assert_eq!(find_str("(cat|dog)\\1", "catcat"), Some("catcat".into()));
        assert_eq!(find_str("(cat|dog)\\1", "catdog"), None);
    }

    #[test]
    fn test_backreference_repeated_group() {
        // The backreference sees the last completed iteration.
        assert_eq!(find_str("(a|b)+\\1", "abb"), Some("abb".into()));
    }

    #[test]
    fn test_backreference_groups_recorded() {
        let record = find("(\\w+) \\1", "say dog dog").unwrap();
        assert_eq!(record.range, 4..11);
        assert_eq!(record.groups[&1], 4..7);
    }

    #[test]
    fn test_uncaptured_backreference_fails() {
        // Group 2 never participates, so \2 cannot match.
        assert_eq!(find_str("(a)(x)?\\2b", "ab"), None);
    }

    #[test]
    fn test_greedy_then_backtrack() {
        // The greedy loop overshoots and must give characters back.
        assert_eq!(find_str("(a+)a", "aaa"), Some("aaa".into()));
    }

    #[test]
    fn test_epsilon_cycle_terminates() {
        // A quantified empty-matching group loops through ε-states only.
        assert_eq!(find_str("(a*)*b", "b"), Some("b".into()));
        assert_eq!(find_str("(a*)*c", "aab"), None);
    }

    #[test]
    fn test_anchored_attempts_only_origin() {
        let regex = compile("^(a)\\1", Options::default()).unwrap();
        let input = "baa";
        assert!(first_match(&regex, Cursor::new(input, 0..input.len())).is_none());
    }

    #[test]
    fn test_case_insensitive_backreference() {
        let regex = compile("(ab)\\1", Options::CASE_INSENSITIVE).unwrap();
        let input = "abAB";
        let record = first_match(&regex, Cursor::new(input, 0..input.len())).unwrap();
        assert_eq!(record.range, 0..4);
    }
}
