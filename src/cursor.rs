//! Position handle used by the matchers.
//!
//! A cursor is a cheap-to-copy value: the position fields are plain
//! integers and the capture scratch lives behind a reference-counted
//! interior. Mutating the scratch of one cursor never affects a cursor it
//! was cloned from: the first write through a shared interior performs a
//! one-shot deep copy (`Rc::make_mut` uniqueness check).

use std::collections::HashMap;
use std::ops::Range;
use std::rc::Rc;

use crate::fsm::StateId;

/// A position inside the input plus per-attempt capture scratch.
#[derive(Debug, Clone)]
pub struct Cursor<'t> {
    /// The complete input string; absolute anchors and `\G` consult this.
    input: &'t str,
    /// Byte bounds of the slice being matched (a line under MULTILINE,
    /// otherwise the whole input).
    slice: Range<usize>,
    /// Byte offset where the current match attempt started.
    start_index: usize,
    /// Current byte offset.
    index: usize,
    /// End of the most recent successful match, if any.
    previous_match_index: Option<usize>,
    shared: Rc<Scratch>,
}

#[derive(Debug, Clone, Default)]
struct Scratch {
    /// Fully captured groups: capture index → byte range.
    groups: HashMap<usize, Range<usize>>,
    /// Positions at which group-start states were entered.
    group_start_indexes: HashMap<StateId, usize>,
}

impl<'t> Cursor<'t> {
    pub fn new(input: &'t str, slice: Range<usize>) -> Self {
        Cursor {
            input,
            start_index: slice.start,
            index: slice.start,
            slice,
            previous_match_index: None,
            shared: Rc::new(Scratch::default()),
        }
    }

    // ----- position -----

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn start_index(&self) -> usize {
        self.start_index
    }

    pub fn slice(&self) -> Range<usize> {
        self.slice.clone()
    }

    pub fn input(&self) -> &'t str {
        self.input
    }

    /// Begin a fresh attempt at `index`.
    pub fn start_at(&mut self, index: usize) {
        self.start_index = index;
        self.index = index;
    }

    pub fn advance_to(&mut self, index: usize) {
        debug_assert!(index >= self.index);
        self.index = index;
    }

    /// Advance over `count` characters (stops at the slice end).
    pub fn advance_by(&mut self, count: usize) {
        for _ in 0..count {
            match self.character() {
                Some(c) => self.index += c.len_utf8(),
                None => break,
            }
        }
    }

    /// Byte offset one character past `index`, clamped to the slice end.
    pub fn index_after(&self, index: usize) -> usize {
        match self.input[index..self.slice.end].chars().next() {
            Some(c) => index + c.len_utf8(),
            None => self.slice.end,
        }
    }

    // ----- characters -----

    /// The character at the current position, within the slice.
    pub fn character(&self) -> Option<char> {
        if self.index >= self.slice.end {
            return None;
        }
        self.input[self.index..self.slice.end].chars().next()
    }

    /// The character `offset` characters away from the current position;
    /// negative offsets walk backwards. Stays within the slice.
    pub fn character_offset_by(&self, offset: isize) -> Option<char> {
        if offset >= 0 {
            self.input[self.index..self.slice.end]
                .chars()
                .nth(offset as usize)
        } else {
            self.input[self.slice.start..self.index]
                .chars()
                .rev()
                .nth((-offset - 1) as usize)
        }
    }

    /// The rest of the slice from the current position.
    pub fn remaining(&self) -> &'t str {
        &self.input[self.index..self.slice.end]
    }

    /// No characters left in the slice.
    pub fn is_empty(&self) -> bool {
        self.index >= self.slice.end
    }

    /// Positioned on the last character of the slice.
    pub fn is_at_last_index(&self) -> bool {
        !self.is_empty() && self.index_after(self.index) >= self.slice.end
    }

    /// At the absolute start of the complete input.
    pub fn is_at_input_start(&self) -> bool {
        self.index == 0
    }

    /// At the absolute end of the complete input.
    pub fn is_at_input_end(&self) -> bool {
        self.index == self.input.len()
    }

    // ----- scratch -----

    pub fn groups(&self) -> &HashMap<usize, Range<usize>> {
        &self.shared.groups
    }

    pub fn set_group(&mut self, index: usize, range: Range<usize>) {
        Rc::make_mut(&mut self.shared).groups.insert(index, range);
    }

    pub fn group_start_index(&self, state: StateId) -> Option<usize> {
        self.shared.group_start_indexes.get(&state).copied()
    }

    pub fn set_group_start_index(&mut self, state: StateId, index: usize) {
        Rc::make_mut(&mut self.shared)
            .group_start_indexes
            .insert(state, index);
    }

    pub fn remove_group_start_index(&mut self, state: StateId) {
        Rc::make_mut(&mut self.shared)
            .group_start_indexes
            .remove(&state);
    }

    pub fn previous_match_index(&self) -> Option<usize> {
        self.previous_match_index
    }

    pub fn set_previous_match_index(&mut self, index: usize) {
        self.previous_match_index = Some(index);
    }

    /// Drop capture scratch that predates `start`; used when a match
    /// attempt restarts at a later origin.
    pub fn purge_before(&mut self, start: usize) {
        let scratch = Rc::make_mut(&mut self.shared);
        scratch.groups.retain(|_, range| range.start >= start);
        scratch.group_start_indexes.retain(|_, &mut at| at >= start);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_on_write_isolation() {
        let input = "abc";
        let mut a = Cursor::new(input, 0..input.len());
        a.set_group(1, 0..1);
        let mut b = a.clone();
        b.set_group(1, 0..2);
        assert_eq!(a.groups()[&1], 0..1);
        assert_eq!(b.groups()[&1], 0..2);
    }

    #[test]
    fn test_character_and_advance() {
        let input = "añc";
        let mut cursor = Cursor::new(input, 0..input.len());
        assert_eq!(cursor.character(), Some('a'));
        cursor.advance_by(1);
        assert_eq!(cursor.character(), Some('ñ'));
        cursor.advance_by(1);
        assert_eq!(cursor.character(), Some('c'));
        assert!(cursor.is_at_last_index());
        cursor.advance_by(1);
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_character_offset_by() {
        let input = "abcd";
        let mut cursor = Cursor::new(input, 0..input.len());
        cursor.advance_by(2);
        assert_eq!(cursor.character_offset_by(-1), Some('b'));
        assert_eq!(cursor.character_offset_by(0), Some('c'));
        assert_eq!(cursor.character_offset_by(1), Some('d'));
        assert_eq!(cursor.character_offset_by(-3), None);
    }

    #[test]
    fn test_slice_bounds_limit_characters() {
        let input = "ab\ncd";
        let cursor = Cursor::new(input, 3..5);
        assert_eq!(cursor.character(), Some('c'));
        assert!(!cursor.is_at_input_start());
    }

    #[test]
    fn test_purge_before() {
        let input = "abcdef";
        let mut cursor = Cursor::new(input, 0..input.len());
        cursor.set_group(1, 0..2);
        cursor.set_group(2, 3..4);
        cursor.set_group_start_index(7, 1);
        cursor.set_group_start_index(9, 4);
        cursor.purge_before(3);
        assert!(!cursor.groups().contains_key(&1));
        assert_eq!(cursor.groups()[&2], 3..4);
        assert_eq!(cursor.group_start_index(7), None);
        assert_eq!(cursor.group_start_index(9), Some(4));
    }
}
