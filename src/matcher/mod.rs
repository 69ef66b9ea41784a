//! Match drivers.
//!
//! The top-level driver preprocesses the input (one slice per line under
//! MULTILINE, otherwise a single slice over the whole string), picks the
//! execution mode (the parallel simulation for regular patterns, the
//! backtracking interpreter when backreferences are present) and walks
//! the input delivering matches left to right through a callback.

pub mod backtracking;
pub mod simulation;

use std::collections::HashMap;
use std::ops::Range;

use crate::compile::CompiledRegex;
use crate::cursor::Cursor;
use crate::fsm::StateId;

/// A raw match: byte range of the full match plus captured group ranges.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    pub range: Range<usize>,
    pub groups: HashMap<usize, Range<usize>>,
}

impl MatchRecord {
    fn from_cursor(cursor: &Cursor<'_>) -> Self {
        MatchRecord {
            range: cursor.start_index()..cursor.index(),
            groups: cursor.groups().clone(),
        }
    }
}

/// Invoke `callback` once per match, in order. The callback returns
/// `false` to stop the iteration early.
pub fn for_each_match(
    regex: &CompiledRegex,
    input: &str,
    mut callback: impl FnMut(MatchRecord) -> bool,
) {
    let slices = build_slices(regex, input);
    let mut previous_match_index: Option<usize> = None;

    for slice in slices {
        let mut origin = slice.start;
        loop {
            let mut cursor = Cursor::new(input, slice.clone());
            cursor.start_at(origin);
            if let Some(at) = previous_match_index {
                cursor.set_previous_match_index(at);
            }

            let found = if regex.is_regular {
                simulation::first_match(regex, cursor)
            } else {
                backtracking::first_match(regex, cursor)
            };

            let record = match found {
                Some(record) => record,
                None => break,
            };
            log::debug!(
                "match at {}..{} on slice {}..{}",
                record.range.start,
                record.range.end,
                slice.start,
                slice.end
            );

            let end = record.range.end;
            let empty = record.range.is_empty();
            if !callback(record) {
                return;
            }
            previous_match_index = Some(end);

            // A start-anchored pattern gets one attempt per slice.
            if regex.is_from_start_of_string {
                break;
            }
            // Guarantee progress after an empty match.
            if empty {
                if end >= slice.end {
                    break;
                }
                origin = index_after(input, end, slice.end);
            } else {
                origin = end;
            }
            if origin > slice.end {
                break;
            }
        }
    }
}

/// One slice per line under MULTILINE, otherwise the whole input.
fn build_slices(regex: &CompiledRegex, input: &str) -> Vec<Range<usize>> {
    if !regex.options.is_multiline() {
        return vec![0..input.len()];
    }
    let mut slices = Vec::new();
    let mut start = 0;
    for line in input.split('\n') {
        slices.push(start..start + line.len());
        start += line.len() + 1;
    }
    slices
}

/// Byte offset one character past `index`, clamped to `end`.
fn index_after(input: &str, index: usize, end: usize) -> usize {
    match input[index..end].chars().next() {
        Some(c) => index + c.len_utf8(),
        None => end,
    }
}

/// Capture bookkeeping performed on every state entry, identical in both
/// execution modes: close a group whose end state this is (if its start
/// was recorded), then record a group start the first time its start
/// state is entered.
pub(crate) fn update_capture_groups(
    regex: &CompiledRegex,
    state: StateId,
    cursor: &mut Cursor<'_>,
) {
    if let Some(group) = regex.capture_group_ending_at(state) {
        if let Some(start) = cursor.group_start_index(group.start) {
            cursor.set_group(group.index, start..cursor.index());
            // Clear the mark so a requantified group records its next
            // iteration from scratch; the last completed iteration wins.
            cursor.remove_group_start_index(group.start);
        }
    }
    if let Some(group) = regex.capture_group_starting_at(state) {
        if cursor.group_start_index(state).is_none() {
            cursor.set_group_start_index(state, cursor.index());
        }
    }
}
