//! Parallel NFA simulation.
//!
//! Runs every live state in lockstep over the input, visiting each
//! character a bounded number of times. Per outer step, each reachable
//! state is expanded through a depth-first ε-closure (a per-seed
//! `encountered` bitset makes quantifier cycles terminate), consuming
//! transitions feed the next reachable set, and end-state entries record
//! potential matches with the longest end index winning. Two shortcuts
//! keep the scan linear in practice: multi-character literal transitions
//! park their target state until the run is consumed, and repeated
//! reachable-set combinations mark a retry origin so a failed attempt
//! does not rescan the cycled-over prefix.

use std::collections::{HashMap, HashSet};

use super::{update_capture_groups, MatchRecord};
use crate::compile::CompiledRegex;
use crate::cursor::Cursor;
use crate::fsm::{Consumed, StateId};

/// Find the leftmost match from the cursor's start position to the end of
/// its slice. Retries at later origins internally unless the pattern is
/// anchored to the slice start.
pub(crate) fn first_match(regex: &CompiledRegex, mut cursor: Cursor<'_>) -> Option<MatchRecord> {
    let slice = cursor.slice();
    let start_state = regex.fragment.start;
    let state_count = regex.state_count();

    let mut reachable = StateList::new(state_count);
    reachable.insert(start_state);
    let mut encountered = BitSet::new(state_count);
    let mut must_expand = BitSet::new(state_count);
    let mut reachable_until: HashMap<StateId, usize> = HashMap::new();
    let mut potential: Option<Cursor<'_>> = None;
    // Reachable-set combinations already seen during this attempt chain.
    // Retained across internal retries, cleared only when the driver
    // starts over at a new origin.
    let mut seen_combinations: HashSet<Vec<StateId>> = HashSet::new();
    let mut retry_index: Option<usize> = None;

    loop {
        let mut new_reachable = StateList::new(state_count);
        let mut next_until: HashMap<StateId, usize> = HashMap::new();
        must_expand.clear();

        for &state in reachable.iter() {
            // A state parked behind a multi-character transition is
            // carried forward untouched until its run is consumed.
            if let Some(&until) = reachable_until.get(&state) {
                if until > cursor.index() {
                    new_reachable.insert(state);
                    next_until.insert(state, until);
                    continue;
                }
            }

            // Depth-first ε-closure seeded at this state. Transitions are
            // pushed in reverse so they pop in compile order: the greedy
            // loop edge and the earlier alternation branch run first.
            encountered.clear();
            let mut stack = vec![state];
            while let Some(current) = stack.pop() {
                if encountered.contains(current) {
                    continue;
                }
                encountered.insert(current);
                update_capture_groups(regex, current, &mut cursor);

                if regex.state(current).is_end {
                    let longer = potential
                        .as_ref()
                        .map_or(true, |best| cursor.index() > best.index());
                    if longer {
                        log::trace!(
                            "potential match {}..{} at state {}",
                            cursor.start_index(),
                            cursor.index(),
                            regex.symbols.description(current)
                        );
                        potential = Some(cursor.clone());
                    }
                }

                for transition in regex.state(current).transitions.iter().rev() {
                    match transition.condition.evaluate(&cursor, regex.options) {
                        None => {}
                        Some(Consumed::Epsilon) => stack.push(transition.end),
                        Some(Consumed::Char(_)) => {
                            new_reachable.insert(transition.end);
                            must_expand.insert(transition.end);
                        }
                        Some(Consumed::Chars(n)) => {
                            new_reachable.insert(transition.end);
                            next_until.insert(transition.end, cursor.index() + n);
                        }
                    }
                }
            }
        }

        // A state also entered through a single-character transition must
        // be expanded next step; parking it would skip real work.
        next_until.retain(|&state, _| !must_expand.contains(state));
        reachable_until = next_until;

        if new_reachable.is_empty() {
            if let Some(found) = &potential {
                return Some(MatchRecord::from_cursor(found));
            }
            if regex.is_from_start_of_string {
                return None;
            }
            // Retry from the recorded origin, never rescanning the
            // prefix a state-set cycle already covered, and always at
            // least one character past the failed attempt's start.
            let minimum = index_after_in(cursor.input(), cursor.start_index(), slice.end);
            let next_start = retry_index.take().map_or(minimum, |at| at.max(minimum));
            if next_start > slice.end || cursor.start_index() >= slice.end {
                return None;
            }
            log::trace!("retrying from {next_start}");
            cursor.start_at(next_start);
            cursor.purge_before(next_start);
            reachable.clear();
            reachable.insert(start_state);
            reachable_until.clear();
            continue;
        }

        // Cycle skip: a repeated combination of live states cannot produce
        // a match from any origin in between.
        if !seen_combinations.insert(new_reachable.sorted_ids()) {
            retry_index = Some(cursor.index());
        }

        // Step: jump the whole front when every live state is parked.
        let all_parked = new_reachable
            .iter()
            .all(|state| reachable_until.contains_key(state));
        if all_parked {
            let jump = new_reachable
                .iter()
                .map(|state| reachable_until[state])
                .min()
                .expect("non-empty reachable set");
            debug_assert!(jump > cursor.index());
            cursor.advance_to(jump);
        } else {
            cursor.advance_by(1);
        }
        reachable = new_reachable;
    }
}

fn index_after_in(input: &str, index: usize, end: usize) -> usize {
    match input[index..end].chars().next() {
        Some(c) => index + c.len_utf8(),
        None => end,
    }
}

// ---------------------------------------------------------------------------
// State sets
// ---------------------------------------------------------------------------

/// Insertion-ordered set of state tags with O(1) membership.
struct StateList {
    ids: Vec<StateId>,
    member: BitSet,
}

impl StateList {
    fn new(capacity: usize) -> Self {
        StateList {
            ids: Vec::new(),
            member: BitSet::new(capacity),
        }
    }

    fn insert(&mut self, id: StateId) {
        if !self.member.contains(id) {
            self.member.insert(id);
            self.ids.push(id);
        }
    }

    fn iter(&self) -> std::slice::Iter<'_, StateId> {
        self.ids.iter()
    }

    fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn clear(&mut self) {
        self.ids.clear();
        self.member.clear();
    }

    /// Canonical key for the cycle-skip set.
    fn sorted_ids(&self) -> Vec<StateId> {
        let mut ids = self.ids.clone();
        ids.sort_unstable();
        ids
    }
}

/// Fixed-capacity bitset over state tags.
struct BitSet {
    words: Vec<u64>,
}

impl BitSet {
    fn new(capacity: usize) -> Self {
        BitSet {
            words: vec![0; (capacity + 63) / 64],
        }
    }

    fn insert(&mut self, bit: usize) {
        self.words[bit / 64] |= 1 << (bit % 64);
    }

    fn contains(&self, bit: usize) -> bool {
        self.words[bit / 64] & (1 << (bit % 64)) != 0
    }

    fn clear(&mut self) {
        self.words.fill(0);
    }
}
