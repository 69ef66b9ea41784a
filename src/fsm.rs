//! State-machine representation.
//!
//! States live in an arena owned by the compiled regex; a [`StateId`] is
//! both the arena index and the stable tag the matchers use for bitset
//! membership. Transitions carry a first-order [`Condition`] that is
//! evaluated against a cursor and reports how much input it consumed.

use crate::ast::{is_word_char, AnchorKind, CharSet, CharSetItem};
use crate::cursor::Cursor;
use crate::options::Options;

/// Stable tag of a state, unique within one compiled regex.
pub type StateId = usize;

/// A unit of the NFA.
#[derive(Debug)]
pub struct State {
    /// True only for the outermost fragment's end state.
    pub is_end: bool,
    /// Outgoing transitions in compile order; for greedy quantifiers the
    /// loop edge precedes the exit edge.
    pub transitions: Vec<Transition>,
}

impl State {
    pub fn new() -> Self {
        State {
            is_end: false,
            transitions: Vec::new(),
        }
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

/// A conditional edge between two states.
#[derive(Debug)]
pub struct Transition {
    pub condition: Condition,
    pub end: StateId,
}

/// A compiled sub-NFA with distinguished entry and exit states.
/// Every path from `start` reaches `end`.
#[derive(Debug, Clone, Copy)]
pub struct Fragment {
    pub start: StateId,
    pub end: StateId,
}

/// A capture group's bracketing states.
#[derive(Debug, Clone, Copy)]
pub struct CaptureGroup {
    pub index: usize,
    pub start: StateId,
    pub end: StateId,
}

// ---------------------------------------------------------------------------
// Conditions
// ---------------------------------------------------------------------------

/// How much input a fired transition consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consumed {
    /// Nothing (ε-transition or satisfied anchor).
    Epsilon,
    /// Exactly one character of `n` bytes.
    Char(usize),
    /// A run of more than one character, `n` bytes in total.
    Chars(usize),
}

impl Consumed {
    pub fn bytes(self) -> usize {
        match self {
            Consumed::Epsilon => 0,
            Consumed::Char(n) | Consumed::Chars(n) => n,
        }
    }
}

/// The test attached to a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Always fires, consumes nothing.
    Epsilon,
    /// A literal character.
    Character(char),
    /// A literal run of characters, collapsed from adjacent character
    /// matches; consumes several characters at once.
    LiteralRun(String),
    /// `.`
    AnyCharacter { including_newline: bool },
    /// `[…]` or a shorthand class.
    CharacterSet(CharSet),
    /// A zero-width assertion.
    Anchor(AnchorKind),
    /// Re-match the text captured by group `index`.
    Backreference(usize),
}

impl Condition {
    /// Evaluate against the cursor. `None` means the transition is not
    /// taken; otherwise the consumed amount is reported.
    pub fn evaluate(&self, cursor: &Cursor<'_>, options: Options) -> Option<Consumed> {
        let fold = options.is_case_insensitive();
        match self {
            Condition::Epsilon => Some(Consumed::Epsilon),
            Condition::Character(expected) => {
                let c = cursor.character()?;
                if chars_equal(c, *expected, fold) {
                    Some(Consumed::Char(c.len_utf8()))
                } else {
                    None
                }
            }
            Condition::LiteralRun(run) => {
                let mut remaining = cursor.remaining().chars();
                let mut bytes = 0;
                for expected in run.chars() {
                    let c = remaining.next()?;
                    if !chars_equal(c, expected, fold) {
                        return None;
                    }
                    bytes += c.len_utf8();
                }
                Some(Consumed::Chars(bytes))
            }
            Condition::AnyCharacter { including_newline } => {
                let c = cursor.character()?;
                if !including_newline && c == '\n' {
                    None
                } else {
                    Some(Consumed::Char(c.len_utf8()))
                }
            }
            Condition::CharacterSet(set) => {
                let c = cursor.character()?;
                if set_matches(set, c, fold) {
                    Some(Consumed::Char(c.len_utf8()))
                } else {
                    None
                }
            }
            Condition::Anchor(kind) => {
                if anchor_holds(*kind, cursor) {
                    Some(Consumed::Epsilon)
                } else {
                    None
                }
            }
            Condition::Backreference(index) => {
                let range = cursor.groups().get(index)?.clone();
                let captured = &cursor.input()[range];
                let mut remaining = cursor.remaining().chars();
                let mut bytes = 0;
                for expected in captured.chars() {
                    let c = remaining.next()?;
                    if !chars_equal(c, expected, fold) {
                        return None;
                    }
                    bytes += c.len_utf8();
                }
                match bytes {
                    0 => Some(Consumed::Epsilon),
                    n => Some(Consumed::Chars(n)),
                }
            }
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Condition::Epsilon => write!(f, "ε"),
            Condition::Character(c) => write!(f, "char {c:?}"),
            Condition::LiteralRun(s) => write!(f, "string {s:?}"),
            Condition::AnyCharacter { .. } => write!(f, "any"),
            Condition::CharacterSet(_) => write!(f, "set"),
            Condition::Anchor(kind) => write!(f, "anchor {kind:?}"),
            Condition::Backreference(index) => write!(f, "backreference \\{index}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Condition helpers
// ---------------------------------------------------------------------------

/// Character equality with optional simple case folding.
pub fn chars_equal(a: char, b: char, fold: bool) -> bool {
    if a == b {
        return true;
    }
    if !fold {
        return false;
    }
    if a.is_ascii() && b.is_ascii() {
        a.eq_ignore_ascii_case(&b)
    } else {
        a.to_lowercase().eq(b.to_lowercase())
    }
}

/// Set membership with folding applied before negation.
fn set_matches(set: &CharSet, c: char, fold: bool) -> bool {
    let mut raw = raw_member(set, c);
    if !raw && fold {
        raw = c
            .to_lowercase()
            .chain(c.to_uppercase())
            .any(|variant| variant != c && raw_member(set, variant));
    }
    raw != set.negated
}

/// Membership against the items only, ignoring negation.
fn raw_member(set: &CharSet, c: char) -> bool {
    set.items.iter().any(|item| match *item {
        CharSetItem::Single(s) => s == c,
        CharSetItem::Range(lo, hi) => (lo..=hi).contains(&c),
        CharSetItem::Class(kind) => kind.matches(c),
    })
}

fn anchor_holds(kind: AnchorKind, cursor: &Cursor<'_>) -> bool {
    match kind {
        AnchorKind::StartOfString => cursor.index() == cursor.slice().start,
        AnchorKind::StartOfStringOnly => cursor.is_at_input_start(),
        AnchorKind::EndOfString => cursor.is_empty(),
        AnchorKind::EndOfStringOnly => {
            cursor.is_at_input_end() || &cursor.input()[cursor.index()..] == "\n"
        }
        AnchorKind::EndOfStringOnlyNotNewline => cursor.is_at_input_end(),
        AnchorKind::WordBoundary => at_word_boundary(cursor),
        AnchorKind::NonWordBoundary => !at_word_boundary(cursor),
        AnchorKind::PreviousMatchEnd => match cursor.previous_match_index() {
            Some(at) => cursor.index() == at,
            None => cursor.is_at_input_start(),
        },
    }
}

fn at_word_boundary(cursor: &Cursor<'_>) -> bool {
    let before = cursor.character_offset_by(-1).map(is_word_char);
    let after = cursor.character().map(is_word_char);
    match (before, after) {
        (Some(b), Some(a)) => b != a,
        (None, Some(a)) => a,
        (Some(b), None) => b,
        (None, None) => false,
    }
}
