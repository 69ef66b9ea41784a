//! A regular-expression engine.
//!
//! Patterns are compiled in three stages:
//! - a combinator-based parser turns the pattern string into an AST
//! - the compiler lowers the AST into an NFA of states joined by
//!   conditional transitions (ε-transitions included)
//! - a matcher executes the NFA: a parallel multi-state simulation for
//!   regular patterns, and a recursive backtracking interpreter whenever
//!   backreferences are present
//!
//! Supported syntax: alternation `a|b`, groups `(…)` and `(?:…)`, greedy
//! quantifiers `? * + {m} {m,} {m,n}`, character classes `[a-z]` `[^…]`
//! and shorthands `\d \w \s` (with negations), anchors `^ $ \A \z \Z`,
//! word boundaries `\b \B`, the previous-match anchor `\G`, and
//! backreferences `\1`–`\9`.
//!
//! ```
//! use regex_machine::Regex;
//!
//! let regex = Regex::new("a(b+)c").unwrap();
//! let found = regex.first_match("xabbbc").unwrap();
//! assert_eq!(found.full_match(), "abbbc");
//! assert_eq!(found.group(1), Some("bbb"));
//! ```

pub mod ast;
pub mod compile;
pub mod cursor;
pub mod error;
pub mod fsm;
pub mod matcher;
pub mod options;
pub mod parse;
mod regex;

pub use error::CompileError;
pub use options::Options;
pub use regex::{Match, Regex};
