//! Pattern compiler.
//!
//! Lowers the parsed AST into a graph of states connected by conditional
//! transitions. Each AST node becomes a [`Fragment`], a sub-NFA with one
//! entry and one exit state, and fragments are stitched together with
//! ε-transitions. The compiler also assembles the capture-group table,
//! the symbol map used by debug logging, and the flags the matcher
//! dispatches on.

use std::collections::HashMap;

use crate::ast::{AnchorKind, AstNode, MatchKind, QuantifierKind};
use crate::error::CompileError;
use crate::fsm::{CaptureGroup, Condition, Fragment, State, StateId, Transition};
use crate::options::Options;
use crate::parse::grammar::parse_pattern;

/// The executable artifact: state arena, outer fragment, capture table,
/// debug symbols and dispatch flags. Immutable once built.
#[derive(Debug)]
pub struct CompiledRegex {
    states: Vec<State>,
    pub fragment: Fragment,
    pub capture_groups: Vec<CaptureGroup>,
    pub symbols: Symbols,
    /// No backreferences anywhere in the pattern; the parallel simulation
    /// applies.
    pub is_regular: bool,
    /// The pattern is anchored to the start of its slice (`^` or `\A`
    /// prefix); the matcher attempts each slice only once.
    pub is_from_start_of_string: bool,
    pub options: Options,
}

impl CompiledRegex {
    pub fn state(&self, id: StateId) -> &State {
        &self.states[id]
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// The capture group whose start state is `id`, if any.
    pub fn capture_group_starting_at(&self, id: StateId) -> Option<&CaptureGroup> {
        self.capture_groups.iter().find(|group| group.start == id)
    }

    /// The capture group whose end state is `id`, if any.
    pub fn capture_group_ending_at(&self, id: StateId) -> Option<&CaptureGroup> {
        self.capture_groups.iter().find(|group| group.end == id)
    }
}

/// Debug metadata: which AST node produced each state.
#[derive(Debug, Default)]
pub struct Symbols {
    map: HashMap<StateId, Symbol>,
}

#[derive(Debug)]
pub struct Symbol {
    pub node: AstNode,
    /// Whether the state is the exit of its fragment.
    pub is_fragment_end: bool,
}

impl Symbols {
    pub fn get(&self, id: StateId) -> Option<&Symbol> {
        self.map.get(&id)
    }

    /// Compact rendering for trace logs.
    pub fn description(&self, id: StateId) -> String {
        match self.map.get(&id) {
            Some(symbol) => format!(
                "{id} [{}{}]",
                symbol.node.unit_name(),
                if symbol.is_fragment_end { ", end" } else { "" }
            ),
            None => format!("{id}"),
        }
    }
}

/// Compile a pattern into a state machine.
pub fn compile(pattern: &str, options: Options) -> Result<CompiledRegex, CompileError> {
    let parsed = parse_pattern(pattern, options)?;
    let mut compiler = Compiler {
        states: Vec::new(),
        capture_groups: Vec::new(),
        backreferences: Vec::new(),
        symbols: Symbols::default(),
    };
    let inner = compiler.compile_node(&parsed.root);

    // Implicit outer group, so the matcher always sees one enclosing scope.
    let fragment = compiler.wrap(inner);
    compiler.states[fragment.end].is_end = true;

    // Every backreference must name a declared capture index.
    for &(index, offset) in &compiler.backreferences {
        if index == 0 || index > parsed.group_count {
            return Err(CompileError::new(
                format!("Backreference to unknown group \\{index}"),
                offset,
            ));
        }
    }

    let compiled = CompiledRegex {
        is_regular: compiler.backreferences.is_empty(),
        is_from_start_of_string: starts_at_string_start(&parsed.root),
        states: compiler.states,
        fragment,
        capture_groups: compiler.capture_groups,
        symbols: compiler.symbols,
        options,
    };
    log::debug!(
        "compiled pattern {:?}: {} states, {} capture groups, regular: {}",
        pattern,
        compiled.state_count(),
        compiled.capture_groups.len(),
        compiled.is_regular
    );
    Ok(compiled)
}

struct Compiler {
    states: Vec<State>,
    capture_groups: Vec<CaptureGroup>,
    /// (index, pattern offset) of every backreference encountered.
    backreferences: Vec<(usize, usize)>,
    symbols: Symbols,
}

impl Compiler {
    fn add_state(&mut self) -> StateId {
        self.states.push(State::new());
        self.states.len() - 1
    }

    fn add_transition(&mut self, from: StateId, condition: Condition, to: StateId) {
        self.states[from].transitions.push(Transition {
            condition,
            end: to,
        });
    }

    fn record(&mut self, fragment: Fragment, node: &AstNode) {
        self.symbols.map.insert(
            fragment.start,
            Symbol {
                node: node.clone(),
                is_fragment_end: false,
            },
        );
        self.symbols.map.insert(
            fragment.end,
            Symbol {
                node: node.clone(),
                is_fragment_end: true,
            },
        );
    }

    fn compile_node(&mut self, node: &AstNode) -> Fragment {
        let fragment = match node {
            AstNode::Expression(children) => self.compile_concatenation(children),
            AstNode::Group { index, child } => {
                let inner = self.compile_node(child);
                let fragment = self.wrap(inner);
                if let Some(index) = index {
                    self.capture_groups.push(CaptureGroup {
                        index: *index,
                        start: fragment.start,
                        end: fragment.end,
                    });
                }
                fragment
            }
            AstNode::Alternation(branches) => {
                let start = self.add_state();
                let end = self.add_state();
                for branch in branches {
                    let fragment = self.compile_node(branch);
                    self.add_transition(start, Condition::Epsilon, fragment.start);
                    self.add_transition(fragment.end, Condition::Epsilon, end);
                }
                Fragment { start, end }
            }
            AstNode::Quantifier { kind, child } => self.compile_quantifier(*kind, child),
            AstNode::Match(kind) => {
                let condition = match kind {
                    MatchKind::Character(c) => Condition::Character(*c),
                    MatchKind::AnyCharacter { including_newline } => Condition::AnyCharacter {
                        including_newline: *including_newline,
                    },
                    MatchKind::CharacterSet(set) => Condition::CharacterSet(set.clone()),
                };
                self.singleton(condition)
            }
            AstNode::Anchor(kind) => self.singleton(Condition::Anchor(*kind)),
            AstNode::Backreference { index, offset } => {
                self.backreferences.push((*index, *offset));
                self.singleton(Condition::Backreference(*index))
            }
        };
        self.record(fragment, node);
        fragment
    }

    /// One start and one end state joined by a single conditional edge.
    fn singleton(&mut self, condition: Condition) -> Fragment {
        let start = self.add_state();
        let end = self.add_state();
        self.add_transition(start, condition, end);
        Fragment { start, end }
    }

    /// Concatenate children end-to-start, collapsing runs of adjacent
    /// literal characters into single multi-character conditions.
    fn compile_concatenation(&mut self, children: &[AstNode]) -> Fragment {
        let mut fragments: Vec<Fragment> = Vec::new();
        let mut run: Vec<char> = Vec::new();
        let mut run_node: Option<&AstNode> = None;

        for child in children {
            if let AstNode::Match(MatchKind::Character(c)) = child {
                if run.is_empty() {
                    run_node = Some(child);
                }
                run.push(*c);
                continue;
            }
            if !run.is_empty() {
                fragments.push(self.flush_run(&mut run, run_node.take()));
            }
            fragments.push(self.compile_node(child));
        }
        if !run.is_empty() {
            fragments.push(self.flush_run(&mut run, run_node.take()));
        }

        match fragments.len() {
            0 => {
                // Empty concatenation matches the empty string.
                let state = self.add_state();
                Fragment {
                    start: state,
                    end: state,
                }
            }
            _ => {
                for pair in fragments.windows(2) {
                    self.add_transition(pair[0].end, Condition::Epsilon, pair[1].start);
                }
                Fragment {
                    start: fragments[0].start,
                    end: fragments[fragments.len() - 1].end,
                }
            }
        }
    }

    fn flush_run(&mut self, run: &mut Vec<char>, node: Option<&AstNode>) -> Fragment {
        let condition = if run.len() == 1 {
            Condition::Character(run[0])
        } else {
            Condition::LiteralRun(run.iter().collect())
        };
        run.clear();
        let fragment = self.singleton(condition);
        if let Some(node) = node {
            self.record(fragment, node);
        }
        fragment
    }

    fn compile_quantifier(&mut self, kind: QuantifierKind, child: &AstNode) -> Fragment {
        match kind {
            QuantifierKind::ZeroOrOne => {
                let inner = self.compile_node(child);
                self.optional(inner)
            }
            QuantifierKind::ZeroOrMore => self.star(child),
            QuantifierKind::OneOrMore => {
                let first = self.compile_node(child);
                let rest = self.star(child);
                self.add_transition(first.end, Condition::Epsilon, rest.start);
                Fragment {
                    start: first.start,
                    end: rest.end,
                }
            }
            QuantifierKind::Range { low, high } => self.range(low, high, child),
        }
    }

    /// `child*`: ε-branch around plus an ε-back-edge. The loop edges come
    /// first so the greedy path is explored first.
    fn star(&mut self, child: &AstNode) -> Fragment {
        let inner = self.compile_node(child);
        let start = self.add_state();
        let end = self.add_state();
        self.add_transition(start, Condition::Epsilon, inner.start);
        self.add_transition(start, Condition::Epsilon, end);
        self.add_transition(inner.end, Condition::Epsilon, inner.start);
        self.add_transition(inner.end, Condition::Epsilon, end);
        Fragment { start, end }
    }

    /// ε-branch around an already-compiled fragment.
    fn optional(&mut self, inner: Fragment) -> Fragment {
        let start = self.add_state();
        let end = self.add_state();
        self.add_transition(start, Condition::Epsilon, inner.start);
        self.add_transition(start, Condition::Epsilon, end);
        self.add_transition(inner.end, Condition::Epsilon, end);
        Fragment { start, end }
    }

    /// `child{low}`, `child{low,}`, `child{low,high}`. Each copy is an
    /// independent compilation. The bounded tail is the nested-greedy
    /// chain `x (x (x)?)?` built right-to-left, which keeps the reachable
    /// state sets collapsible during backtracking.
    fn range(&mut self, low: usize, high: Option<usize>, child: &AstNode) -> Fragment {
        let mut fragments: Vec<Fragment> = Vec::new();
        for _ in 0..low {
            fragments.push(self.compile_node(child));
        }
        match high {
            None => {
                fragments.push(self.star(child));
            }
            Some(high) => {
                let mut tail: Option<Fragment> = None;
                for _ in low..high {
                    let copy = self.compile_node(child);
                    let chained = match tail {
                        None => copy,
                        Some(tail) => {
                            self.add_transition(copy.end, Condition::Epsilon, tail.start);
                            Fragment {
                                start: copy.start,
                                end: tail.end,
                            }
                        }
                    };
                    tail = Some(self.optional(chained));
                }
                if let Some(tail) = tail {
                    fragments.push(tail);
                }
            }
        }

        match fragments.len() {
            0 => {
                // `x{0}` matches the empty string.
                let state = self.add_state();
                Fragment {
                    start: state,
                    end: state,
                }
            }
            _ => {
                for pair in fragments.windows(2) {
                    self.add_transition(pair[0].end, Condition::Epsilon, pair[1].start);
                }
                Fragment {
                    start: fragments[0].start,
                    end: fragments[fragments.len() - 1].end,
                }
            }
        }
    }

    /// ε-bounded wrapper giving a fragment fresh entry/exit states.
    fn wrap(&mut self, inner: Fragment) -> Fragment {
        let start = self.add_state();
        let end = self.add_state();
        self.add_transition(start, Condition::Epsilon, inner.start);
        self.add_transition(inner.end, Condition::Epsilon, end);
        Fragment { start, end }
    }
}

/// Whether every top-level path through the pattern begins with a
/// start-of-input anchor. `^a|b` is not anchored: the `b` branch can
/// match anywhere. Groups and quantifiers count as unanchored; an anchor
/// nested inside them still fails at non-zero origins on its own, the
/// flag only gates the scan-skipping fast path.
fn starts_at_string_start(node: &AstNode) -> bool {
    match node {
        AstNode::Anchor(AnchorKind::StartOfString | AnchorKind::StartOfStringOnly) => true,
        AstNode::Expression(children) => {
            children.first().map_or(false, starts_at_string_start)
        }
        AstNode::Alternation(branches) => {
            !branches.is_empty() && branches.iter().all(starts_at_string_start)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compiled(pattern: &str) -> CompiledRegex {
        compile(pattern, Options::default()).unwrap()
    }

    #[test]
    fn test_single_character_graph() {
        let regex = compiled("a");
        // Match fragment (2 states) + outer wrap (2 states).
        assert_eq!(regex.state_count(), 4);
        assert!(regex.state(regex.fragment.end).is_end);
        assert!(regex.is_regular);
    }

    #[test]
    fn test_literal_run_collapse() {
        let regex = compiled("abc");
        let start = regex.fragment.start;
        let inner = regex.state(start).transitions[0].end;
        match &regex.state(inner).transitions[0].condition {
            Condition::LiteralRun(s) => assert_eq!(s, "abc"),
            other => panic!("expected literal run, got {other}"),
        }
    }

    #[test]
    fn test_run_not_collapsed_across_quantifier() {
        // `b+` must keep its own fragment: runs only span bare characters.
        let regex = compiled("ab+c");
        let has_run = (0..regex.state_count()).any(|id| {
            regex.state(id).transitions.iter().any(|t| {
                matches!(&t.condition, Condition::LiteralRun(_))
            })
        });
        assert!(!has_run);
    }

    #[test]
    fn test_capture_group_table() {
        let regex = compiled("(a)(?:b)(c)");
        assert_eq!(regex.capture_groups.len(), 2);
        assert_eq!(regex.capture_groups[0].index, 1);
        assert_eq!(regex.capture_groups[1].index, 2);
        let group = regex.capture_groups[0];
        assert!(regex.capture_group_starting_at(group.start).is_some());
        assert!(regex.capture_group_ending_at(group.end).is_some());
    }

    #[test]
    fn test_backreference_flags_non_regular() {
        let regex = compiled("(a)\\1");
        assert!(!regex.is_regular);
    }

    #[test]
    fn test_backreference_to_unknown_group() {
        let err = compile("(a)\\2", Options::default()).unwrap_err();
        assert_eq!(err.message, "Backreference to unknown group \\2");
        assert_eq!(err.offset, 3);
    }

    #[test]
    fn test_forward_backreference_allowed() {
        assert!(compile("(\\2)(b)", Options::default()).is_ok());
    }

    #[test]
    fn test_anchored_flag() {
        assert!(compiled("^a").is_from_start_of_string);
        assert!(compiled("\\Aa").is_from_start_of_string);
        assert!(!compiled("a^").is_from_start_of_string);
    }

    #[test]
    fn test_anchored_flag_over_alternation() {
        // Every top-level branch must carry the anchor.
        assert!(!compiled("^a|b").is_from_start_of_string);
        assert!(compiled("^a|^b").is_from_start_of_string);
        assert!(compiled("\\Aa|^b").is_from_start_of_string);
        assert!(!compiled("(^a)").is_from_start_of_string);
    }

    #[test]
    fn test_greedy_loop_edge_first() {
        let regex = compiled("a*");
        // Find the star's branching start: a state with two ε-transitions
        // where the first leads toward the character condition.
        let star_start = (0..regex.state_count())
            .find(|&id| {
                let t = &regex.state(id).transitions;
                t.len() == 2 && t.iter().all(|t| t.condition == Condition::Epsilon)
            })
            .expect("no branching state");
        let loop_target = regex.state(star_start).transitions[0].end;
        assert!(regex
            .state(loop_target)
            .transitions
            .iter()
            .any(|t| matches!(t.condition, Condition::Character('a'))));
    }

    #[test]
    fn test_recompile_stability() {
        let a = compiled("a(b|c)*d{2,3}");
        let b = compiled("a(b|c)*d{2,3}");
        assert_eq!(a.state_count(), b.state_count());
        for id in 0..a.state_count() {
            assert_eq!(
                a.state(id).transitions.len(),
                b.state(id).transitions.len()
            );
        }
    }

    #[test]
    fn test_counted_range_structure() {
        // {2,4} = two mandatory copies plus a two-deep optional chain.
        let regex = compiled("a{2,4}");
        let char_edges = (0..regex.state_count())
            .flat_map(|id| regex.state(id).transitions.iter())
            .filter(|t| matches!(t.condition, Condition::Character('a')))
            .count();
        assert_eq!(char_edges, 4);
    }

    #[test]
    fn test_symbols_describe_states() {
        let regex = compiled("a");
        // The outer wrap leads straight into the recorded match fragment.
        let inner = regex.state(regex.fragment.start).transitions[0].end;
        assert!(regex.symbols.description(inner).contains("Match"));
    }
}
