//! The regex surface grammar.
//!
//! Productions are written as methods over the combinator kernel and
//! produce [`AstNode`] trees. Capture-group indices are assigned in the
//! order opening parens are accepted; `(?:…)` does not consume an index.

use std::cell::Cell;

use super::{literal, number, token, Input, ParseResult, Parser};
use crate::ast::{
    AnchorKind, AstNode, CharSet, CharSetItem, ClassKind, MatchKind, QuantifierKind,
};
use crate::error::CompileError;
use crate::options::Options;

/// The result of parsing a pattern.
#[derive(Debug)]
pub struct ParsedPattern {
    pub root: AstNode,
    pub group_count: usize,
}

/// Parse a whole pattern into an AST.
pub fn parse_pattern(pattern: &str, options: Options) -> Result<ParsedPattern, CompileError> {
    if pattern.is_empty() {
        return Err(CompileError::new("Pattern is empty", 0));
    }
    let grammar = Grammar {
        options,
        group_count: Cell::new(0),
    };
    let mut input = Input::new(pattern);
    let root = match grammar.expression(&mut input)? {
        Some(node) => node,
        None => return Err(CompileError::new("Pattern is empty", 0)),
    };
    if !input.is_at_end() {
        let message = match input.peek() {
            Some(')') => "Unmatched parenthesis",
            _ => "Unexpected character",
        };
        return Err(CompileError::new(message, input.pos()));
    }
    Ok(ParsedPattern {
        root,
        group_count: grammar.group_count.get(),
    })
}

struct Grammar {
    options: Options,
    group_count: Cell<usize>,
}

impl Grammar {
    /// Expression := Concatenation ( '|' Concatenation )*
    fn expression(&self, input: &mut Input) -> ParseResult<AstNode> {
        let mut branches = match self.concatenation(input)? {
            Some(node) => vec![node],
            None => return Ok(None),
        };
        while token('|').parse(input)?.is_some() {
            match self.concatenation(input)? {
                Some(node) => branches.push(node),
                // Concatenation matches the empty string, so this is
                // unreachable; keep the arm for the type checker.
                None => branches.push(AstNode::Expression(Vec::new())),
            }
        }
        if branches.len() == 1 {
            Ok(Some(branches.pop().unwrap()))
        } else {
            Ok(Some(AstNode::Alternation(branches)))
        }
    }

    /// Concatenation := Atom*; always succeeds, possibly empty.
    fn concatenation(&self, input: &mut Input) -> ParseResult<AstNode> {
        let mut atoms = Vec::new();
        while let Some(atom) = self.quantified_atom(input)? {
            atoms.push(atom);
        }
        // A dangling quantifier has no atom to bind to.
        if matches!(input.peek(), Some('*' | '+' | '?')) {
            return Err(CompileError::new("Nothing to repeat", input.pos()));
        }
        if atoms.len() == 1 {
            Ok(Some(atoms.pop().unwrap()))
        } else {
            Ok(Some(AstNode::Expression(atoms)))
        }
    }

    /// Atom Quantifier?
    fn quantified_atom(&self, input: &mut Input) -> ParseResult<AstNode> {
        let atom = match self.atom(input)? {
            Some(atom) => atom,
            None => return Ok(None),
        };
        match self.quantifier(input)? {
            Some(kind) => Ok(Some(AstNode::Quantifier {
                kind,
                child: Box::new(atom),
            })),
            None => Ok(Some(atom)),
        }
    }

    fn atom(&self, input: &mut Input) -> ParseResult<AstNode> {
        match input.peek() {
            None => Ok(None),
            Some(')') | Some('|') => Ok(None),
            Some('*') | Some('+') | Some('?') => Ok(None),
            Some('(') => self.group(input),
            Some('[') => self.character_set(input),
            Some('.') => {
                token('.').parse(input)?;
                Ok(Some(AstNode::Match(MatchKind::AnyCharacter {
                    including_newline: self.options.dot_matches_line_separators(),
                })))
            }
            Some('^') => {
                token('^').parse(input)?;
                Ok(Some(AstNode::Anchor(AnchorKind::StartOfString)))
            }
            Some('$') => {
                token('$').parse(input)?;
                Ok(Some(AstNode::Anchor(AnchorKind::EndOfString)))
            }
            Some('\\') => self.escape(input),
            Some(c) => {
                token(c).parse(input)?;
                Ok(Some(AstNode::Match(MatchKind::Character(c))))
            }
        }
    }

    /// Group := '(' ( '?:' )? Expression ')'
    fn group(&self, input: &mut Input) -> ParseResult<AstNode> {
        if token('(').parse(input)?.is_none() {
            return Ok(None);
        }
        let is_capturing = literal("?:").parse(input)?.is_none();
        let index = if is_capturing {
            let index = self.group_count.get() + 1;
            self.group_count.set(index);
            Some(index)
        } else {
            None
        };
        let child = match self.expression(input)? {
            Some(node) => node,
            None => AstNode::Expression(Vec::new()),
        };
        token(')')
            .required("Unmatched parenthesis")
            .parse(input)?;
        Ok(Some(AstNode::Group {
            index,
            child: Box::new(child),
        }))
    }

    /// Quantifier := '?' | '*' | '+' | '{' Number ( ',' Number? )? '}'
    fn quantifier(&self, input: &mut Input) -> ParseResult<QuantifierKind> {
        let simple = token('*')
            .map(|_| QuantifierKind::ZeroOrMore)
            .or(token('+').map(|_| QuantifierKind::OneOrMore))
            .or(token('?').map(|_| QuantifierKind::ZeroOrOne));
        if let Some(kind) = simple.parse(input)? {
            return Ok(Some(kind));
        }
        self.range_quantifier(input)
    }

    /// `{low}`, `{low,}`, `{low,high}`. A brace that does not form a valid
    /// range quantifier is left for the literal fallback.
    fn range_quantifier(&self, input: &mut Input) -> ParseResult<QuantifierKind> {
        let open = input.pos();
        let bounds = token('{')
            .then(number())
            .then(token(',').then(number().optional()).optional())
            .then(token('}'))
            .map(|(((_, low), tail), _)| {
                let high = match tail {
                    // `{low}`
                    None => Some(low),
                    // `{low,}`
                    Some((_, None)) => None,
                    // `{low,high}`
                    Some((_, Some(high))) => Some(high),
                };
                (low, high)
            })
            .parse(input)?;
        match bounds {
            None => Ok(None),
            Some((low, high)) => {
                if let Some(high) = high {
                    if low > high {
                        return Err(CompileError::new("Invalid quantifier range", open));
                    }
                }
                Ok(Some(QuantifierKind::Range { low, high }))
            }
        }
    }

    fn escape(&self, input: &mut Input) -> ParseResult<AstNode> {
        let backslash = input.pos();
        if token('\\').parse(input)?.is_none() {
            return Ok(None);
        }
        // Backreference: '\' DecimalDigit+
        if matches!(input.peek(), Some(c) if c.is_ascii_digit()) {
            let index = number()
                .required("Expected a backreference index")
                .parse(input)?
                .unwrap();
            return Ok(Some(AstNode::Backreference {
                index,
                offset: backslash,
            }));
        }
        let c = match input.peek() {
            Some(c) => c,
            None => {
                return Err(CompileError::new(
                    "Pattern may not end with a trailing backslash",
                    backslash,
                ))
            }
        };
        let node = match c {
            'b' => AstNode::Anchor(AnchorKind::WordBoundary),
            'B' => AstNode::Anchor(AnchorKind::NonWordBoundary),
            'A' => AstNode::Anchor(AnchorKind::StartOfStringOnly),
            'Z' => AstNode::Anchor(AnchorKind::EndOfStringOnly),
            'z' => AstNode::Anchor(AnchorKind::EndOfStringOnlyNotNewline),
            'G' => AstNode::Anchor(AnchorKind::PreviousMatchEnd),
            'd' | 'D' | 'w' | 'W' | 's' | 'S' => {
                AstNode::Match(MatchKind::CharacterSet(shorthand_set(c)))
            }
            'n' => AstNode::Match(MatchKind::Character('\n')),
            'r' => AstNode::Match(MatchKind::Character('\r')),
            't' => AstNode::Match(MatchKind::Character('\t')),
            'f' => AstNode::Match(MatchKind::Character('\x0C')),
            c if c.is_ascii_alphanumeric() => {
                return Err(CompileError::new("Invalid escape sequence", backslash));
            }
            // Escaped punctuation is the literal character.
            c => AstNode::Match(MatchKind::Character(c)),
        };
        token(c).parse(input)?;
        Ok(Some(node))
    }

    /// CharSet := '[' '^'? ( Range | EscapedClass | Literal )+ ']'
    fn character_set(&self, input: &mut Input) -> ParseResult<AstNode> {
        let open = input.pos();
        if token('[').parse(input)?.is_none() {
            return Ok(None);
        }
        let negated = token('^').parse(input)?.is_some();
        let mut items = Vec::new();
        while let Some(item) = self.set_member(input)? {
            items.push(item);
        }
        if items.is_empty() {
            return Err(CompileError::new("Character group is empty", input.pos()));
        }
        if token(']').parse(input)?.is_none() {
            return Err(CompileError::new(
                "Character group missing closing bracket",
                open,
            ));
        }
        Ok(Some(AstNode::Match(MatchKind::CharacterSet(CharSet {
            items,
            negated,
        }))))
    }

    /// One member of a bracket expression.
    fn set_member(&self, input: &mut Input) -> ParseResult<CharSetItem> {
        if matches!(input.peek(), None | Some(']')) {
            return Ok(None);
        }
        let start = input.pos();
        let first = match self.set_char(input)? {
            Some(first) => first,
            None => return Ok(None),
        };
        let first = match first {
            SetChar::Class(kind) => return Ok(Some(CharSetItem::Class(kind))),
            SetChar::Literal(c) => c,
        };
        // Range, unless the '-' is the last member before ']'.
        let dash_applies = input.peek() == Some('-')
            && !matches!(self.peek_second(input), None | Some(']'));
        if dash_applies {
            token('-').parse(input)?;
            let second = match self.set_char(input)? {
                Some(SetChar::Literal(c)) => c,
                Some(SetChar::Class(_)) | None => {
                    return Err(CompileError::new("Invalid character range", start));
                }
            };
            if first > second {
                return Err(CompileError::new(
                    "Character range is out of order",
                    start,
                ));
            }
            return Ok(Some(CharSetItem::Range(first, second)));
        }
        Ok(Some(CharSetItem::Single(first)))
    }

    /// A single character or class escape inside a bracket expression.
    fn set_char(&self, input: &mut Input) -> ParseResult<SetChar> {
        let backslash = input.pos();
        if token('\\').parse(input)?.is_some() {
            let c = match input.peek() {
                Some(c) => c,
                None => {
                    return Err(CompileError::new(
                        "Pattern may not end with a trailing backslash",
                        backslash,
                    ))
                }
            };
            let parsed = match c {
                'd' => SetChar::Class(ClassKind::Digit),
                'D' => SetChar::Class(ClassKind::NonDigit),
                'w' => SetChar::Class(ClassKind::Word),
                'W' => SetChar::Class(ClassKind::NonWord),
                's' => SetChar::Class(ClassKind::Whitespace),
                'S' => SetChar::Class(ClassKind::NonWhitespace),
                'n' => SetChar::Literal('\n'),
                'r' => SetChar::Literal('\r'),
                't' => SetChar::Literal('\t'),
                'f' => SetChar::Literal('\x0C'),
                c if c.is_ascii_alphanumeric() => {
                    return Err(CompileError::new("Invalid escape sequence", backslash));
                }
                c => SetChar::Literal(c),
            };
            token(c).parse(input)?;
            return Ok(Some(parsed));
        }
        match input.peek() {
            None | Some(']') => Ok(None),
            Some(c) => {
                token(c).parse(input)?;
                Ok(Some(SetChar::Literal(c)))
            }
        }
    }

    fn peek_second(&self, input: &Input) -> Option<char> {
        input.peek_at(1)
    }
}

enum SetChar {
    Literal(char),
    Class(ClassKind),
}

/// `\d`, `\D`, `\w`, `\W`, `\s`, `\S` as standalone character sets.
fn shorthand_set(c: char) -> CharSet {
    let (kind, negated) = match c {
        'd' => (ClassKind::Digit, false),
        'D' => (ClassKind::Digit, true),
        'w' => (ClassKind::Word, false),
        'W' => (ClassKind::Word, true),
        's' => (ClassKind::Whitespace, false),
        'S' => (ClassKind::Whitespace, true),
        _ => unreachable!("not a shorthand class: {c:?}"),
    };
    CharSet {
        items: vec![CharSetItem::Class(kind)],
        negated,
    }
}
