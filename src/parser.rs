// src/parser.rs
//! Byte-level scanner for query specifications.
//!
//! A specification is a list of tokens separated by `.`; each token is an
//! optional run of command characters followed by an attribute name, an
//! index, `#`, or a bracketed sub-query. `>` separates the source and
//! destination halves of a move query.

use crate::errors::ParseError;
use crate::flags::{command_char, Flags, Kind, Mode, MAX_DEPTH, WRITE_COMMANDS};
use crate::query::{Node, Query};

pub const SEPARATOR: u8 = b'.';
pub const ESCAPE: u8 = b'\\';
pub const SELF: u8 = b'#';
pub const APPEND: u8 = b'+';
pub const DELETE: u8 = b'!';
pub const MAKE: u8 = b'$';
pub const MAYBE: u8 = b'?';
pub const OVERWRITE: u8 = b'=';
pub const MOVE: u8 = b'>';
pub const OPEN: u8 = b'[';
pub const CLOSE: u8 = b']';
/// Output only: marks the addressed node when rendering.
pub const POSITION: u8 = b'@';
/// Output only, or the start of a dialect prefix.
pub const DIALECT: u8 = b'~';

/// Every byte with a meaning to the scanner.
pub const RESERVED: &[u8] = &[
    SEPARATOR, ESCAPE, SELF, APPEND, DELETE, MAKE, MAYBE, OVERWRITE, MOVE, OPEN, CLOSE, POSITION,
    DIALECT,
];

/// Known dialect prefix, stripped before scanning.
pub const GIRAFFE_V1: &str = "~giraffe1v1.";

/// Sub-queries cannot contain sub-queries.
pub const MAX_NESTING: usize = 1;

/// Parse a specification into the root node of a new path.
pub fn parse(spec: &str) -> Result<Query, ParseError> {
    match spec.strip_prefix(GIRAFFE_V1) {
        Some(rest) => Parser::new(rest, GIRAFFE_V1.len(), 0).parse(),
        None => Parser::new(spec, 0, 0).parse(),
    }
}

pub struct Parser<'a> {
    s: &'a str,
    i: usize,
    offset: usize,
    depth: usize,
}

#[derive(Default)]
enum Body {
    #[default]
    Text,
    SelfRef,
    Sub {
        raw: String,
        query: Query,
    },
}

#[derive(Default)]
struct Token {
    text: Vec<u8>,
    escaped: bool,
    commands: Mode,
    body: Body,
    start: usize,
    text_start: usize,
}

impl Token {
    fn started(&self) -> bool {
        !self.text.is_empty() || self.escaped
    }

    fn finalized(&self) -> bool {
        !matches!(self.body, Body::Text)
    }

    fn is_blank(&self) -> bool {
        !self.started() && !self.finalized() && self.commands.is_empty()
    }

    fn push_text(&mut self, byte: u8, pos: usize) {
        if !self.started() {
            self.text_start = pos;
        }
        self.text.push(byte);
    }
}

#[derive(Default)]
struct State {
    nodes: Vec<Node>,
    /// Commands written in closed tokens.
    seen: Mode,
    moves: usize,
    last_sep: Option<(u8, usize)>,
}

impl<'a> Parser<'a> {
    pub fn new(s: &'a str, offset: usize, depth: usize) -> Self {
        Self {
            s,
            i: 0,
            offset,
            depth,
        }
    }

    pub fn parse(mut self) -> Result<Query, ParseError> {
        if self.s.is_empty() {
            return Err(ParseError::Empty);
        }
        let mut state = State::default();
        let mut token = Token::default();
        while let Some(b) = self.bump() {
            let pos = self.i - 1;
            if token.is_blank() {
                token.start = pos;
            }
            match b {
                ESCAPE => {
                    if token.finalized() {
                        return Err(self.unexpected(pos));
                    }
                    let Some(next) = self.bump() else {
                        return Err(self.unexpected(pos));
                    };
                    token.push_text(next, pos);
                    token.escaped = true;
                }
                SEPARATOR => {
                    self.close(std::mem::take(&mut token), &mut state, pos)?;
                    state.last_sep = Some((b, pos));
                }
                MOVE => {
                    if (state.seen | token.commands).contains(Mode::DELETE) {
                        return Err(self.conflicting(MOVE, Mode::DELETE, pos));
                    }
                    state.moves += 1;
                    if state.moves > 1 {
                        return Err(ParseError::UnexpectedSegments(state.moves + 1));
                    }
                    self.close(std::mem::take(&mut token), &mut state, pos)?;
                    if let Some(node) = state.nodes.last_mut() {
                        node.flags.insert(Mode::MOVE_MARKER);
                    }
                    state.last_sep = Some((b, pos));
                }
                SELF => self.self_ref(&mut token, pos)?,
                APPEND | DELETE | MAKE | MAYBE | OVERWRITE => {
                    self.command(&mut token, &state, b, pos)?;
                }
                OPEN => self.subquery(&mut token, pos)?,
                CLOSE | POSITION | DIALECT => return Err(self.unexpected(pos)),
                _ => {
                    if token.finalized() {
                        return Err(self.unexpected(pos));
                    }
                    token.push_text(b, pos);
                }
            }
        }
        self.finish(token, state)
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.s.as_bytes().get(self.i).copied()?;
        self.i += 1;
        Some(b)
    }

    fn unexpected(&self, pos: usize) -> ParseError {
        let token = self
            .s
            .get(pos..)
            .and_then(|rest| rest.chars().next())
            .unwrap_or(char::REPLACEMENT_CHARACTER);
        ParseError::UnexpectedToken {
            token,
            position: self.offset + pos,
        }
    }

    fn conflicting(&self, command: u8, other: Mode, pos: usize) -> ParseError {
        ParseError::Conflicting {
            command: char::from(command),
            other: command_char(other),
            position: self.offset + pos,
        }
    }

    fn command(
        &self,
        token: &mut Token,
        state: &State,
        b: u8,
        pos: usize,
    ) -> Result<(), ParseError> {
        if token.started() || token.finalized() {
            return Err(self.unexpected(pos));
        }
        let command = match b {
            APPEND => Mode::APPEND,
            DELETE => Mode::DELETE,
            MAKE => Mode::MAKE,
            MAYBE => Mode::MAYBE,
            _ => Mode::OVERWRITE,
        };
        if token.commands.contains(command) {
            return Err(ParseError::Duplicated {
                command: char::from(b),
                position: self.offset + pos,
            });
        }
        let written = state.seen | token.commands;
        let conflicts = match b {
            APPEND => written & (Mode::OVERWRITE | Mode::DELETE),
            MAKE => (token.commands & Mode::MAYBE) | (written & (Mode::DELETE | Mode::OVERWRITE)),
            MAYBE => written & (Mode::OVERWRITE | Mode::MAKE),
            OVERWRITE => written & (Mode::MAYBE | Mode::APPEND | Mode::MAKE | Mode::DELETE),
            _ => {
                // `!` leads the whole query or nothing
                if let Some((sep, _)) = state.last_sep {
                    return Err(ParseError::Conflicting {
                        command: char::from(b),
                        other: char::from(sep),
                        position: self.offset + pos,
                    });
                }
                token.commands
            }
        };
        if let Some(other) = conflicts.iter().next() {
            return Err(self.conflicting(b, other, pos));
        }
        token.commands |= command;
        Ok(())
    }

    fn self_ref(&self, token: &mut Token, pos: usize) -> Result<(), ParseError> {
        if token.started() || token.finalized() {
            return Err(self.unexpected(pos));
        }
        if let Some(other) = token.commands.iter().next() {
            return Err(self.conflicting(SELF, other, pos));
        }
        token.body = Body::SelfRef;
        Ok(())
    }

    fn subquery(&mut self, token: &mut Token, pos: usize) -> Result<(), ParseError> {
        if token.started() || token.finalized() {
            return Err(self.unexpected(pos));
        }
        if token.commands.contains(Mode::APPEND) {
            return Err(self.conflicting(OPEN, Mode::APPEND, pos));
        }
        if self.depth >= MAX_NESTING {
            return Err(ParseError::TooDeep { max: MAX_NESTING });
        }
        let bytes = self.s.as_bytes();
        let start = self.i;
        let mut end = start;
        loop {
            match bytes.get(end) {
                None => return Err(self.unexpected(pos)),
                Some(&ESCAPE) => end += 2,
                Some(&CLOSE) => break,
                Some(_) => end += 1,
            }
        }
        let raw = &self.s[start..end];
        let query = Parser::new(raw, self.offset + start, self.depth + 1).parse()?;
        if query.is_write() || query.is_move() {
            return Err(ParseError::NotWritable(raw.to_string()));
        }
        token.body = Body::Sub {
            raw: raw.to_string(),
            query,
        };
        self.i = end + 1;
        Ok(())
    }

    /// Turn the current token into a node.
    fn close(&self, token: Token, state: &mut State, pos: usize) -> Result<(), ParseError> {
        let started = token.started();
        let mut commands = token.commands;
        if matches!(token.body, Body::SelfRef) {
            commands |= Mode::SELF;
        }
        let (kind, text, value, sub) = match token.body {
            Body::SelfRef => (Kind::Object, String::new(), 0, None),
            Body::Sub { raw, query } => (Kind::Object, raw, 0, Some(query)),
            Body::Text if commands.contains(Mode::APPEND) => {
                if started {
                    return Err(self.unexpected(token.text_start));
                }
                (Kind::Array, String::new(), 0, None)
            }
            Body::Text if !started => {
                let at = if pos < self.s.len() { pos } else { token.start };
                return Err(self.unexpected(at));
            }
            Body::Text => {
                let text = String::from_utf8_lossy(&token.text).into_owned();
                if !token.escaped && text.bytes().all(|b| b.is_ascii_digit()) {
                    let value = text
                        .parse::<u32>()
                        .map_err(|_| ParseError::IndexOverflow(text.clone()))?;
                    (Kind::Array, text, value, None)
                } else {
                    (Kind::Object, text, 0, None)
                }
            }
        };
        let seq = state.nodes.len();
        if seq + 1 >= MAX_DEPTH {
            return Err(ParseError::TooDeep { max: MAX_DEPTH });
        }
        let seq = u8::try_from(seq).map_err(|_| ParseError::TooDeep { max: MAX_DEPTH })?;
        let mut flags = Flags::new(kind, commands, value, seq);
        if sub.is_some() {
            flags.insert(Mode::SUBQUERY);
        }
        state.seen |= commands - Mode::SELF;
        state.nodes.push(Node { text, flags, sub });
        Ok(())
    }

    fn finish(&self, token: Token, mut state: State) -> Result<Query, ParseError> {
        if token.is_blank() {
            match state.last_sep {
                // a single trailing separator is tolerated
                Some((SEPARATOR, _)) => {}
                Some((_, pos)) => return Err(self.unexpected(pos)),
                None => return Err(ParseError::Empty),
            }
        } else {
            self.close(token, &mut state, self.s.len())?;
        }
        if state.nodes.is_empty() {
            return Err(ParseError::Empty);
        }
        let segments = if state.moves == 0 { 0 } else { state.moves + 1 };
        if segments != 0 && segments != 2 {
            return Err(ParseError::UnexpectedSegments(segments));
        }
        Ok(Query::from_nodes(finalize(state)))
    }
}

/// Derive effective flags: path position, forward `Make`, and the global
/// overwrite/delete/indeterministic/write/move bits.
fn finalize(state: State) -> Vec<Node> {
    let mut global = state.seen & (Mode::OVERWRITE | Mode::DELETE);
    if state.seen.contains(Mode::APPEND) {
        global |= Mode::INDETERMINISTIC;
    }
    if state.seen.intersects(WRITE_COMMANDS) {
        global |= Mode::WRITE;
    }
    if state.moves > 0 {
        global |= Mode::MOVE;
    }
    let mut nodes = state.nodes;
    let len = nodes.len();
    let mut make = false;
    for (seq, node) in nodes.iter_mut().enumerate() {
        make |= node.flags.commands().contains(Mode::MAKE);
        let mut mode = global;
        if make {
            mode |= Mode::MAKE;
        }
        if seq == 0 {
            mode |= Mode::ROOT;
        }
        if seq + 1 == len {
            mode |= Mode::LEAF;
        }
        if len == 1 {
            mode |= Mode::SINGLE;
        }
        node.flags.insert(mode);
    }
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_positions_skip_dialect_prefix() {
        let err = parse("~giraffe1v1.a.]").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnexpectedToken {
                token: ']',
                position: 14
            }
        );
    }

    #[test]
    fn subquery_positions_are_absolute() {
        let err = parse("a.[b.@]").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnexpectedToken {
                token: '@',
                position: 5
            }
        );
    }

    #[test]
    fn empty_command_token_reports_command() {
        let err = parse("a.$").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnexpectedToken {
                token: '$',
                position: 2
            }
        );
    }

    #[test]
    fn finalize_sets_position_bits() {
        let q = parse("a.b.c").unwrap();
        let modes: Vec<Mode> = q.nodes().map(|n| n.flags().mode()).collect();
        assert!(modes[0].contains(Mode::ROOT));
        assert!(!modes[1].intersects(Mode::ROOT | Mode::LEAF));
        assert!(modes[2].contains(Mode::LEAF));
        assert!(modes.iter().all(|m| !m.contains(Mode::SINGLE)));
    }
}
