//! Parsed, immutable query paths.
//!
//! A [`Query`] is one position inside a path produced by the parser. All
//! positions of the same parse share one `Arc`'d node vector; navigation
//! only changes the index. Reconstruction (`with_make`, `plus`, ...) renders
//! a new specification string and parses it again.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;

use crate::errors::{ParseError, ReadError, Result, WriteError};
use crate::flags::{Flags, Kind, Mode};
use crate::parser::{self, ESCAPE, RESERVED};

/// One parsed path segment.
#[derive(Debug)]
pub(crate) struct Node {
    /// Attribute name, index digits, or bracketed sub-query literal.
    pub(crate) text: String,
    pub(crate) flags: Flags,
    pub(crate) sub: Option<Query>,
}

#[derive(Debug)]
struct Path {
    nodes: Vec<Node>,
    spec: String,
}

/// A position in a parsed query path.
#[derive(Clone)]
pub struct Query {
    path: Arc<Path>,
    seq: usize,
}

impl Query {
    /// Parse a query specification. Same as [`parser::parse`].
    pub fn parse(spec: &str) -> std::result::Result<Self, ParseError> {
        parser::parse(spec)
    }

    pub(crate) fn from_nodes(nodes: Vec<Node>) -> Self {
        let spec = render(&nodes, None, written);
        Self {
            path: Arc::new(Path { nodes, spec }),
            seq: 0,
        }
    }

    fn node(&self) -> &Node {
        &self.path.nodes[self.seq]
    }

    fn at(&self, seq: usize) -> Self {
        Self {
            path: Arc::clone(&self.path),
            seq,
        }
    }

    pub fn root(&self) -> Self {
        self.at(0)
    }

    pub fn leaf(&self) -> Self {
        self.at(self.len() - 1)
    }

    /// The preceding node.
    ///
    /// # Panics
    ///
    /// When called on the root; check [`Query::is_root`] first.
    pub fn prev(&self) -> Self {
        assert!(!self.is_root(), "prev() called on the root of '{}'", self.spec());
        self.at(self.seq - 1)
    }

    /// The following node.
    ///
    /// # Panics
    ///
    /// When called on the leaf; check [`Query::is_leaf`] first.
    pub fn next(&self) -> Self {
        assert!(!self.is_leaf(), "next() called on the leaf of '{}'", self.spec());
        self.at(self.seq + 1)
    }

    /// Every node of the path, root first.
    pub fn nodes(&self) -> impl Iterator<Item = Query> + '_ {
        (0..self.len()).map(move |seq| self.at(seq))
    }

    /// Number of nodes in the path.
    pub fn len(&self) -> usize {
        self.path.nodes.len()
    }

    /// Always false: the parser never produces an empty path.
    pub fn is_empty(&self) -> bool {
        self.path.nodes.is_empty()
    }

    pub fn seq(&self) -> usize {
        self.seq
    }

    pub fn flags(&self) -> Flags {
        self.node().flags
    }

    pub fn kind(&self) -> Kind {
        self.node().flags.kind()
    }

    /// Attribute name, index digits, or sub-query literal of this node.
    pub fn text(&self) -> &str {
        &self.node().text
    }

    /// Array index addressed by this node, if it is a plain index.
    pub fn index(&self) -> Option<usize> {
        let flags = self.flags();
        (flags.is_array() && !flags.is_append() && !flags.is_subquery())
            .then(|| flags.value() as usize)
    }

    /// Parsed bracketed sub-query of a dynamic node.
    pub fn subquery(&self) -> Option<&Query> {
        self.node().sub.as_ref()
    }

    /// Canonical specification of the whole path, without markers.
    pub fn spec(&self) -> &str {
        &self.path.spec
    }

    pub fn is_root(&self) -> bool {
        self.flags().is_root()
    }

    pub fn is_leaf(&self) -> bool {
        self.flags().is_leaf()
    }

    pub fn is_single(&self) -> bool {
        self.flags().is_single()
    }

    pub fn is_self(&self) -> bool {
        self.flags().is_self()
    }

    pub fn is_append(&self) -> bool {
        self.flags().is_append()
    }

    pub fn is_maybe(&self) -> bool {
        self.flags().is_maybe()
    }

    pub fn is_make(&self) -> bool {
        self.flags().is_make()
    }

    pub fn is_overwrite(&self) -> bool {
        self.flags().is_overwrite()
    }

    pub fn is_delete(&self) -> bool {
        self.flags().is_delete()
    }

    pub fn is_move(&self) -> bool {
        self.flags().is_move()
    }

    pub fn is_write(&self) -> bool {
        self.flags().is_write()
    }

    pub fn is_indeterministic(&self) -> bool {
        self.flags().is_indeterministic()
    }

    pub fn is_dynamic(&self) -> bool {
        self.flags().is_subquery()
    }

    /// Append `other` as trailing segments and parse the result.
    pub fn plus(&self, other: &Query) -> std::result::Result<Query, ParseError> {
        parser::parse(&format!("{}.{}", self.spec(), other.spec()))
    }

    /// Append one literal attribute name and parse the result.
    pub fn plus_text(&self, text: &str) -> std::result::Result<Query, ParseError> {
        if text.is_empty() {
            return Err(ParseError::UnexpectedToken {
                token: '.',
                position: self.spec().len(),
            });
        }
        parser::parse(&format!("{}.{}", self.spec(), escape(text)))
    }

    /// Same path with `$` written on this node.
    pub fn with_make(&self) -> std::result::Result<Query, ParseError> {
        self.rebuild(|commands| commands | Mode::MAKE)
    }

    /// Same path with `=` written on this node.
    pub fn with_overwrite(&self) -> std::result::Result<Query, ParseError> {
        self.rebuild(|commands| commands | Mode::OVERWRITE)
    }

    /// Same path with `=` removed from this node.
    pub fn without_overwrite(&self) -> std::result::Result<Query, ParseError> {
        self.rebuild(|commands| commands - Mode::OVERWRITE)
    }

    fn rebuild(&self, edit: impl FnOnce(Mode) -> Mode) -> std::result::Result<Query, ParseError> {
        let commands = edit(self.flags().commands());
        let seq = self.seq;
        let spec = render(&self.path.nodes, None, |i, node| {
            if i == seq {
                commands
            } else {
                written(i, node)
            }
        });
        Ok(parser::parse(&spec)?.at(self.seq))
    }

    /// Split a move query into its source and destination queries.
    pub fn segments(&self) -> Result<(Query, Query)> {
        let nodes = &self.path.nodes;
        let marker = nodes
            .iter()
            .position(|node| node.flags.is_move_marker())
            .filter(|_| self.is_move())
            .ok_or_else(|| WriteError::UnsegmentedMove(self.spec().to_string()))?;
        let (head, tail) = nodes.split_at(marker + 1);
        // `=` is global and `$` runs forward, so both belong to the destination
        let mut carried = Mode::empty();
        if self.is_overwrite() {
            carried |= Mode::OVERWRITE;
        }
        if head.iter().any(|node| node.flags.commands().contains(Mode::MAKE)) {
            carried |= Mode::MAKE;
        }
        let source = render(head, None, |_, node| {
            node.flags.commands() - (Mode::OVERWRITE | Mode::MAKE)
        });
        let destination = render(tail, None, |i, node| {
            if i == 0 {
                node.flags.commands() | carried
            } else {
                node.flags.commands()
            }
        });
        Ok((parser::parse(&source)?, parser::parse(&destination)?))
    }

    pub fn must_be_readonly(&self) -> std::result::Result<(), ReadError> {
        if self.is_write() || self.is_move() {
            return Err(ReadError::NotReadonly(self.spec().to_string()));
        }
        Ok(())
    }
}

/// Escape `text` so that it parses back as one attribute segment.
pub fn escape(text: &str) -> String {
    let numeric = !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit());
    let mut out = String::with_capacity(text.len() + 1);
    for (i, c) in text.chars().enumerate() {
        let reserved = u8::try_from(c).is_ok_and(|b| RESERVED.contains(&b));
        if reserved || (numeric && i == 0) {
            out.push(char::from(ESCAPE));
        }
        out.push(c);
    }
    out
}

fn written(_: usize, node: &Node) -> Mode {
    node.flags.commands()
}

/// Render nodes back to a specification. `marker` places `@` before that
/// node; `commands` picks the commands written on each node.
fn render(
    nodes: &[Node],
    marker: Option<usize>,
    commands: impl Fn(usize, &Node) -> Mode,
) -> String {
    let mut out = String::new();
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            out.push(if nodes[i - 1].flags.is_move_marker() { '>' } else { '.' });
        }
        if marker == Some(i) {
            out.push('@');
        }
        out.push_str(&Flags::prefix_of(commands(i, node)));
        let flags = node.flags;
        if flags.is_subquery() {
            out.push('[');
            out.push_str(&node.text);
            out.push(']');
        } else if flags.is_array() && !flags.is_append() {
            out.push_str(&flags.value().to_string());
        } else {
            // self and append nodes carry no text
            out.push_str(&escape(&node.text));
        }
    }
    out
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.seq == 0 {
            return f.write_str(self.spec());
        }
        f.write_str(&render(&self.path.nodes, Some(self.seq), written))
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marked = if self.is_indeterministic() {
            format!("~{self}")
        } else {
            self.to_string()
        };
        f.debug_struct("Query")
            .field("spec", &marked)
            .field("flags", &format_args!("{}", self.flags()))
            .finish()
    }
}

impl PartialEq for Query {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq && self.spec() == other.spec()
    }
}

impl Eq for Query {}

impl Hash for Query {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.spec().hash(state);
        self.seq.hash(state);
    }
}

impl PartialOrd for Query {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Query {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.spec(), self.seq).cmp(&(other.spec(), other.seq))
    }
}

impl FromStr for Query {
    type Err = ParseError;

    fn from_str(spec: &str) -> std::result::Result<Self, Self::Err> {
        parser::parse(spec)
    }
}
