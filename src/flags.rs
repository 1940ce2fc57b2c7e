//! Per-node query flags.
//!
//! A node's structural kind is a closed [`Kind`]; its command modifiers and
//! path-position bits live in the orthogonal [`Mode`] set. The numeric
//! payload (array index) and the sequence number sit beside them in
//! [`Flags`]. [`Flags::word`] packs all four regions into one 64-bit word
//! for compact display and hashing.

use std::fmt;

/// A path holds fewer than this many nodes.
pub const MAX_DEPTH: usize = 255;

const SEQ_SHIFT: u32 = 32;
const MODE_SHIFT: u32 = 40;
const KIND_SHIFT: u32 = 56;

/// Structural kind of a query node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    Object,
    Array,
}

bitflags::bitflags! {
    /// Independent mode bits of a query node.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Mode: u32 {
        /// `#`: the node addresses the current value.
        const SELF = 1 << 0;
        /// `=`: an existing leaf may be replaced.
        const OVERWRITE = 1 << 1;
        /// The result position is not fixed ahead of time (append).
        const INDETERMINISTIC = 1 << 2;
        /// `?`: a missing segment resolves to nil.
        const MAYBE = 1 << 3;
        /// `$`: missing containers are created.
        const MAKE = 1 << 4;
        /// `+`: push onto an array.
        const APPEND = 1 << 5;
        /// `!`: remove the target.
        const DELETE = 1 << 6;
        /// Query has a source and a destination segment.
        const MOVE = 1 << 7;
        /// Last node of the source segment.
        const MOVE_MARKER = 1 << 8;
        const ROOT = 1 << 9;
        const LEAF = 1 << 10;
        /// Path of length one.
        const SINGLE = 1 << 11;
        /// Query carries a write command somewhere.
        const WRITE = 1 << 12;
        /// Bracketed key resolved at evaluation time.
        const SUBQUERY = 1 << 13;
    }
}

impl Default for Mode {
    fn default() -> Self {
        Mode::empty()
    }
}

/// Commands a user can write in a token.
pub const COMMANDS: Mode = Mode::SELF
    .union(Mode::OVERWRITE)
    .union(Mode::MAYBE)
    .union(Mode::MAKE)
    .union(Mode::APPEND)
    .union(Mode::DELETE);

/// Commands that turn a query into a write query.
pub const WRITE_COMMANDS: Mode = Mode::OVERWRITE
    .union(Mode::MAKE)
    .union(Mode::APPEND)
    .union(Mode::DELETE);

// Rendering order of the command prefix. `!` must lead so the rebuilt text
// passes the first-command rule again.
const PREFIX: [(Mode, char); 6] = [
    (Mode::DELETE, '!'),
    (Mode::OVERWRITE, '='),
    (Mode::MAYBE, '?'),
    (Mode::APPEND, '+'),
    (Mode::MAKE, '$'),
    (Mode::SELF, '#'),
];

/// Command character for a single command bit.
pub fn command_char(command: Mode) -> char {
    PREFIX
        .iter()
        .find(|(mode, _)| command.contains(*mode))
        .map_or('?', |(_, c)| *c)
}

/// Kind, mode, index value and sequence of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Flags {
    kind: Kind,
    mode: Mode,
    commands: Mode,
    value: u32,
    seq: u8,
}

impl Flags {
    pub(crate) fn new(kind: Kind, commands: Mode, value: u32, seq: u8) -> Self {
        let commands = commands.intersection(COMMANDS);
        Self {
            kind,
            mode: commands,
            commands,
            value,
            seq,
        }
    }

    pub(crate) fn insert(&mut self, mode: Mode) {
        self.mode.insert(mode);
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Effective mode bits after path post-processing.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Commands as written in the node's token.
    pub fn commands(&self) -> Mode {
        self.commands
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn seq(&self) -> usize {
        usize::from(self.seq)
    }

    pub fn is_array(&self) -> bool {
        self.kind == Kind::Array
    }

    pub fn is_object(&self) -> bool {
        self.kind == Kind::Object
    }

    pub fn is_self(&self) -> bool {
        self.mode.contains(Mode::SELF)
    }

    pub fn is_overwrite(&self) -> bool {
        self.mode.contains(Mode::OVERWRITE)
    }

    pub fn is_indeterministic(&self) -> bool {
        self.mode.contains(Mode::INDETERMINISTIC)
    }

    pub fn is_maybe(&self) -> bool {
        self.mode.contains(Mode::MAYBE)
    }

    pub fn is_make(&self) -> bool {
        self.mode.contains(Mode::MAKE)
    }

    pub fn is_append(&self) -> bool {
        self.mode.contains(Mode::APPEND)
    }

    pub fn is_delete(&self) -> bool {
        self.mode.contains(Mode::DELETE)
    }

    pub fn is_move(&self) -> bool {
        self.mode.contains(Mode::MOVE)
    }

    pub fn is_move_marker(&self) -> bool {
        self.mode.contains(Mode::MOVE_MARKER)
    }

    pub fn is_root(&self) -> bool {
        self.mode.contains(Mode::ROOT)
    }

    pub fn is_leaf(&self) -> bool {
        self.mode.contains(Mode::LEAF)
    }

    pub fn is_single(&self) -> bool {
        self.mode.contains(Mode::SINGLE)
    }

    pub fn is_write(&self) -> bool {
        self.mode.contains(Mode::WRITE)
    }

    pub fn is_subquery(&self) -> bool {
        self.mode.contains(Mode::SUBQUERY)
    }

    /// Command prefix that re-derives the written commands, e.g. `=?`.
    pub fn prefix(&self) -> String {
        Self::prefix_of(self.commands)
    }

    pub(crate) fn prefix_of(commands: Mode) -> String {
        PREFIX
            .iter()
            .filter(|(mode, _)| commands.contains(*mode))
            .map(|(_, c)| *c)
            .collect()
    }

    /// All regions packed: value (bits 0-31), sequence (32-39), mode
    /// (40-53), kind (56 object, 57 array).
    pub fn word(&self) -> u64 {
        let kind = match self.kind {
            Kind::Object => 1u64 << KIND_SHIFT,
            Kind::Array => 1u64 << (KIND_SHIFT + 1),
        };
        u64::from(self.value)
            | u64::from(self.seq) << SEQ_SHIFT
            | u64::from(self.mode.bits()) << MODE_SHIFT
            | kind
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.word())
    }
}
