use thiserror::Error;

use crate::types::Type;

/// Failures raised while scanning a query specification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty query")]
    Empty,

    #[error("duplicated command '{command}' at position {position}")]
    Duplicated { command: char, position: usize },

    #[error("command '{command}' conflicts with '{other}' at position {position}")]
    Conflicting {
        command: char,
        other: char,
        position: usize,
    },

    #[error("unexpected token '{token}' at position {position}")]
    UnexpectedToken { token: char, position: usize },

    #[error("unexpected number of segments: {0} (expected 0 or 2)")]
    UnexpectedSegments(usize),

    #[error("query nesting exceeds maximum depth of {max}")]
    TooDeep { max: usize },

    #[error("index '{0}' does not fit the value region")]
    IndexOverflow(String),

    #[error("query '{0}' is not writable")]
    NotWritable(String),
}

/// Failures raised while building a datum from external data.
#[derive(Debug, Error)]
pub enum MakeError {
    #[error("unexpected type {0} for construction")]
    UnexpectedType(Type),

    #[error("invalid source value: {0}")]
    InvalidSource(String),

    #[error("query '{0}' is prohibited during construction")]
    Prohibited(String),

    #[error("duplicate key '{0}'")]
    DuplicateKey(String),

    #[error("marshal error: {0}")]
    Marshal(String),

    #[error("unmarshal error: {0}")]
    Unmarshal(#[from] serde_json::Error),
}

/// Failures raised while reading through a query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    #[error("query '{0}' is indeterministic")]
    Indeterministic(String),

    #[error("query '{0}' is not readonly")]
    NotReadonly(String),

    #[error("index {index} out of bounds (len {len})")]
    OutOfBounds { index: usize, len: usize },

    #[error("missing key '{0}'")]
    MissingKey(String),

    #[error("unexpected type: expected {expected}, found {found}")]
    UnexpectedType { expected: Type, found: Type },

    #[error("integer overflow converting {0}")]
    IntegerOverflow(String),
}

/// Failures raised while writing through a query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WriteError {
    #[error("missing key '{0}'")]
    MissingKey(String),

    #[error("implicit overwrite of '{0}'")]
    ImplicitOverwrite(String),

    #[error("query '{0}' is not a two-segment move query")]
    UnsegmentedMove(String),

    #[error("unexpected value for query '{0}'")]
    UnexpectedValue(String),

    #[error("cannot cast {found} to {expected}")]
    TypeCast { expected: Type, found: Type },
}

/// Failures raised while merging two datums.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    #[error("incompatible types at '{path}': {left} vs {right}")]
    IncompatibleTypes { path: String, left: Type, right: Type },

    #[error("clashing keys at '{0}'")]
    ClashingKeys(String),

    #[error("merge not supported for arrays at '{0}'")]
    UnsupportedArrayMerge(String),
}

/// Failures raised while reading a type tag.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("unparseable type '{0}'")]
    Unparseable(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("make error: {0}")]
    Make(#[from] MakeError),

    #[error("read error: {0}")]
    Read(#[from] ReadError),

    #[error("write error: {0}")]
    Write(#[from] WriteError),

    #[error("merge error: {0}")]
    Merge(#[from] MergeError),

    #[error("type error: {0}")]
    Type(#[from] TypeError),
}

// Type alias for results that use `Error` as the error type
pub type Result<T> = std::result::Result<T, Error>;
