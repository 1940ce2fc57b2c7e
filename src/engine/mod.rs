//! Query-driven operations over a [`Datum`].
//!
//! Every operation walks a parsed path node by node, starting at the node it
//! is handed. Writes never touch their input: they clone the root handle and
//! mutate the clone, which copies exactly the payloads on the walked path.

mod merge;
mod read;
mod write;

use std::borrow::Cow;

use num_bigint::BigInt;

use crate::datum::{Datum, Payload};
use crate::errors::{ReadError, Result};
use crate::query::Query;
use crate::types::Type;

pub use merge::merge;
pub use read::{get, has, tree};
pub use write::{apply, delete, move_value, set};

/// What a single query node selects inside the current datum.
#[derive(Debug, PartialEq)]
pub(crate) enum Key<'q> {
    /// `#`: the current datum itself.
    Current,
    Attr(Cow<'q, str>),
    Index(usize),
    /// `+`: one past the end of an array.
    Append,
}

/// Resolve the key addressed by `node`. Bracketed sub-queries are evaluated
/// against `root`: a string selects an attribute, an integer an index.
pub(crate) fn key<'q>(root: &Datum, node: &'q Query) -> Result<Key<'q>> {
    if node.is_self() {
        return Ok(Key::Current);
    }
    if node.is_append() {
        return Ok(Key::Append);
    }
    if let Some(sub) = node.subquery() {
        let resolved = get(root, sub)?;
        return match resolved.payload() {
            Payload::Str(name) => Ok(Key::Attr(Cow::Owned(name.clone()))),
            Payload::Int(i) => Ok(Key::Index(to_index(i)?)),
            _ => Err(ReadError::UnexpectedType {
                expected: Type::STRING,
                found: resolved.type_tag(),
            }
            .into()),
        };
    }
    Ok(match node.index() {
        Some(i) => Key::Index(i),
        None => Key::Attr(Cow::Borrowed(node.text())),
    })
}

fn to_index(i: &BigInt) -> std::result::Result<usize, ReadError> {
    usize::try_from(i).map_err(|_| ReadError::IntegerOverflow(i.to_string()))
}

/// Empty container shaped for the key `next` will select.
pub(crate) fn blank_for(root: &Datum, next: &Query) -> Result<Datum> {
    Ok(match key(root, next)? {
        Key::Current => Datum::nil(),
        Key::Attr(_) => Datum::object(),
        Key::Index(_) | Key::Append => Datum::array(Vec::new()),
    })
}
