use itertools::Itertools;

use super::{key, Key};
use crate::datum::{Datum, Payload};
use crate::errors::{Error, ReadError, Result};
use crate::parser;
use crate::query::{escape, Query};
use crate::types::Type;

/// Value addressed by `query`. A `?` node that finds nothing yields nil.
pub fn get(root: &Datum, query: &Query) -> Result<Datum> {
    if query.is_indeterministic() {
        return Err(ReadError::Indeterministic(query.spec().to_string()).into());
    }
    query.must_be_readonly()?;
    Ok(walk(root, root, query)?.cloned().unwrap_or_default())
}

/// Whether `query` addresses an existing value. Absence and untraversable
/// structure both answer false.
pub fn has(root: &Datum, query: &Query) -> Result<bool> {
    query.must_be_readonly()?;
    match walk(root, root, query) {
        Ok(found) => Ok(found.is_some()),
        Err(Error::Read(
            ReadError::MissingKey(_) | ReadError::OutOfBounds { .. } | ReadError::UnexpectedType { .. },
        )) => Ok(false),
        Err(e) => Err(e),
    }
}

/// One query per leaf of the object nesting, depth first in key order.
/// The empty key has no segment form, so it and everything below it are
/// left out.
pub fn tree(root: &Datum) -> Result<Vec<Query>> {
    let mut specs = Vec::new();
    collect(root, &mut Vec::new(), &mut specs);
    specs
        .iter()
        .map(|spec| parser::parse(spec).map_err(Error::from))
        .collect()
}

fn collect<'d>(current: &'d Datum, path: &mut Vec<&'d str>, out: &mut Vec<String>) {
    match current.payload() {
        Payload::Object(map) if !map.is_empty() => {
            for (name, child) in map.iter().filter(|(name, _)| !name.is_empty()) {
                path.push(name);
                collect(child, path, out);
                path.pop();
            }
        }
        _ if path.is_empty() => {}
        _ => out.push(path.iter().map(|name| escape(name)).join(".")),
    }
}

fn mismatch(expected: Type, found: &Datum) -> Error {
    ReadError::UnexpectedType {
        expected,
        found: found.type_tag(),
    }
    .into()
}

/// Follow `node` and its successors down from `current`. `None` means a
/// `?` node found nothing.
pub(crate) fn walk<'d>(root: &Datum, current: &'d Datum, node: &Query) -> Result<Option<&'d Datum>> {
    let maybe = node.is_maybe();
    let found = match key(root, node)? {
        Key::Current => Some(current),
        Key::Attr(name) => match current.payload() {
            Payload::Object(map) => match map.get(name.as_ref()) {
                Some(child) => Some(child),
                None if maybe => None,
                None => return Err(ReadError::MissingKey(name.into_owned()).into()),
            },
            Payload::Nil if maybe => None,
            _ => return Err(mismatch(Type::OBJECT, current)),
        },
        Key::Index(index) => match current.payload() {
            Payload::Array(items) => match items.get(index) {
                Some(child) => Some(child),
                None if maybe => None,
                None => {
                    return Err(ReadError::OutOfBounds {
                        index,
                        len: items.len(),
                    }
                    .into())
                }
            },
            Payload::Nil if maybe => None,
            _ => return Err(mismatch(Type::ARRAY, current)),
        },
        Key::Append => return Err(ReadError::Indeterministic(node.spec().to_string()).into()),
    };
    match found {
        Some(child) if !node.is_leaf() => walk(root, child, &node.next()),
        other => Ok(other),
    }
}
