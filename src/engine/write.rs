use std::collections::btree_map::Entry;

use super::{blank_for, key, read, Key};
use crate::datum::Datum;
use crate::errors::{Error, ParseError, Result, WriteError};
use crate::query::Query;
use crate::types::Type;

/// Write `value` at `query`, returning the new root.
pub fn set(root: &Datum, query: &Query, value: Datum) -> Result<Datum> {
    if query.is_delete() {
        return Err(WriteError::UnexpectedValue(query.spec().to_string()).into());
    }
    if query.is_move() {
        return Err(ParseError::NotWritable(query.spec().to_string()).into());
    }
    let mut out = root.clone();
    assign(root, &mut out, query, value)?;
    Ok(out)
}

/// Remove the value at `query`. Array elements after it shift down. A target
/// that does not exist leaves the tree unchanged.
pub fn delete(root: &Datum, query: &Query) -> Result<Datum> {
    if query.is_move() {
        return Err(ParseError::NotWritable(query.spec().to_string()).into());
    }
    match read::walk(root, root, query) {
        Ok(Some(_)) => {}
        Ok(None) | Err(Error::Read(_)) => return Ok(root.clone()),
        Err(e) => return Err(e),
    }
    let mut out = root.clone();
    remove(root, &mut out, query)?;
    Ok(out)
}

/// Relocate the value addressed by the source segment of a move query to
/// its destination segment.
pub fn move_value(root: &Datum, query: &Query) -> Result<Datum> {
    if !query.is_move() {
        return Err(WriteError::UnsegmentedMove(query.spec().to_string()).into());
    }
    let (source, destination) = query.segments()?;
    let value = read::get(root, &source)?;
    let without = delete(root, &source)?;
    set(&without, &destination, value)
}

/// Run whichever write `query` describes. Delete and move queries take no
/// value; every other query needs one.
pub fn apply(root: &Datum, query: &Query, value: Option<Datum>) -> Result<Datum> {
    let valueless = query.is_delete() || query.is_move();
    match value {
        Some(_) if valueless => Err(WriteError::UnexpectedValue(query.spec().to_string()).into()),
        Some(value) => set(root, query, value),
        None if query.is_delete() => delete(root, query),
        None if query.is_move() => move_value(root, query),
        None => Err(WriteError::UnexpectedValue(query.spec().to_string()).into()),
    }
}

fn cast(expected: Type, found: &Datum) -> Error {
    WriteError::TypeCast {
        expected,
        found: found.type_tag(),
    }
    .into()
}

fn assign(root: &Datum, current: &mut Datum, node: &Query, value: Datum) -> Result<()> {
    match key(root, node)? {
        Key::Current => {
            if !node.is_leaf() {
                return assign(root, current, &node.next(), value);
            }
            if !current.is_nil() && !node.is_overwrite() {
                return Err(WriteError::ImplicitOverwrite(node.to_string()).into());
            }
            *current = value;
            Ok(())
        }
        Key::Attr(name) => {
            if current.is_nil() && node.is_make() {
                *current = Datum::object();
            }
            let Some(map) = current.object_mut() else {
                return Err(cast(Type::OBJECT, current));
            };
            if node.is_leaf() {
                match map.entry(name.into_owned()) {
                    Entry::Occupied(_) if !node.is_overwrite() => {
                        Err(WriteError::ImplicitOverwrite(node.to_string()).into())
                    }
                    Entry::Occupied(mut slot) => {
                        slot.insert(value);
                        Ok(())
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(value);
                        Ok(())
                    }
                }
            } else {
                let next = node.next();
                let child = match map.entry(name.into_owned()) {
                    Entry::Occupied(slot) => slot.into_mut(),
                    Entry::Vacant(slot) if node.is_make() => slot.insert(blank_for(root, &next)?),
                    Entry::Vacant(slot) => return Err(WriteError::MissingKey(slot.into_key()).into()),
                };
                assign(root, child, &next, value)
            }
        }
        Key::Index(index) => {
            if index == 0 && current.is_zero_container() && (node.is_make() || node.is_leaf()) {
                let slot = if node.is_leaf() {
                    value
                } else {
                    let next = node.next();
                    let mut slot = blank_for(root, &next)?;
                    assign(root, &mut slot, &next, value)?;
                    slot
                };
                *current = Datum::array(vec![slot]);
                return Ok(());
            }
            if current.is_nil() && node.is_make() {
                *current = Datum::array(Vec::new());
            }
            let Some(items) = current.array_mut() else {
                return Err(cast(Type::ARRAY, current));
            };
            let Some(slot) = items.get_mut(index) else {
                return Err(WriteError::MissingKey(index.to_string()).into());
            };
            if node.is_leaf() {
                *slot = value;
                return Ok(());
            }
            assign(root, slot, &node.next(), value)
        }
        Key::Append => {
            if current.is_nil() {
                *current = Datum::array(Vec::new());
            }
            let Some(items) = current.array_mut() else {
                return Err(cast(Type::ARRAY, current));
            };
            if node.is_leaf() {
                items.push(value);
                return Ok(());
            }
            let next = node.next();
            let mut slot = blank_for(root, &next)?;
            assign(root, &mut slot, &next, value)?;
            items.push(slot);
            Ok(())
        }
    }
}

fn remove(root: &Datum, current: &mut Datum, node: &Query) -> Result<()> {
    let selected = key(root, node)?;
    if node.is_leaf() {
        match selected {
            Key::Current => *current = Datum::nil(),
            Key::Attr(name) => {
                if let Some(map) = current.object_mut() {
                    map.remove(name.as_ref());
                }
            }
            Key::Index(index) => {
                if let Some(items) = current.array_mut().filter(|items| index < items.len()) {
                    items.remove(index);
                }
            }
            Key::Append => {}
        }
        return Ok(());
    }
    let child = match selected {
        Key::Current => Some(current),
        Key::Attr(name) => current.object_mut().and_then(|map| map.get_mut(name.as_ref())),
        Key::Index(index) => current.array_mut().and_then(|items| items.get_mut(index)),
        Key::Append => None,
    };
    match child {
        Some(child) => remove(root, child, &node.next()),
        None => Ok(()),
    }
}
