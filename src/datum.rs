//! The tagged value tree.
//!
//! A [`Datum`] is a cheap handle to a shared, immutable [`Payload`]. Reads
//! hand out clones of the handle. Writes go through [`Arc::make_mut`], so
//! only the nodes on the mutated path are copied and every sibling stays
//! shared with the original tree.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::convert::{float_text, IntoDatum};
use crate::engine;
use crate::errors::{MakeError, ReadError, Result};
use crate::query::Query;
use crate::types::Type;

/// Payload variants, one per primary kind plus Nil and Array.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Nil,
    Int(BigInt),
    Float(BigDecimal),
    Bool(bool),
    Str(String),
    Array(Vec<Datum>),
    Object(BTreeMap<String, Datum>),
}

#[derive(Clone)]
pub struct Datum {
    inner: Arc<Payload>,
}

impl Default for Datum {
    fn default() -> Self {
        Self::nil()
    }
}

impl Datum {
    pub(crate) fn new(payload: Payload) -> Self {
        Self {
            inner: Arc::new(payload),
        }
    }

    pub fn nil() -> Self {
        Self::new(Payload::Nil)
    }

    /// An empty object.
    pub fn object() -> Self {
        Self::new(Payload::Object(BTreeMap::new()))
    }

    pub fn array(items: Vec<Datum>) -> Self {
        Self::new(Payload::Array(items))
    }

    pub fn from_map(map: BTreeMap<String, Datum>) -> Self {
        Self::new(Payload::Object(map))
    }

    pub fn int(value: impl Into<BigInt>) -> Self {
        Self::new(Payload::Int(value.into()))
    }

    pub fn float(value: BigDecimal) -> Self {
        Self::new(Payload::Float(value))
    }

    pub fn bool(value: bool) -> Self {
        Self::new(Payload::Bool(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(Payload::Str(value.into()))
    }

    /// Build a datum from any supported external value.
    pub fn make_from(value: impl IntoDatum) -> std::result::Result<Self, MakeError> {
        value.into_datum()
    }

    /// Zero value of `t`: `{}`, `[]`, `0`, `0.0`, `false`, `""` or nil.
    pub fn of_empty(t: Type) -> std::result::Result<Self, MakeError> {
        if !t.is_valid() {
            return Err(MakeError::UnexpectedType(t));
        }
        let payload = if t.is_array() {
            Payload::Array(Vec::new())
        } else if t.is_object() {
            Payload::Object(BTreeMap::new())
        } else if t.is_int() {
            Payload::Int(BigInt::default())
        } else if t.is_float() {
            Payload::Float(BigDecimal::default())
        } else if t.is_bool() {
            Payload::Bool(false)
        } else if t.is_string() {
            Payload::Str(String::new())
        } else {
            Payload::Nil
        };
        Ok(Self::new(payload))
    }

    /// Build a tree by writing each value at its query, creating missing
    /// containers on the way.
    pub fn of_pairs<I, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Query, V)>,
        V: IntoDatum,
    {
        let mut seen = HashSet::new();
        let mut out = Self::nil();
        for (query, value) in pairs {
            if query.is_delete() || query.is_move() {
                return Err(MakeError::Prohibited(query.spec().to_string()).into());
            }
            if !query.is_indeterministic() && !seen.insert(query.spec().to_string()) {
                return Err(MakeError::DuplicateKey(query.spec().to_string()).into());
            }
            let target = query.root().with_make().unwrap_or_else(|_| query.root());
            out = out.set(&target, value)?;
        }
        if out.is_nil() {
            return Ok(Self::object());
        }
        Ok(out)
    }

    /// Parse JSON text.
    pub fn from_json(text: &str) -> std::result::Result<Self, MakeError> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        Self::try_from(&value)
    }

    pub fn to_json(&self) -> std::result::Result<serde_json::Value, MakeError> {
        serde_json::Value::try_from(self)
    }

    /// Indented JSON text.
    pub fn pretty(&self) -> std::result::Result<String, MakeError> {
        serde_json::to_string_pretty(self).map_err(|e| MakeError::Marshal(e.to_string()))
    }

    pub fn payload(&self) -> &Payload {
        &self.inner
    }

    pub(crate) fn object_mut(&mut self) -> Option<&mut BTreeMap<String, Datum>> {
        if !self.is_object() {
            return None;
        }
        match Arc::make_mut(&mut self.inner) {
            Payload::Object(map) => Some(map),
            _ => None,
        }
    }

    pub(crate) fn array_mut(&mut self) -> Option<&mut Vec<Datum>> {
        if !self.is_array() {
            return None;
        }
        match Arc::make_mut(&mut self.inner) {
            Payload::Array(items) => Some(items),
            _ => None,
        }
    }

    /// True when both handles share one payload.
    pub fn ptr_eq(&self, other: &Datum) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Type tag derived from the payload. Arrays carry the primary kind of
    /// their elements when all elements agree, and `NIL` when any element
    /// is nil.
    pub fn type_tag(&self) -> Type {
        match self.payload() {
            Payload::Nil => Type::NIL,
            Payload::Int(_) => Type::INT,
            Payload::Float(_) => Type::FLOAT,
            Payload::Bool(_) => Type::BOOL,
            Payload::Str(_) => Type::STRING,
            Payload::Object(_) => Type::OBJECT,
            Payload::Array(items) => {
                let mut t = Type::ARRAY;
                let mut primary = None;
                let mut mixed = false;
                for item in items {
                    if item.is_nil() {
                        t |= Type::NIL;
                        continue;
                    }
                    let p = item.type_tag().primary();
                    match primary {
                        None => primary = Some(p),
                        Some(q) if q != p => mixed = true,
                        Some(_) => {}
                    }
                }
                match primary {
                    Some(p) if !mixed => t | p,
                    _ => t,
                }
            }
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self.payload(), Payload::Nil)
    }

    pub fn is_object(&self) -> bool {
        matches!(self.payload(), Payload::Object(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self.payload(), Payload::Array(_))
    }

    /// Nil or an empty array.
    pub(crate) fn is_zero_container(&self) -> bool {
        match self.payload() {
            Payload::Nil => true,
            Payload::Array(items) => items.is_empty(),
            _ => false,
        }
    }

    /// Child count of an array or object; zero for scalars.
    pub fn len(&self) -> usize {
        match self.payload() {
            Payload::Array(items) => items.len(),
            Payload::Object(map) => map.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn unexpected(&self, expected: Type) -> ReadError {
        ReadError::UnexpectedType {
            expected,
            found: self.type_tag(),
        }
    }

    pub fn as_str(&self) -> std::result::Result<&str, ReadError> {
        match self.payload() {
            Payload::Str(s) => Ok(s),
            _ => Err(self.unexpected(Type::STRING)),
        }
    }

    pub fn as_bool(&self) -> std::result::Result<bool, ReadError> {
        match self.payload() {
            Payload::Bool(b) => Ok(*b),
            _ => Err(self.unexpected(Type::BOOL)),
        }
    }

    pub fn as_big_int(&self) -> std::result::Result<&BigInt, ReadError> {
        match self.payload() {
            Payload::Int(i) => Ok(i),
            _ => Err(self.unexpected(Type::INT)),
        }
    }

    /// Narrow an integer to `i64`.
    pub fn as_i64(&self) -> std::result::Result<i64, ReadError> {
        let i = self.as_big_int()?;
        i64::try_from(i).map_err(|_| ReadError::IntegerOverflow(i.to_string()))
    }

    pub fn as_big_decimal(&self) -> std::result::Result<&BigDecimal, ReadError> {
        match self.payload() {
            Payload::Float(f) => Ok(f),
            _ => Err(self.unexpected(Type::FLOAT)),
        }
    }

    /// Nearest `f64` of a float or integer.
    pub fn as_f64(&self) -> std::result::Result<f64, ReadError> {
        let text = match self.payload() {
            Payload::Float(f) => f.to_string(),
            Payload::Int(i) => i.to_string(),
            _ => return Err(self.unexpected(Type::FLOAT)),
        };
        f64::from_str(&text).map_err(|_| self.unexpected(Type::FLOAT))
    }

    /// Array elements. Cloning the iterator restarts it.
    pub fn iter(&self) -> std::result::Result<std::slice::Iter<'_, Datum>, ReadError> {
        match self.payload() {
            Payload::Array(items) => Ok(items.iter()),
            _ => Err(self.unexpected(Type::ARRAY)),
        }
    }

    /// Object entries in key order. Cloning the iterator restarts it.
    pub fn iter_pairs(
        &self,
    ) -> std::result::Result<impl Iterator<Item = (&str, &Datum)> + Clone, ReadError> {
        match self.payload() {
            Payload::Object(map) => Ok(map.iter().map(|(k, v)| (k.as_str(), v))),
            _ => Err(self.unexpected(Type::OBJECT)),
        }
    }

    pub fn get(&self, query: &Query) -> Result<Datum> {
        engine::get(self, query)
    }

    pub fn has(&self, query: &Query) -> Result<bool> {
        engine::has(self, query)
    }

    pub fn set(&self, query: &Query, value: impl IntoDatum) -> Result<Datum> {
        engine::set(self, query, value.into_datum()?)
    }

    pub fn delete(&self, query: &Query) -> Result<Datum> {
        engine::delete(self, query)
    }

    pub fn move_value(&self, query: &Query) -> Result<Datum> {
        engine::move_value(self, query)
    }

    pub fn apply(&self, query: &Query, value: Option<Datum>) -> Result<Datum> {
        engine::apply(self, query, value)
    }

    pub fn merge(&self, other: &Datum) -> Result<Datum> {
        engine::merge(self, other)
    }

    pub fn tree(&self) -> Result<Vec<Query>> {
        engine::tree(self)
    }
}

impl PartialEq for Datum {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.inner == other.inner
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

impl fmt::Debug for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Datum({self})")
    }
}

/// Numbers are written as `serde_json::Number` so big integers and decimals
/// keep every digit. This relies on serde_json's `arbitrary_precision`
/// representation, so the impl is only meant for serde_json serializers;
/// other formats see serde_json's private number struct instead of a number.
impl Serialize for Datum {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.payload() {
            Payload::Nil => serializer.serialize_unit(),
            Payload::Int(i) => serde_json::Number::from_str(&i.to_string())
                .map_err(S::Error::custom)?
                .serialize(serializer),
            Payload::Float(f) => serde_json::Number::from_str(&float_text(f))
                .map_err(S::Error::custom)?
                .serialize(serializer),
            Payload::Bool(b) => serializer.serialize_bool(*b),
            Payload::Str(s) => serializer.serialize_str(s),
            Payload::Array(items) => serializer.collect_seq(items),
            Payload::Object(map) => serializer.collect_map(map),
        }
    }
}

impl<'de> Deserialize<'de> for Datum {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Datum::try_from(&value).map_err(serde::de::Error::custom)
    }
}
