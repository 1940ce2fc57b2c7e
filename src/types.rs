//! Type tags for datum values.
//!
//! A [`Type`] carries at most one *primary* kind (object, int, float, bool,
//! string) and any of two *modifiers*: `NIL` (absence is permitted) and
//! `ARRAY` (a list of the primary kind). The canonical text form is the
//! primary name optionally followed by `[]` and then `?`, e.g. `str[]?`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::TypeError;

bitflags::bitflags! {
    /// Bitmask over the seven value kinds.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct Type: u16 {
        /// Absent value permitted.
        const NIL = 1 << 0;
        /// List of the primary kind.
        const ARRAY = 1 << 1;
        const OBJECT = 1 << 4;
        const INT = 1 << 5;
        const FLOAT = 1 << 6;
        const BOOL = 1 << 7;
        const STRING = 1 << 8;
        /// Error sentinel: every primary bit set at once.
        const INVALID = Self::OBJECT.bits()
            | Self::INT.bits()
            | Self::FLOAT.bits()
            | Self::BOOL.bits()
            | Self::STRING.bits();
    }
}

/// Modifier region.
pub const MODIFIERS: Type = Type::NIL.union(Type::ARRAY);

/// Primary-kind region.
pub const PRIMARY: Type = Type::INVALID;

const NAMES: [(Type, &str); 5] = [
    (Type::OBJECT, "obj"),
    (Type::INT, "int"),
    (Type::FLOAT, "float"),
    (Type::BOOL, "bool"),
    (Type::STRING, "str"),
];

const ANY: &str = "any";

impl Type {
    /// Primary kind bits only.
    pub fn primary(self) -> Type {
        self.intersection(PRIMARY)
    }

    /// Modifier bits only.
    pub fn modifiers(self) -> Type {
        self.intersection(MODIFIERS)
    }

    /// False for the error sentinel and any other multi-primary value.
    pub fn is_valid(self) -> bool {
        self.primary().bits().count_ones() <= 1
    }

    pub fn is_nil(self) -> bool {
        self.contains(Type::NIL)
    }

    pub fn is_array(self) -> bool {
        self.contains(Type::ARRAY)
    }

    pub fn is_object(self) -> bool {
        self.primary() == Type::OBJECT
    }

    pub fn is_int(self) -> bool {
        self.primary() == Type::INT
    }

    pub fn is_float(self) -> bool {
        self.primary() == Type::FLOAT
    }

    pub fn is_bool(self) -> bool {
        self.primary() == Type::BOOL
    }

    pub fn is_string(self) -> bool {
        self.primary() == Type::STRING
    }

    /// Parse the canonical text form. Unknown text yields [`Type::INVALID`].
    pub fn parse(text: &str) -> Type {
        text.parse().unwrap_or(Type::INVALID)
    }
}

impl FromStr for Type {
    type Err = TypeError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut t = Type::empty();
        let mut rest = text;
        if let Some(stripped) = rest.strip_suffix('?') {
            t |= Type::NIL;
            rest = stripped;
        }
        if let Some(stripped) = rest.strip_suffix("[]") {
            t |= Type::ARRAY;
            rest = stripped;
        }
        if rest == ANY {
            return Ok(t);
        }
        NAMES
            .iter()
            .find(|(_, name)| *name == rest)
            .map(|(primary, _)| t | *primary)
            .ok_or_else(|| TypeError::Unparseable(text.to_string()))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_valid() {
            return f.write_str("invalid");
        }
        let primary = self.primary();
        let name = NAMES
            .iter()
            .find(|(t, _)| *t == primary)
            .map_or(ANY, |(_, name)| *name);
        f.write_str(name)?;
        if self.is_array() {
            f.write_str("[]")?;
        }
        if self.is_nil() {
            f.write_str("?")?;
        }
        Ok(())
    }
}

impl Serialize for Type {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Type {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
