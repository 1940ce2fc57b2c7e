//! Closed set of external representations a [`Datum`] can be built from.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use serde_json::{Number, Value};

use crate::datum::{Datum, Payload};
use crate::errors::MakeError;

/// Conversion into a datum. Implemented for every supported source type;
/// anything else fails to compile rather than at runtime.
pub trait IntoDatum {
    fn into_datum(self) -> Result<Datum, MakeError>;
}

impl IntoDatum for Datum {
    fn into_datum(self) -> Result<Datum, MakeError> {
        Ok(self)
    }
}

impl IntoDatum for &Datum {
    fn into_datum(self) -> Result<Datum, MakeError> {
        Ok(self.clone())
    }
}

impl IntoDatum for bool {
    fn into_datum(self) -> Result<Datum, MakeError> {
        Ok(Datum::bool(self))
    }
}

impl IntoDatum for String {
    fn into_datum(self) -> Result<Datum, MakeError> {
        Ok(Datum::string(self))
    }
}

impl IntoDatum for &str {
    fn into_datum(self) -> Result<Datum, MakeError> {
        Ok(Datum::string(self))
    }
}

impl IntoDatum for BigInt {
    fn into_datum(self) -> Result<Datum, MakeError> {
        Ok(Datum::int(self))
    }
}

impl IntoDatum for BigDecimal {
    fn into_datum(self) -> Result<Datum, MakeError> {
        Ok(Datum::float(self))
    }
}

impl IntoDatum for f64 {
    fn into_datum(self) -> Result<Datum, MakeError> {
        if !self.is_finite() {
            return Err(MakeError::InvalidSource(self.to_string()));
        }
        BigDecimal::from_str(&self.to_string())
            .map(Datum::float)
            .map_err(|e| MakeError::InvalidSource(e.to_string()))
    }
}

impl IntoDatum for f32 {
    fn into_datum(self) -> Result<Datum, MakeError> {
        f64::from(self).into_datum()
    }
}

macro_rules! int_into_datum {
    ($($t:ty),*) => {
        $(
            impl IntoDatum for $t {
                fn into_datum(self) -> Result<Datum, MakeError> {
                    Ok(Datum::int(BigInt::from(self)))
                }
            }
        )*
    };
}

int_into_datum!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl<T: IntoDatum> IntoDatum for Option<T> {
    fn into_datum(self) -> Result<Datum, MakeError> {
        match self {
            Some(value) => value.into_datum(),
            None => Ok(Datum::nil()),
        }
    }
}

impl<T: IntoDatum> IntoDatum for Vec<T> {
    fn into_datum(self) -> Result<Datum, MakeError> {
        let items = self
            .into_iter()
            .map(IntoDatum::into_datum)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Datum::array(items))
    }
}

impl<T: IntoDatum> IntoDatum for BTreeMap<String, T> {
    fn into_datum(self) -> Result<Datum, MakeError> {
        let map = self
            .into_iter()
            .map(|(k, v)| Ok((k, v.into_datum()?)))
            .collect::<Result<BTreeMap<_, _>, MakeError>>()?;
        Ok(Datum::from_map(map))
    }
}

impl<T: IntoDatum> IntoDatum for HashMap<String, T> {
    fn into_datum(self) -> Result<Datum, MakeError> {
        self.into_iter().collect::<BTreeMap<_, _>>().into_datum()
    }
}

impl IntoDatum for Value {
    fn into_datum(self) -> Result<Datum, MakeError> {
        Datum::try_from(&self)
    }
}

impl IntoDatum for &Value {
    fn into_datum(self) -> Result<Datum, MakeError> {
        Datum::try_from(self)
    }
}

/// JSON text for a float. Integral values keep a fractional part so the
/// number reads back as a float.
pub(crate) fn float_text(f: &BigDecimal) -> String {
    let text = f.to_string();
    if text.contains(|c: char| c == '.' || c == 'e' || c == 'E') {
        text
    } else {
        format!("{text}.0")
    }
}

fn number_into_datum(n: &Number) -> Result<Datum, MakeError> {
    let text = n.to_string();
    if text.contains(|c: char| c == '.' || c == 'e' || c == 'E') {
        BigDecimal::from_str(&text)
            .map(Datum::float)
            .map_err(|e| MakeError::InvalidSource(format!("{text}: {e}")))
    } else {
        BigInt::from_str(&text)
            .map(Datum::int)
            .map_err(|e| MakeError::InvalidSource(format!("{text}: {e}")))
    }
}

impl TryFrom<&Value> for Datum {
    type Error = MakeError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Null => Ok(Datum::nil()),
            Value::Bool(b) => Ok(Datum::bool(*b)),
            Value::Number(n) => number_into_datum(n),
            Value::String(s) => Ok(Datum::string(s.as_str())),
            Value::Array(items) => items
                .iter()
                .map(Datum::try_from)
                .collect::<Result<Vec<_>, _>>()
                .map(Datum::array),
            Value::Object(map) => map
                .iter()
                .map(|(k, v)| Ok((k.clone(), Datum::try_from(v)?)))
                .collect::<Result<BTreeMap<_, _>, MakeError>>()
                .map(Datum::from_map),
        }
    }
}

impl TryFrom<&Datum> for Value {
    type Error = MakeError;

    fn try_from(datum: &Datum) -> Result<Self, Self::Error> {
        let number = |text: String| {
            Number::from_str(&text)
                .map(Value::Number)
                .map_err(|e| MakeError::Marshal(format!("{text}: {e}")))
        };
        match datum.payload() {
            Payload::Nil => Ok(Value::Null),
            Payload::Bool(b) => Ok(Value::Bool(*b)),
            Payload::Int(i) => number(i.to_string()),
            Payload::Float(f) => number(float_text(f)),
            Payload::Str(s) => Ok(Value::String(s.clone())),
            Payload::Array(items) => items
                .iter()
                .map(Value::try_from)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Payload::Object(map) => map
                .iter()
                .map(|(k, v)| Ok((k.clone(), Value::try_from(v)?)))
                .collect::<Result<serde_json::Map<_, _>, MakeError>>()
                .map(Value::Object),
        }
    }
}
