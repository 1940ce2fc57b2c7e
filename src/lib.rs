//! Path queries over a JSON-like value tree.
//!
//! A [`Query`] is parsed from a compact text form such as `a.$b.+` and then
//! drives reads and writes over a [`Datum`]:
//!
//! ```
//! use datum_query::{Datum, Query};
//!
//! let doc = Datum::from_json(r#"{"a": {"b": [1, 2]}}"#).unwrap();
//! let out = doc.set(&Query::parse("a.b.+").unwrap(), 3).unwrap();
//! assert_eq!(out.get(&Query::parse("a.b.2").unwrap()).unwrap(), Datum::int(3));
//! ```

pub mod cache;
pub mod context;
pub mod convert;
pub mod datum;
pub mod engine;
pub mod errors;
pub mod flags;
pub mod parser;
pub mod query;
pub mod types;

pub use cache::{QueryCache, QueryStore};
pub use context::Context;
pub use convert::IntoDatum;
pub use datum::{Datum, Payload};
pub use errors::{Error, MakeError, MergeError, ParseError, ReadError, Result, TypeError, WriteError};
pub use flags::{Flags, Kind, Mode};
pub use parser::parse;
pub use query::{escape, Query};
pub use types::Type;

/// Convenience: parse JSON text and read `spec` from it.
pub fn query_json(json: &str, spec: &str) -> Result<Datum> {
    let datum = Datum::from_json(json)?;
    let query = parse(spec)?;
    datum.get(&query)
}
