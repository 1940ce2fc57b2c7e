use itertools::Itertools;

use crate::datum::{Datum, Payload};
use crate::errors::{MergeError, Result};
use crate::query::escape;

/// Deep-merge `right` into `left`. Object keys are unioned; overlapping keys
/// must carry equal type tags and, below the objects, equal values.
pub fn merge(left: &Datum, right: &Datum) -> Result<Datum> {
    Ok(merge_at(left, right, &mut Vec::new())?)
}

fn dotted(path: &[&str]) -> String {
    if path.is_empty() {
        return "#".to_string();
    }
    path.iter().map(|name| escape(name)).join(".")
}

fn merge_at<'d>(
    left: &'d Datum,
    right: &'d Datum,
    path: &mut Vec<&'d str>,
) -> std::result::Result<Datum, MergeError> {
    if left.ptr_eq(right) {
        return Ok(left.clone());
    }
    let (lt, rt) = (left.type_tag(), right.type_tag());
    if lt != rt {
        return Err(MergeError::IncompatibleTypes {
            path: dotted(path),
            left: lt,
            right: rt,
        });
    }
    match (left.payload(), right.payload()) {
        (Payload::Object(lmap), Payload::Object(rmap)) => {
            let mut out = lmap.clone();
            for (name, rv) in rmap {
                let merged = match lmap.get(name) {
                    Some(lv) => {
                        path.push(name);
                        let merged = merge_at(lv, rv, path);
                        path.pop();
                        merged?
                    }
                    None => rv.clone(),
                };
                out.insert(name.clone(), merged);
            }
            Ok(Datum::from_map(out))
        }
        (Payload::Array(_), Payload::Array(_)) if left != right => {
            Err(MergeError::UnsupportedArrayMerge(dotted(path)))
        }
        _ if left != right => Err(MergeError::ClashingKeys(dotted(path))),
        _ => Ok(left.clone()),
    }
}
