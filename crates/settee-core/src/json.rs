/// Structural comparison of JSON trees.
///
/// CouchDB stores some design document members (`rewrites`, `indexes`) as
/// arbitrary JSON. Two such members agree when their trees agree, not their
/// serialized text:
///
/// ```text
/// null, bool, string   by typed value
/// number               by numeric value (1 == 1.0, 0 == -0.0); integers
///                      exactly, without rounding through f64
/// array                ordered, element by element
/// object               unordered, same key set and per-key value
/// ```
///
/// [`canonical_string`] encodes a tree so that two trees produce the same
/// string exactly when [`json_eq`] holds, which is what hashing and content
/// digests are built on.
use std::hash::{Hash, Hasher};

use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::error::Result;

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// Convert a conventional tree of maps, lists and scalars into a JSON value.
///
/// ```
/// use std::collections::HashMap;
/// use settee_core::json::to_json_tree;
///
/// let mut index = HashMap::new();
/// index.insert("index", "function(doc){....}");
/// let tree = to_json_tree(&HashMap::from([("animal", index)])).unwrap();
/// assert_eq!(tree["animal"]["index"], "function(doc){....}");
/// ```
pub fn to_json_tree<T: Serialize + ?Sized>(tree: &T) -> Result<Value> {
    Ok(serde_json::to_value(tree)?)
}

// ---------------------------------------------------------------------------
// Equality
// ---------------------------------------------------------------------------

/// A JSON number reduced to the value it denotes.
///
/// Integers, and floats holding an integral value in the `i64..=u64` range,
/// become `Int`; every other float stays `Float`. The two variants never
/// denote the same value, so comparing keys is exact and transitive.
#[derive(Debug, Clone, Copy, PartialEq)]
enum NumericKey {
    Int(i128),
    Float(f64),
}

// 2^64, the first float past `u64::MAX`.
const U64_LIMIT: f64 = 18_446_744_073_709_551_616.0;

fn numeric_key(n: &Number) -> NumericKey {
    if let Some(i) = n.as_i64() {
        return NumericKey::Int(i as i128);
    }
    if let Some(u) = n.as_u64() {
        return NumericKey::Int(u as i128);
    }
    let f = n.as_f64().unwrap_or(0.0);
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < U64_LIMIT {
        NumericKey::Int(f as i128)
    } else {
        NumericKey::Float(f)
    }
}

/// Structural equality of two JSON values.
pub fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => numeric_key(a) == numeric_key(b),
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => json_slice_eq(a, b),
        (Value::Object(a), Value::Object(b)) => json_map_eq(a, b),
        _ => false,
    }
}

/// Ordered, element-wise [`json_eq`] of two sequences.
pub fn json_slice_eq(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(ea, eb)| json_eq(ea, eb))
}

/// Unordered [`json_eq`] of two objects: same key set, equal values per key.
pub fn json_map_eq(a: &Map<String, Value>, b: &Map<String, Value>) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .all(|(key, va)| b.get(key).is_some_and(|vb| json_eq(va, vb)))
}

// ---------------------------------------------------------------------------
// Canonical encoding
// ---------------------------------------------------------------------------

/// Encode a value canonically. See [`write_canonical`] for the format.
pub fn canonical_string(v: &Value) -> String {
    let mut out = String::new();
    write_canonical(v, &mut out);
    out
}

/// Append the canonical encoding of `v` to `out`.
///
/// Format:
/// - Null:    `n`
/// - Bool:    `t` / `f`
/// - Number:  `i` + decimal integer when the value is integral and fits
///   `i64`/`u64`, otherwise `d` + shortest round-trip form of the float
/// - String:  `s` + byte length + `:` + raw string
/// - Array:   `[` + elements + `]`
/// - Object:  `{` + (encoded key, encoded value) pairs in key order + `}`
///
/// Strings are length-prefixed, so the encoding is self-delimiting and no
/// escaping is needed.
pub fn write_canonical(v: &Value, out: &mut String) {
    match v {
        Value::Null => out.push('n'),
        Value::Bool(b) => out.push(if *b { 't' } else { 'f' }),
        Value::Number(n) => match numeric_key(n) {
            NumericKey::Int(i) => {
                out.push('i');
                out.push_str(&i.to_string());
            }
            NumericKey::Float(f) => {
                out.push('d');
                out.push_str(&format!("{:?}", f));
            }
        },
        Value::String(s) => write_canonical_str(s, out),
        Value::Array(arr) => {
            out.push('[');
            for elem in arr {
                write_canonical(elem, out);
            }
            out.push(']');
        }
        Value::Object(obj) => write_canonical_map(obj, out),
    }
}

/// Append a length-prefixed string.
pub fn write_canonical_str(s: &str, out: &mut String) {
    out.push('s');
    out.push_str(&s.len().to_string());
    out.push(':');
    out.push_str(s);
}

/// Append an object with its keys in sorted order.
pub fn write_canonical_map(obj: &Map<String, Value>, out: &mut String) {
    let mut keys: Vec<&String> = obj.keys().collect();
    keys.sort();
    out.push('{');
    for key in keys {
        write_canonical_str(key, out);
        write_canonical(&obj[key], out);
    }
    out.push('}');
}

// ---------------------------------------------------------------------------
// Hashing
// ---------------------------------------------------------------------------

/// Feed `v` into `state` consistently with [`json_eq`].
pub fn hash_json<H: Hasher>(v: &Value, state: &mut H) {
    canonical_string(v).hash(state);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
