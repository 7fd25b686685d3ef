//! The raw value type stored in [`crate::block::Block::Entry`] leaves.
//!
//! Scalars are represented with `serde_json::Value`, the same choice the teacher datastore makes
//! for the same reason: it's a convenient, human-readable representation for
//! null/bool/integer/float/string/list/map, and `arbitrary_precision` covers the "integer
//! (arbitrary precision acceptable)" requirement without inventing a bespoke numeric type.

/// A raw entry value: null, bool, arbitrary-precision number, string, list, or nested map.
pub type Value = serde_json::Value;

/// Coercion rules for the typed accessors in [`crate::section`].
///
/// Each `as_*` function returns `None` when the value is present but not coercible to the
/// requested type (per §7, this is a non-error: "typed accessors return a default when the value
/// is present but not coercible").
pub fn as_string(v: &Value) -> Option<String> {
    v.as_str().map(str::to_owned)
}

pub fn as_char(v: &Value) -> Option<char> {
    let s = v.as_str()?;
    let mut chars = s.chars();
    let first = chars.next()?;
    if chars.next().is_none() {
        Some(first)
    } else {
        None
    }
}

pub fn as_bool(v: &Value) -> Option<bool> {
    v.as_bool()
}

pub fn as_i64(v: &Value) -> Option<i64> {
    v.as_i64()
}

pub fn as_u8(v: &Value) -> Option<u8> {
    v.as_i64().and_then(|i| u8::try_from(i).ok())
}

pub fn as_i16(v: &Value) -> Option<i16> {
    v.as_i64().and_then(|i| i16::try_from(i).ok())
}

pub fn as_i32(v: &Value) -> Option<i32> {
    v.as_i64().and_then(|i| i32::try_from(i).ok())
}

pub fn as_f32(v: &Value) -> Option<f32> {
    v.as_f64().map(|f| f as f32)
}

pub fn as_f64(v: &Value) -> Option<f64> {
    v.as_f64()
}

/// Arbitrary-precision integer accessor: returns the number's exact decimal text when the value
/// is a JSON number, regardless of magnitude (enabled by the `arbitrary_precision` serde_json
/// feature).
pub fn as_bigint_str(v: &Value) -> Option<String> {
    v.as_number().map(|n| n.to_string())
}

pub fn as_list(v: &Value) -> Option<Vec<Value>> {
    v.as_array().cloned()
}

/// Typed list accessor: returns `Some` only if every element coerces via `f`.
pub fn as_typed_list<T>(v: &Value, f: impl Fn(&Value) -> Option<T>) -> Option<Vec<T>> {
    let arr = v.as_array()?;
    arr.iter().map(&f).collect()
}
