use serde_json::Value;

// Shared nullish placeholder for missing lookups
pub(crate) static NULL: Value = Value::Null;

pub fn is_undefined_or_null(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

/// Emptiness as used everywhere in the model layer: null, an empty array, an
/// empty string (optionally trimmed first) or an object with no keys.
/// Booleans and numbers are never empty.
pub fn is_empty(value: &Value, trim: bool) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::String(s) if trim => s.trim().is_empty(),
        Value::String(s) => s.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

pub fn is_boolean(value: &Value) -> bool {
    match value {
        Value::Bool(_) => true,
        Value::String(s) => s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("false"),
        _ => false,
    }
}

/// Strings are compared case-insensitively against "true", real booleans are
/// kept and everything else (nullish included) is `false`.
pub fn to_boolean(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

pub fn self_or_default<'a>(value: Option<&'a Value>, default: &'a Value) -> &'a Value {
    match value {
        Some(v) if !v.is_null() => v,
        _ => default,
    }
}

// Reads `source[alias]`, falling back to `source[key]` when the alias is nullish.
// Non-object sources read as absent.
pub(crate) fn lookup<'a>(source: &'a Value, alias: &str, key: &str) -> &'a Value {
    let by_alias = source.get(alias);
    if !is_undefined_or_null(by_alias) {
        return by_alias.unwrap_or(&NULL);
    }
    self_or_default(source.get(key), &NULL)
}
