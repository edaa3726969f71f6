//! Environment variable overrides for the JSON config.
//!
//! `QQBRIDGE_GATEWAY__PORT=9000` becomes `{"gateway": {"port": 9000}}`.
//! Path segments are lowercased and mapped from `snake_case` to the config
//! file's camelCase keys, so `QQBRIDGE_CHANNELS__QQ__APP_ID` targets
//! `channels.qq.appId`.

use serde_json::{Map, Number, Value};
use tracing::debug;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "QQBRIDGE_";
/// Delimiter between nested path segments
pub const ENV_DELIMITER: &str = "__";

/// Coerce a raw environment value into JSON.
///
/// Order: `true`/`false` (any case), integer, float, JSON array/object,
/// then the literal string.
pub fn parse_env_value(value: &str) -> Value {
    if value.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if value.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if let Ok(i) = value.parse::<i64>() {
        return Value::Number(i.into());
    }
    if let Ok(u) = value.parse::<u64>() {
        return Value::Number(u.into());
    }
    // Non-finite floats ("inf", "NaN") have no JSON form and stay strings
    if let Ok(f) = value.parse::<f64>()
        && let Some(n) = Number::from_f64(f)
    {
        return Value::Number(n);
    }
    if (value.starts_with('[') || value.starts_with('{'))
        && let Ok(parsed) = serde_json::from_str::<Value>(value)
    {
        return parsed;
    }
    Value::String(value.to_string())
}

/// Convert a lowercased `snake_case` segment to camelCase.
fn snake_to_camel(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut upper_next = false;
    for c in segment.chars() {
        if c == '_' {
            upper_next = !out.is_empty();
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Build a nested override object from `(key, value)` pairs.
///
/// Pairs without the prefix, or with an empty path segment, are ignored.
pub fn env_overrides<I, K, V>(vars: I) -> Value
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut root = Map::new();
    for (key, value) in vars {
        let Some(rest) = key.as_ref().strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let path: Vec<String> = rest
            .to_lowercase()
            .split(ENV_DELIMITER)
            .map(snake_to_camel)
            .collect();
        if path.iter().any(String::is_empty) {
            debug!("ignoring malformed override variable {}", key.as_ref());
            continue;
        }
        insert_path(&mut root, &path, parse_env_value(value.as_ref()));
    }
    Value::Object(root)
}

fn insert_path(root: &mut Map<String, Value>, path: &[String], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };
    let mut current = root;
    for part in parents {
        let entry = current
            .entry(part.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        let Value::Object(next) = entry else {
            return;
        };
        current = next;
    }
    current.insert(last.clone(), value);
}

/// Deep merge two JSON values. `overlay` wins; objects merge recursively,
/// anything else is replaced.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}
