use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use restool_core::{Operation, ParamLocation};

/// Cache key of one call: the operation name plus a SHA-256 over the
/// arguments that shape the response. Header arguments are left out except
/// `authorization`, so two callers with different credentials never share an
/// entry.
pub fn fingerprint(op: &Operation, args: &Map<String, Value>) -> String {
    let mut relevant = Map::new();
    for (name, value) in args {
        let is_header = op
            .parameter(name)
            .is_some_and(|p| p.location == ParamLocation::Header);
        if !is_header || name.eq_ignore_ascii_case("authorization") {
            relevant.insert(name.clone(), value.clone());
        }
    }

    let mut payload = Map::new();
    payload.insert("args".to_string(), Value::Object(relevant));
    payload.insert("tool".to_string(), Value::String(op.name.clone()));
    let canonical = canonicalize(&Value::Object(payload)).to_string();

    let digest = Sha256::digest(canonical.as_bytes());
    format!("{}:{}", op.name, hex::encode(digest))
}

/// Rebuilds every object with keys in sorted order, whatever map ordering
/// `serde_json` was compiled with.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::new();
            for k in keys {
                sorted.insert(k.clone(), canonicalize(&map[k]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}
