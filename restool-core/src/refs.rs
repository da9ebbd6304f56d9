use std::collections::HashSet;

use serde_json::Value;

use crate::error::RefError;

/// Follows a chain of same-document `$ref`s until a non-reference node is
/// reached. Only local refs (`#/...`) are supported.
pub fn resolve_ref<'a>(doc: &'a Value, ref_str: &str) -> Result<&'a Value, RefError> {
    let mut visited = HashSet::new();
    let mut current = ref_str.to_string();
    loop {
        let target = resolve_once(doc, &current, &mut visited)?;
        match target.get("$ref").and_then(Value::as_str) {
            Some(next) => current = next.to_string(),
            None => return Ok(target),
        }
    }
}

/// Resolves `node` if it is a `{"$ref": ...}` object; returns it unchanged
/// otherwise.
pub fn deref<'a>(doc: &'a Value, node: &'a Value) -> Result<&'a Value, RefError> {
    match node.get("$ref").and_then(Value::as_str) {
        Some(r) => resolve_ref(doc, r),
        None => Ok(node),
    }
}

fn resolve_once<'a>(
    doc: &'a Value,
    ref_str: &str,
    visited: &mut HashSet<String>,
) -> Result<&'a Value, RefError> {
    if !ref_str.starts_with('#') {
        return Err(RefError::External(ref_str.to_string()));
    }
    if !visited.insert(ref_str.to_string()) {
        return Err(RefError::Cycle(ref_str.to_string()));
    }
    let pointer = ref_str.trim_start_matches('#');
    // Keys in pointers may be percent-encoded (e.g. `%7B` for `{`).
    let decoded = percent_decode(pointer);
    doc.pointer(&decoded)
        .ok_or_else(|| RefError::NotFound(ref_str.to_string()))
}

fn percent_decode(s: &str) -> String {
    if !s.contains('%') {
        return s.to_string();
    }
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_val(bytes[i + 1]), hex_val(bytes[i + 2])) {
                out.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_val(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}
