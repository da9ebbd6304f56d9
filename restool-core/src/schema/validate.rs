use serde_json::Value;

use crate::schema::{Bound, NumericSchema, SchemaArena, SchemaId, SchemaKind, StringSchema};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Parameter '{path}' {message}")]
pub struct SchemaViolation {
    pub path: String,
    pub message: String,
}

impl SchemaViolation {
    fn new(path: &str, message: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

/// Checks `value` against the schema at `id`, stopping at the first problem.
///
/// `value` is `None` when the argument or property is absent; `required` says
/// whether the surrounding context (parameter or parent object) demands it.
pub fn validate(
    arena: &SchemaArena,
    id: SchemaId,
    value: Option<&Value>,
    path: &str,
    required: bool,
) -> Result<(), SchemaViolation> {
    let node = arena.get(id);
    let value = match value {
        None | Some(Value::Null) => {
            if node.nullable || !required {
                return Ok(());
            }
            return Err(SchemaViolation::new(path, "is required"));
        }
        Some(v) => v,
    };

    match &node.kind {
        SchemaKind::Any => {}
        SchemaKind::String(s) => {
            let Some(text) = value.as_str() else {
                return Err(type_mismatch(path, "string", value));
            };
            check_string(path, s, text)?;
        }
        SchemaKind::Number(n) => {
            let Some(x) = value.as_f64() else {
                return Err(type_mismatch(path, "number", value));
            };
            check_numeric(path, n, x)?;
        }
        SchemaKind::Integer(n) => {
            if !is_integer(value) {
                return Err(type_mismatch(path, "integer", value));
            }
            check_numeric(path, n, value.as_f64().unwrap_or_default())?;
        }
        SchemaKind::Boolean => {
            if !value.is_boolean() {
                return Err(type_mismatch(path, "boolean", value));
            }
        }
        SchemaKind::Array(a) => {
            let Some(items) = value.as_array() else {
                return Err(type_mismatch(path, "array", value));
            };
            if let Some(min) = a.min_items {
                if items.len() < min {
                    return Err(SchemaViolation::new(
                        path,
                        format!("must contain at least {min} items"),
                    ));
                }
            }
            if let Some(max) = a.max_items {
                if items.len() > max {
                    return Err(SchemaViolation::new(
                        path,
                        format!("must contain at most {max} items"),
                    ));
                }
            }
            if let Some(item_schema) = a.items {
                for (i, item) in items.iter().enumerate() {
                    validate(arena, item_schema, Some(item), &format!("{path}[{i}]"), true)?;
                }
            }
        }
        SchemaKind::Object(o) => {
            let Some(map) = value.as_object() else {
                return Err(type_mismatch(path, "object", value));
            };
            for name in &o.required {
                if !map.contains_key(name) {
                    return Err(SchemaViolation::new(
                        &format!("{path}.{name}"),
                        "is required",
                    ));
                }
            }
            for (name, prop_schema) in &o.properties {
                if let Some(prop) = map.get(name) {
                    let required = o.required.iter().any(|r| r == name);
                    validate(
                        arena,
                        *prop_schema,
                        Some(prop),
                        &format!("{path}.{name}"),
                        required,
                    )?;
                }
            }
            if !o.additional_properties {
                if let Some(extra) = map.keys().find(|k| !o.properties.contains_key(*k)) {
                    return Err(SchemaViolation::new(
                        path,
                        format!("has unexpected property '{extra}'"),
                    ));
                }
            }
        }
    }

    if let Some(allowed) = &node.enum_values {
        if !allowed.iter().any(|a| json_eq(a, value)) {
            let listed = allowed
                .iter()
                .map(Value::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            return Err(SchemaViolation::new(
                path,
                format!("must be one of [{listed}]"),
            ));
        }
    }

    Ok(())
}

fn check_string(path: &str, s: &StringSchema, text: &str) -> Result<(), SchemaViolation> {
    let len = text.chars().count();
    if let Some(min) = s.min_length {
        if len < min {
            return Err(SchemaViolation::new(
                path,
                format!("must be at least {min} characters long"),
            ));
        }
    }
    if let Some(max) = s.max_length {
        if len > max {
            return Err(SchemaViolation::new(
                path,
                format!("must be at most {max} characters long"),
            ));
        }
    }
    if let Some(p) = &s.pattern {
        if !p.regex.is_match(text) {
            return Err(SchemaViolation::new(
                path,
                format!("does not match pattern '{}'", p.source),
            ));
        }
    }
    Ok(())
}

fn check_numeric(path: &str, n: &NumericSchema, x: f64) -> Result<(), SchemaViolation> {
    if let Some(Bound { value, exclusive }) = n.minimum {
        let ok = if exclusive { x > value } else { x >= value };
        if !ok {
            let op = if exclusive { ">" } else { ">=" };
            return Err(SchemaViolation::new(path, format!("must be {op} {value}")));
        }
    }
    if let Some(Bound { value, exclusive }) = n.maximum {
        let ok = if exclusive { x < value } else { x <= value };
        if !ok {
            let op = if exclusive { "<" } else { "<=" };
            return Err(SchemaViolation::new(path, format!("must be {op} {value}")));
        }
    }
    Ok(())
}

fn is_integer(v: &Value) -> bool {
    match v {
        Value::Number(n) => {
            n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0)
        }
        _ => false,
    }
}

/// Equality that treats `1` and `1.0` as the same number.
fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn type_mismatch(path: &str, expected: &str, got: &Value) -> SchemaViolation {
    SchemaViolation::new(
        path,
        format!("must be of type {expected} (got {})", json_type(got)),
    )
}

fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
