use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::RefError;
use crate::refs::resolve_ref;
use crate::schema::{
    ArraySchema, Bound, NumericSchema, ObjectSchema, Pattern, SchemaArena, SchemaId, SchemaKind,
    SchemaNode, StringSchema,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error(transparent)]
    Ref(#[from] RefError),
    #[error("invalid pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },
}

pub(crate) fn compile(
    arena: &mut SchemaArena,
    doc: &Value,
    schema: &Value,
) -> Result<SchemaId, SchemaError> {
    let Some(r) = schema.get("$ref").and_then(Value::as_str) else {
        let node = build_node(arena, doc, schema)?;
        return Ok(arena.push(node));
    };

    if let Some(id) = arena.refs.get(r) {
        return Ok(*id);
    }
    let target = resolve_ref(doc, r)?;

    // Reserve the slot first so a self-referencing schema lands back on it.
    let id = arena.any();
    arena.refs.insert(r.to_string(), id);
    let node = build_node(arena, doc, target)?;
    arena.replace(id, node);
    Ok(id)
}

fn build_node(
    arena: &mut SchemaArena,
    doc: &Value,
    schema: &Value,
) -> Result<SchemaNode, SchemaError> {
    let (declared, type_nullable) = declared_type(schema);
    let nullable = type_nullable
        || bool_field(schema, "nullable")
        || bool_field(schema, "x-nullable");
    let enum_values = schema.get("enum").and_then(Value::as_array).cloned();

    let kind_name = declared.or_else(|| infer_type(schema));
    let kind = match kind_name {
        Some("string") => SchemaKind::String(StringSchema {
            pattern: compile_pattern(schema)?,
            min_length: usize_field(schema, "minLength"),
            max_length: usize_field(schema, "maxLength"),
        }),
        Some("number") => SchemaKind::Number(numeric(schema)),
        Some("integer") => SchemaKind::Integer(numeric(schema)),
        Some("boolean") => SchemaKind::Boolean,
        Some("array") => {
            let items = match schema.get("items").filter(|v| v.is_object()) {
                Some(items) => Some(compile(arena, doc, items)?),
                None => None,
            };
            SchemaKind::Array(ArraySchema {
                items,
                min_items: usize_field(schema, "minItems"),
                max_items: usize_field(schema, "maxItems"),
            })
        }
        Some("object") => {
            let mut properties = BTreeMap::new();
            if let Some(props) = schema.get("properties").and_then(Value::as_object) {
                for (name, prop) in props {
                    properties.insert(name.clone(), compile(arena, doc, prop)?);
                }
            }
            let required = schema
                .get("required")
                .and_then(Value::as_array)
                .map(|arr| {
                    arr.iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            let additional_properties = !matches!(
                schema.get("additionalProperties"),
                Some(Value::Bool(false))
            );
            SchemaKind::Object(ObjectSchema {
                properties,
                required,
                additional_properties,
            })
        }
        _ => SchemaKind::Any,
    };

    Ok(SchemaNode {
        kind,
        nullable,
        enum_values,
    })
}

/// Reads `type`, accepting the `["string", "null"]` form as nullable.
fn declared_type(schema: &Value) -> (Option<&str>, bool) {
    match schema.get("type") {
        Some(Value::String(s)) => (Some(s.as_str()), false),
        Some(Value::Array(types)) => {
            let nullable = types.iter().any(|t| t.as_str() == Some("null"));
            let first = types
                .iter()
                .filter_map(Value::as_str)
                .find(|t| *t != "null");
            (first, nullable)
        }
        _ => (None, false),
    }
}

fn infer_type(schema: &Value) -> Option<&'static str> {
    if schema.get("properties").is_some() || schema.get("additionalProperties").is_some() {
        Some("object")
    } else if schema.get("items").is_some() {
        Some("array")
    } else {
        None
    }
}

fn compile_pattern(schema: &Value) -> Result<Option<Pattern>, SchemaError> {
    let Some(source) = schema.get("pattern").and_then(Value::as_str) else {
        return Ok(None);
    };
    let regex = regex::Regex::new(source).map_err(|e| SchemaError::Pattern {
        pattern: source.to_string(),
        message: e.to_string(),
    })?;
    Ok(Some(Pattern {
        source: source.to_string(),
        regex,
    }))
}

fn numeric(schema: &Value) -> NumericSchema {
    NumericSchema {
        minimum: bound(schema, "minimum", "exclusiveMinimum"),
        maximum: bound(schema, "maximum", "exclusiveMaximum"),
    }
}

/// OpenAPI 3.0 flags exclusivity with a boolean next to `minimum`; JSON
/// Schema (and OpenAPI 3.1) carries the exclusive bound as a number.
fn bound(schema: &Value, inclusive_key: &str, exclusive_key: &str) -> Option<Bound> {
    let inclusive = schema.get(inclusive_key).and_then(Value::as_f64);
    match schema.get(exclusive_key) {
        Some(Value::Number(n)) => n.as_f64().map(|value| Bound {
            value,
            exclusive: true,
        }),
        Some(Value::Bool(exclusive)) => inclusive.map(|value| Bound {
            value,
            exclusive: *exclusive,
        }),
        _ => inclusive.map(|value| Bound {
            value,
            exclusive: false,
        }),
    }
}

fn usize_field(schema: &Value, key: &str) -> Option<usize> {
    schema
        .get(key)
        .and_then(Value::as_u64)
        .and_then(|n| usize::try_from(n).ok())
}

fn bool_field(schema: &Value, key: &str) -> bool {
    schema.get(key).and_then(Value::as_bool).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn recursive_refs_become_cycles() {
        let doc = json!({
            "components": {"schemas": {"Node": {
                "type": "object",
                "properties": {
                    "children": {"type": "array", "items": {"$ref": "#/components/schemas/Node"}}
                }
            }}}
        });
        let mut arena = SchemaArena::new();
        let id = arena
            .compile(&doc, &json!({"$ref": "#/components/schemas/Node"}))
            .unwrap();
        let SchemaKind::Object(obj) = &arena.get(id).kind else {
            panic!("expected object");
        };
        let children = obj.properties["children"];
        let SchemaKind::Array(arr) = &arena.get(children).kind else {
            panic!("expected array");
        };
        assert_eq!(arr.items, Some(id));
    }

    #[test]
    fn same_ref_is_compiled_once() {
        let doc = json!({"components": {"schemas": {"Id": {"type": "integer"}}}});
        let mut arena = SchemaArena::new();
        let r = json!({"$ref": "#/components/schemas/Id"});
        let a = arena.compile(&doc, &r).unwrap();
        let b = arena.compile(&doc, &r).unwrap();
        assert_eq!(a, b);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn exclusive_bounds_in_both_forms() {
        let mut arena = SchemaArena::new();
        let doc = json!({});
        let old = arena
            .compile(&doc, &json!({"type": "number", "minimum": 1, "exclusiveMinimum": true}))
            .unwrap();
        let new = arena
            .compile(&doc, &json!({"type": "number", "exclusiveMinimum": 1}))
            .unwrap();
        for id in [old, new] {
            let SchemaKind::Number(n) = &arena.get(id).kind else {
                panic!("expected number");
            };
            assert_eq!(n.minimum, Some(Bound { value: 1.0, exclusive: true }));
        }
    }

    #[test]
    fn failed_compile_leaves_no_dangling_refs() {
        let doc = json!({"components": {"schemas": {
            "A": {
                "type": "object",
                "properties": {
                    "b": {"$ref": "#/components/schemas/B"},
                    "code": {"type": "string", "pattern": "(unclosed"}
                }
            },
            "B": {
                "type": "object",
                "properties": {"a": {"$ref": "#/components/schemas/A"}}
            }
        }}});
        let mut arena = SchemaArena::new();
        assert!(arena
            .compile(&doc, &json!({"$ref": "#/components/schemas/A"}))
            .is_err());
        assert!(arena.is_empty());

        // B reaches A again, so it must fail the same way instead of reusing
        // a placeholder left behind by the first attempt.
        assert!(arena
            .compile(&doc, &json!({"$ref": "#/components/schemas/B"}))
            .is_err());
        assert!(arena.is_empty());
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        let mut arena = SchemaArena::new();
        let err = arena
            .compile(&json!({}), &json!({"type": "string", "pattern": "(unclosed"}))
            .unwrap_err();
        assert!(matches!(err, SchemaError::Pattern { .. }));
    }
}
