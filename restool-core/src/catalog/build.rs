use std::collections::HashSet;

use serde_json::{json, Value};

use crate::catalog::model::{
    BuildDiagnostic, Catalog, CatalogBuild, Operation, ParamLocation, Parameter,
};
use crate::catalog::naming::{fallback_name, template_tokens, unique_name};
use crate::document::{describe_operation, ApiDocument, OPERATION_METHODS};
use crate::error::RefError;
use crate::refs::deref;
use crate::schema::{SchemaArena, SchemaError};

/// Keys of a Swagger 2 non-body parameter that are parameter metadata rather
/// than schema.
const PARAMETER_KEYS: &[&str] = &["name", "in", "required", "description", "allowEmptyValue"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Ref(#[from] RefError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("duplicate parameter name '{0}'")]
    DuplicateParameter(String),
    #[error("path token '{{{0}}}' has no matching path parameter")]
    UnmatchedPathToken(String),
}

/// Derives the catalog from a validated document.
///
/// Operations that cannot be derived are skipped and reported in
/// `diagnostics`; the rest of the catalog is still built.
pub fn build_catalog(doc: &ApiDocument) -> CatalogBuild {
    let raw = &doc.raw;
    let mut arena = SchemaArena::new();
    let mut operations = Vec::new();
    let mut taken = HashSet::new();
    let mut diagnostics = Vec::new();

    let Some(paths) = raw.get("paths").and_then(Value::as_object) else {
        return CatalogBuild::default();
    };

    for (path, item) in paths {
        let item = match deref(raw, item) {
            Ok(item) => item,
            Err(e) => {
                diagnostics.push(diagnostic("*", path, e.to_string()));
                continue;
            }
        };
        for method in OPERATION_METHODS {
            let Some(op) = item.get(*method).filter(|v| v.is_object()) else {
                continue;
            };
            let mut ctx = OperationContext {
                raw,
                arena: &mut arena,
                method,
                path,
                diagnostics: &mut diagnostics,
            };
            match ctx.build(item, op) {
                Ok(mut operation) => {
                    operation.name = unique_name(&taken, &operation.name);
                    taken.insert(operation.name.clone());
                    operations.push(operation);
                }
                Err(e) => diagnostics.push(diagnostic(method, path, e.to_string())),
            }
        }
    }

    CatalogBuild {
        catalog: Catalog::new(operations, arena),
        diagnostics,
    }
}

struct OperationContext<'d, 'm> {
    raw: &'d Value,
    arena: &'m mut SchemaArena,
    method: &'d str,
    path: &'d str,
    diagnostics: &'m mut Vec<BuildDiagnostic>,
}

impl<'d> OperationContext<'d, '_> {
    fn build(&mut self, path_item: &'d Value, op: &'d Value) -> Result<Operation, BuildError> {
        let name = op
            .get("operationId")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| fallback_name(self.method, self.path));

        let mut parameters: Vec<Parameter> = Vec::new();
        for declared in self.merged_parameters(path_item, op)? {
            let Some(param) = self.parameter(declared)? else {
                continue;
            };
            push_unique(&mut parameters, param)?;
        }

        let mut body_description = None;
        if let Some(rb) = op.get("requestBody") {
            let rb = deref(self.raw, rb)?;
            body_description = rb
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string);
            if let Some(param) = self.request_body(rb)? {
                push_unique(&mut parameters, param)?;
            }
        }

        for token in template_tokens(self.path) {
            let matches = parameters
                .iter()
                .filter(|p| p.location == ParamLocation::Path && p.name == token)
                .count();
            if matches != 1 {
                return Err(BuildError::UnmatchedPathToken(token));
            }
        }

        Ok(Operation {
            name,
            method: self.method.to_uppercase(),
            path: self.path.to_string(),
            description: describe_operation(op, self.method, self.path),
            parameters,
            body_description,
        })
    }

    /// Path-item parameters overlaid by operation parameters (same `in` and
    /// `name` means the operation wins), with `$ref`s resolved.
    fn merged_parameters(
        &self,
        path_item: &'d Value,
        op: &'d Value,
    ) -> Result<Vec<&'d Value>, BuildError> {
        let mut merged: Vec<&'d Value> = Vec::new();
        let lists = [path_item.get("parameters"), op.get("parameters")];
        for list in lists.into_iter().flatten() {
            let Some(list) = list.as_array() else {
                continue;
            };
            for p in list {
                let p = deref(self.raw, p)?;
                let key = (p.get("in"), p.get("name"));
                match merged
                    .iter_mut()
                    .find(|m| (m.get("in"), m.get("name")) == key)
                {
                    Some(slot) => *slot = p,
                    None => merged.push(p),
                }
            }
        }
        Ok(merged)
    }

    fn parameter(&mut self, p: &'d Value) -> Result<Option<Parameter>, BuildError> {
        let name = p
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| BuildError::InvalidParameter("parameter without a name".to_string()))?;
        let location = match p.get("in").and_then(Value::as_str) {
            Some("path") => ParamLocation::Path,
            Some("query") => ParamLocation::Query,
            Some("header") => ParamLocation::Header,
            Some("body") => return self.swagger_body(p).map(Some),
            Some(other) => {
                self.diagnostics.push(diagnostic(
                    self.method,
                    self.path,
                    format!("parameter '{name}' in '{other}' is not supported; skipped"),
                ));
                return Ok(None);
            }
            None => {
                return Err(BuildError::InvalidParameter(format!(
                    "parameter '{name}' has no 'in'"
                )))
            }
        };

        // Swagger 2 puts the schema keywords on the parameter itself.
        let source = match p.get("schema") {
            Some(s) => s.clone(),
            None if p.get("type").is_some() => strip_parameter_keys(p),
            None => Value::Null,
        };
        let (schema, raw_schema, declared_type) = self.schema(&source, "string")?;

        Ok(Some(Parameter {
            name: name.to_string(),
            location,
            // Path parameters cannot be optional.
            required: location == ParamLocation::Path || bool_field(p, "required"),
            declared_type,
            description: string_field(p, "description"),
            raw_schema,
            schema,
        }))
    }

    /// Swagger 2 `in: body` parameter.
    fn swagger_body(&mut self, p: &'d Value) -> Result<Parameter, BuildError> {
        let source = p.get("schema").cloned().unwrap_or(Value::Null);
        let (schema, raw_schema, _) = self.schema(&source, "object")?;
        Ok(body_parameter(
            bool_field(p, "required"),
            string_field(p, "description"),
            raw_schema,
            schema,
        ))
    }

    /// OpenAPI 3 `requestBody`; only JSON media types become a `body` parameter.
    fn request_body(&mut self, rb: &'d Value) -> Result<Option<Parameter>, BuildError> {
        let content = rb.get("content").and_then(Value::as_object);
        let media = content.and_then(|c| {
            c.get("application/json").or_else(|| {
                c.iter()
                    .find(|(ct, _)| is_json_media_type(ct))
                    .map(|(_, m)| m)
            })
        });
        let Some(media) = media else {
            if content.is_some_and(|c| !c.is_empty()) {
                self.diagnostics.push(diagnostic(
                    self.method,
                    self.path,
                    "request body has no JSON media type; not exposed as a parameter".to_string(),
                ));
            }
            return Ok(None);
        };
        let source = media.get("schema").cloned().unwrap_or(Value::Null);
        let (schema, raw_schema, _) = self.schema(&source, "object")?;
        Ok(Some(body_parameter(
            bool_field(rb, "required"),
            string_field(rb, "description"),
            raw_schema,
            schema,
        )))
    }

    fn schema(
        &mut self,
        source: &Value,
        default_type: &str,
    ) -> Result<(crate::schema::SchemaId, Value, String), BuildError> {
        if source.is_null() {
            return Ok((
                self.arena.any(),
                json!({ "type": default_type }),
                default_type.to_string(),
            ));
        }
        let id = self.arena.compile(self.raw, source)?;
        let resolved = deref(self.raw, source)?.clone();
        let declared_type = schema_type(&resolved).unwrap_or(default_type).to_string();
        Ok((id, resolved, declared_type))
    }
}

fn body_parameter(
    required: bool,
    description: Option<String>,
    raw_schema: Value,
    schema: crate::schema::SchemaId,
) -> Parameter {
    Parameter {
        name: "body".to_string(),
        location: ParamLocation::Body,
        required,
        declared_type: "object".to_string(),
        description,
        raw_schema,
        schema,
    }
}

fn push_unique(parameters: &mut Vec<Parameter>, param: Parameter) -> Result<(), BuildError> {
    if parameters.iter().any(|p| p.name == param.name) {
        return Err(BuildError::DuplicateParameter(param.name));
    }
    parameters.push(param);
    Ok(())
}

fn schema_type(schema: &Value) -> Option<&str> {
    match schema.get("type") {
        Some(Value::String(s)) => Some(s.as_str()),
        Some(Value::Array(types)) => types.iter().filter_map(Value::as_str).find(|t| *t != "null"),
        _ if schema.get("properties").is_some() => Some("object"),
        _ if schema.get("items").is_some() => Some("array"),
        _ => None,
    }
}

fn strip_parameter_keys(p: &Value) -> Value {
    let mut schema = p.clone();
    if let Some(obj) = schema.as_object_mut() {
        for key in PARAMETER_KEYS {
            obj.remove(*key);
        }
    }
    schema
}

fn is_json_media_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

fn bool_field(v: &Value, key: &str) -> bool {
    v.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn string_field(v: &Value, key: &str) -> Option<String> {
    v.get(key).and_then(Value::as_str).map(str::to_string)
}

fn diagnostic(method: &str, path: &str, message: String) -> BuildDiagnostic {
    BuildDiagnostic {
        method: method.to_uppercase(),
        path: path.to_string(),
        message,
    }
}
