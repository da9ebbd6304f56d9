//! The loaded API description and the read-only views derived from it.

use serde_json::Value;

use crate::error::{DocumentError, ParseError, Violation};
use crate::parser::{parse_document_str, DocumentFormat};
use crate::refs::deref;

/// HTTP methods turned into operations, in catalog order.
pub const OPERATION_METHODS: &[&str] = &["get", "post", "put", "delete", "patch"];

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ApiDocument {
    /// Original location (URL or file path) used to load.
    pub source: String,
    /// Parsed document as JSON value (works for both JSON and YAML inputs).
    pub raw: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecVersion {
    Swagger2,
    OpenApi3,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Endpoint {
    pub method: String,
    pub path: String,
    pub description: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentLoadError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Invalid(#[from] DocumentError),
}

impl ApiDocument {
    /// Parses and structurally validates a document in one step.
    pub fn parse(source: impl Into<String>, text: &str) -> Result<Self, DocumentLoadError> {
        let raw = parse_document_str(text, DocumentFormat::Auto)?;
        Ok(Self::from_value(source, raw)?)
    }

    pub fn from_value(source: impl Into<String>, raw: Value) -> Result<Self, DocumentError> {
        let violations = validate_document(&raw);
        if !violations.is_empty() {
            return Err(DocumentError::new(violations));
        }
        Ok(Self {
            source: source.into(),
            raw,
        })
    }

    pub fn version(&self) -> SpecVersion {
        if self.raw.get("swagger").is_some() {
            SpecVersion::Swagger2
        } else {
            SpecVersion::OpenApi3
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.raw.pointer("/info/title").and_then(Value::as_str)
    }

    /// Flattened `method path description` listing of every operation,
    /// following path items that are `$ref`s.
    pub fn endpoints(&self) -> Vec<Endpoint> {
        let mut out = Vec::new();
        let Some(paths) = self.raw.get("paths").and_then(Value::as_object) else {
            return out;
        };
        for (path, item) in paths {
            // Unresolvable path items are reported by the catalog build.
            let Ok(item) = deref(&self.raw, item) else {
                continue;
            };
            for method in OPERATION_METHODS {
                let Some(op) = item.get(*method).filter(|v| v.is_object()) else {
                    continue;
                };
                out.push(Endpoint {
                    method: method.to_uppercase(),
                    path: path.clone(),
                    description: describe_operation(op, method, path),
                });
            }
        }
        out
    }

    /// The schema section: `components.schemas` for OpenAPI 3, `definitions`
    /// for Swagger 2. Empty object when the document declares none.
    pub fn schemas(&self) -> Value {
        let section = match self.version() {
            SpecVersion::OpenApi3 => self.raw.pointer("/components/schemas"),
            SpecVersion::Swagger2 => self.raw.get("definitions"),
        };
        section
            .cloned()
            .unwrap_or_else(|| Value::Object(Default::default()))
    }
}

pub(crate) fn describe_operation(op: &Value, method: &str, path: &str) -> String {
    ["summary", "description"]
        .iter()
        .filter_map(|k| op.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("{} {path}", method.to_uppercase()))
}

/// Structural checks a document must pass before it is turned into a catalog.
pub fn validate_document(raw: &Value) -> Vec<Violation> {
    let mut out = Vec::new();
    let Some(root) = raw.as_object() else {
        out.push(Violation::new("", "document root must be an object"));
        return out;
    };

    match (root.get("openapi"), root.get("swagger")) {
        (Some(v), _) => match version_string(v) {
            Some(s) if s.starts_with("3.") => {}
            Some(s) => out.push(Violation::new(
                "openapi",
                format!("unsupported OpenAPI version '{s}' (expected 3.x)"),
            )),
            None => out.push(Violation::new("openapi", "must be a version string")),
        },
        (None, Some(v)) => match version_string(v) {
            Some(s) if s == "2.0" || s == "2" => {}
            Some(s) => out.push(Violation::new(
                "swagger",
                format!("unsupported Swagger version '{s}' (expected 2.0)"),
            )),
            None => out.push(Violation::new("swagger", "must be a version string")),
        },
        (None, None) => out.push(Violation::new(
            "",
            "missing 'openapi' or 'swagger' version field",
        )),
    }

    match root.get("info").and_then(Value::as_object) {
        Some(info) => {
            for field in ["title", "version"] {
                if !info.get(field).is_some_and(|v| v.is_string() || v.is_number()) {
                    out.push(Violation::new(
                        format!("info.{field}"),
                        "is required and must be a string",
                    ));
                }
            }
        }
        None => out.push(Violation::new("info", "is required and must be an object")),
    }

    match root.get("paths") {
        Some(Value::Object(paths)) => {
            for (path, item) in paths {
                if !path.starts_with('/') {
                    out.push(Violation::new(
                        format!("paths.{path}"),
                        "path must start with '/'",
                    ));
                }
                if !item.is_object() {
                    out.push(Violation::new(
                        format!("paths.{path}"),
                        "path item must be an object",
                    ));
                }
            }
        }
        Some(_) => out.push(Violation::new("paths", "must be an object")),
        None => out.push(Violation::new("paths", "is required")),
    }

    out
}

fn version_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        // Unquoted YAML versions like `swagger: 2.0` arrive as numbers.
        Value::Number(n) => n.as_f64().map(|f| {
            if f.fract() == 0.0 {
                format!("{f:.1}")
            } else {
                f.to_string()
            }
        }),
        _ => None,
    }
}
