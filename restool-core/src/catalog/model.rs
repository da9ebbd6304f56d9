use std::collections::HashMap;

use serde_json::{json, Map, Value};

use crate::catalog::naming::template_tokens;
use crate::schema::{SchemaArena, SchemaId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    Path,
    Query,
    Header,
    Body,
}

impl ParamLocation {
    pub fn as_str(self) -> &'static str {
        match self {
            ParamLocation::Path => "path",
            ParamLocation::Query => "query",
            ParamLocation::Header => "header",
            ParamLocation::Body => "body",
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Parameter {
    pub name: String,
    pub location: ParamLocation,
    pub required: bool,
    pub declared_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The declared schema with its top-level `$ref` resolved, for display.
    pub raw_schema: Value,
    #[serde(skip)]
    pub schema: SchemaId,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Operation {
    pub name: String,
    /// Uppercase HTTP method.
    pub method: String,
    pub path: String,
    pub description: String,
    pub parameters: Vec<Parameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_description: Option<String>,
}

impl Operation {
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Only GET responses are memoized.
    pub fn is_cacheable(&self) -> bool {
        self.method == "GET"
    }

    pub fn path_tokens(&self) -> Vec<String> {
        template_tokens(&self.path)
    }

    pub fn required_names(&self) -> impl Iterator<Item = &str> {
        self.parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
    }

    /// JSON Schema describing the argument map this operation accepts.
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        for p in &self.parameters {
            let mut schema = p.raw_schema.clone();
            if let (Some(obj), Some(desc)) = (schema.as_object_mut(), &p.description) {
                obj.entry("description")
                    .or_insert_with(|| Value::String(desc.clone()));
            }
            properties.insert(p.name.clone(), schema);
        }
        let required: Vec<&str> = self.required_names().collect();
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    pub fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name.clone(),
            description: self.description.clone(),
            method: self.method.clone(),
            path: self.path.clone(),
            input_schema: self.input_schema(),
        }
    }
}

/// What a caller needs to present and invoke one operation.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub method: String,
    pub path: String,
    pub input_schema: Value,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    operations: Vec<Operation>,
    index: HashMap<String, usize>,
    arena: SchemaArena,
}

impl Catalog {
    pub(crate) fn new(operations: Vec<Operation>, arena: SchemaArena) -> Self {
        let index = operations
            .iter()
            .enumerate()
            .map(|(i, op)| (op.name.clone(), i))
            .collect();
        Self {
            operations,
            index,
            arena,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Operation> {
        self.index.get(name).map(|i| &self.operations[*i])
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.operations.iter().map(|op| op.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn arena(&self) -> &SchemaArena {
        &self.arena
    }

    pub fn listing(&self) -> Vec<ToolDescriptor> {
        self.operations.iter().map(Operation::descriptor).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct BuildDiagnostic {
    pub method: String,
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for BuildDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}: {}", self.method, self.path, self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CatalogBuild {
    pub catalog: Catalog,
    pub diagnostics: Vec<BuildDiagnostic>,
}
