//! Parameter and body schemas.
//!
//! Schemas are compiled once into a [`SchemaArena`]: every local `$ref` is
//! resolved at compile time, so recursive definitions become cycles between
//! arena slots and validation never has to look at the source document again.

mod compile;
mod validate;

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

pub use compile::SchemaError;
pub use validate::{validate, SchemaViolation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct SchemaId(usize);

#[derive(Debug, Clone, Default)]
pub struct SchemaArena {
    nodes: Vec<SchemaNode>,
    refs: HashMap<String, SchemaId>,
}

#[derive(Debug, Clone)]
pub struct SchemaNode {
    pub kind: SchemaKind,
    pub nullable: bool,
    pub enum_values: Option<Vec<Value>>,
}

#[derive(Debug, Clone)]
pub enum SchemaKind {
    /// No (supported) type information; every value is accepted.
    Any,
    String(StringSchema),
    Number(NumericSchema),
    Integer(NumericSchema),
    Boolean,
    Array(ArraySchema),
    Object(ObjectSchema),
}

#[derive(Debug, Clone, Default)]
pub struct StringSchema {
    pub pattern: Option<Pattern>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct Pattern {
    pub source: String,
    pub regex: regex::Regex,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NumericSchema {
    pub minimum: Option<Bound>,
    pub maximum: Option<Bound>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bound {
    pub value: f64,
    pub exclusive: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ArraySchema {
    pub items: Option<SchemaId>,
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct ObjectSchema {
    pub properties: BTreeMap<String, SchemaId>,
    pub required: Vec<String>,
    pub additional_properties: bool,
}

impl SchemaKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            SchemaKind::Any => "any",
            SchemaKind::String(_) => "string",
            SchemaKind::Number(_) => "number",
            SchemaKind::Integer(_) => "integer",
            SchemaKind::Boolean => "boolean",
            SchemaKind::Array(_) => "array",
            SchemaKind::Object(_) => "object",
        }
    }
}

impl SchemaArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: SchemaId) -> &SchemaNode {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Compiles `schema` (which may itself be a `$ref`) against `doc`.
    ///
    /// On error the arena is left exactly as it was: nodes and memoized refs
    /// added during the failed compile are dropped, so no surviving ref can
    /// point at a half-built slot.
    pub fn compile(&mut self, doc: &Value, schema: &Value) -> Result<SchemaId, SchemaError> {
        let mark = self.nodes.len();
        compile::compile(self, doc, schema).inspect_err(|_| self.rollback(mark))
    }

    fn rollback(&mut self, mark: usize) {
        self.nodes.truncate(mark);
        self.refs.retain(|_, id| id.0 < mark);
    }

    /// A node that accepts anything, for parameters without a schema.
    pub fn any(&mut self) -> SchemaId {
        self.push(SchemaNode {
            kind: SchemaKind::Any,
            nullable: false,
            enum_values: None,
        })
    }

    fn push(&mut self, node: SchemaNode) -> SchemaId {
        self.nodes.push(node);
        SchemaId(self.nodes.len() - 1)
    }

    fn replace(&mut self, id: SchemaId, node: SchemaNode) {
        self.nodes[id.0] = node;
    }
}
