use serde_json::{Map, Value};

use crate::catalog::model::{Catalog, Operation};
use crate::schema::{validate, SchemaViolation};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgumentError {
    #[error("Missing required parameters: {}", .0.join(", "))]
    Missing(Vec<String>),
    #[error(transparent)]
    Invalid(#[from] SchemaViolation),
}

/// Every required parameter of `op` without a matching key in `args`, in
/// declaration order.
pub fn missing_required(op: &Operation, args: &Map<String, Value>) -> Vec<String> {
    op.required_names()
        .filter(|name| !args.contains_key(*name))
        .map(str::to_string)
        .collect()
}

/// Rejects a call before any request is built: first all missing required
/// names at once, then the first schema violation among supplied arguments.
pub fn validate_arguments(
    catalog: &Catalog,
    op: &Operation,
    args: &Map<String, Value>,
) -> Result<(), ArgumentError> {
    let missing = missing_required(op, args);
    if !missing.is_empty() {
        return Err(ArgumentError::Missing(missing));
    }
    for param in &op.parameters {
        if let Some(value) = args.get(&param.name) {
            validate(
                catalog.arena(),
                param.schema,
                Some(value),
                &param.name,
                param.required,
            )?;
        }
    }
    Ok(())
}
