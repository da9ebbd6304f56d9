#![forbid(unsafe_code)]

//! Network-free half of restool: turns an OpenAPI / Swagger description into
//! a catalog of operations and validates call arguments against it.

pub mod catalog;
pub mod document;
pub mod error;
pub mod parser;
pub mod refs;
pub mod schema;

pub use crate::catalog::{
    build_catalog, validate_arguments, ArgumentError, Catalog, CatalogBuild, Operation,
    ParamLocation, Parameter, ToolDescriptor,
};
pub use crate::document::{ApiDocument, DocumentLoadError, Endpoint, SpecVersion};
pub use crate::error::{DocumentError, ParseError, RefError, Violation};
pub use crate::parser::{parse_document_str, DocumentFormat};
pub use crate::schema::{SchemaArena, SchemaViolation};
