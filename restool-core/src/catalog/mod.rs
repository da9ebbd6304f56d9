mod arguments;
mod build;
mod model;
mod naming;

pub use arguments::{missing_required, validate_arguments, ArgumentError};
pub use build::{build_catalog, BuildError};
pub use model::{
    BuildDiagnostic, Catalog, CatalogBuild, Operation, ParamLocation, Parameter, ToolDescriptor,
};
pub use naming::{fallback_name, template_tokens};
