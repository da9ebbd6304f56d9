use restool_exec::{LoadError, ToolError, ToolRuntime};

use crate::exit_codes;
use crate::output::print_error;
use crate::{OutputArgs, RuntimeArgs};

/// Builds the runtime from flags + environment, or reports why not and
/// returns the exit code.
pub fn start_runtime(args: &RuntimeArgs, output: &OutputArgs) -> Result<ToolRuntime, i32> {
    let config = args.to_config().map_err(|e| {
        print_error(output.format, output.quiet, &e.to_string());
        exit_codes::RUNTIME_ERROR
    })?;
    ToolRuntime::start(config).map_err(|e| {
        print_error(output.format, output.quiet, &e.to_string());
        exit_codes::RUNTIME_ERROR
    })
}

pub fn load_failed(output: &OutputArgs, e: &LoadError) -> i32 {
    print_error(output.format, output.quiet, &e.to_string());
    exit_codes::RUNTIME_ERROR
}

pub fn tool_error_code(e: &ToolError) -> i32 {
    match e {
        ToolError::NotFound(_) | ToolError::Validation(_) | ToolError::PathSubstitution { .. } => {
            exit_codes::VALIDATION_FAILED
        }
        ToolError::Execution(_) | ToolError::InvalidRequest(_) | ToolError::Load(_) => {
            exit_codes::RUNTIME_ERROR
        }
    }
}
