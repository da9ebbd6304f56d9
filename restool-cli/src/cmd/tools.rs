use crate::cmd::config::{start_runtime, tool_error_code};
use crate::exit_codes;
use crate::output::{print_error, print_result, OutputFormat};
use crate::{OutputArgs, RuntimeArgs};

pub async fn tools_cmd(runtime: RuntimeArgs, output: OutputArgs) -> i32 {
    let rt = match start_runtime(&runtime, &output) {
        Ok(rt) => rt,
        Err(code) => return code,
    };

    let code = match rt.list_operations().await {
        Ok(tools) => {
            if output.format == OutputFormat::Text && !output.quiet {
                for t in &tools {
                    println!("{}  {} {}", t.name, t.method, t.path);
                    println!("    {}", t.description);
                }
            } else {
                print_result(output.format, output.quiet, &tools);
            }
            exit_codes::SUCCESS
        }
        Err(e) => {
            print_error(output.format, output.quiet, &e.to_string());
            tool_error_code(&e)
        }
    };
    rt.shutdown().await;
    code
}
