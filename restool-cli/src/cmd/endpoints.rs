use crate::cmd::config::{load_failed, start_runtime};
use crate::exit_codes;
use crate::output::{print_result, OutputFormat};
use crate::{OutputArgs, RuntimeArgs};

pub async fn endpoints_cmd(runtime: RuntimeArgs, output: OutputArgs) -> i32 {
    let rt = match start_runtime(&runtime, &output) {
        Ok(rt) => rt,
        Err(code) => return code,
    };

    let code = match rt.endpoints().await {
        Ok(endpoints) => {
            if output.format == OutputFormat::Text && !output.quiet {
                for ep in &endpoints {
                    println!("{:<7} {}  {}", ep.method, ep.path, ep.description);
                }
            } else {
                print_result(output.format, output.quiet, &endpoints);
            }
            exit_codes::SUCCESS
        }
        Err(e) => load_failed(&output, &e),
    };
    rt.shutdown().await;
    code
}
