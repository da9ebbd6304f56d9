use crate::cmd::config::{load_failed, start_runtime};
use crate::exit_codes;
use crate::output::print_result;
use crate::{OutputArgs, RuntimeArgs};

pub async fn schemas_cmd(runtime: RuntimeArgs, output: OutputArgs) -> i32 {
    let rt = match start_runtime(&runtime, &output) {
        Ok(rt) => rt,
        Err(code) => return code,
    };

    let code = match rt.schemas().await {
        Ok(schemas) => {
            print_result(output.format, output.quiet, &schemas);
            exit_codes::SUCCESS
        }
        Err(e) => load_failed(&output, &e),
    };
    rt.shutdown().await;
    code
}
