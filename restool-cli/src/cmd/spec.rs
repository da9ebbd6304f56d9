use crate::cmd::config::{load_failed, start_runtime};
use crate::exit_codes;
use crate::output::print_result;
use crate::{OutputArgs, RuntimeArgs};

pub async fn spec_cmd(runtime: RuntimeArgs, output: OutputArgs) -> i32 {
    let rt = match start_runtime(&runtime, &output) {
        Ok(rt) => rt,
        Err(code) => return code,
    };

    let code = match rt.document().await {
        Ok(doc) => {
            print_result(output.format, output.quiet, &doc.raw);
            exit_codes::SUCCESS
        }
        Err(e) => load_failed(&output, &e),
    };
    rt.shutdown().await;
    code
}
