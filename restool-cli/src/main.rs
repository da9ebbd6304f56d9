use clap::Parser;

mod args;
mod cmd;
mod commands;
mod exit_codes;
mod output;

pub use args::*;
use commands::Command;

#[derive(Debug, Parser)]
#[command(
    name = "restool",
    version,
    about = "Call OpenAPI operations as validated, cached tools"
)]
struct Cli {
    #[command(flatten)]
    runtime: RuntimeArgs,
    #[command(flatten)]
    output: OutputArgs,
    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to create tokio runtime: {e}");
            std::process::exit(exit_codes::RUNTIME_ERROR);
        }
    };

    let exit_code = rt.block_on(run_command(cli.command, cli.runtime, cli.output));
    std::process::exit(exit_code);
}

/// Logs go to stderr so stdout stays machine-readable. `RUST_LOG` overrides
/// the default `warn` level.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run_command(command: Command, runtime: RuntimeArgs, output: OutputArgs) -> i32 {
    match command {
        Command::Tools => cmd::tools::tools_cmd(runtime, output).await,
        Command::Call {
            name,
            args,
            args_json,
        } => cmd::call::call_cmd(&name, &args, args_json.as_deref(), runtime, output).await,
        Command::Endpoints => cmd::endpoints::endpoints_cmd(runtime, output).await,
        Command::Schemas => cmd::schemas::schemas_cmd(runtime, output).await,
        Command::Spec => cmd::spec::spec_cmd(runtime, output).await,
    }
}
