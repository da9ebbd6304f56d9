use clap::Subcommand;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the operations exposed as tools.
    Tools,
    /// Execute one operation.
    Call {
        name: String,
        /// Argument as KEY=VALUE; VALUE is read as JSON when it parses, else as a string.
        #[arg(long = "arg", value_name = "KEY=VALUE")]
        args: Vec<String>,
        /// All arguments as one JSON object; `--arg` entries override its keys.
        #[arg(long)]
        args_json: Option<String>,
    },
    /// List every operation in the document, including skipped ones.
    Endpoints,
    /// Print the document's schema definitions.
    Schemas,
    /// Print the loaded document.
    Spec,
}
