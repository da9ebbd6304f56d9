use clap::Args;
use restool_exec::{ConfigError, RuntimeConfig};

use crate::output::OutputFormat;

#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// Overrides applied on top of `RESTOOL_*` environment settings.
#[derive(Debug, Args, Clone)]
pub struct RuntimeArgs {
    /// URL or file path of the OpenAPI / Swagger document.
    #[arg(long, global = true)]
    pub spec: Option<String>,
    #[arg(long, global = true)]
    pub base_url: Option<String>,
    #[arg(long, global = true)]
    pub api_prefix: Option<String>,
    #[arg(long, global = true)]
    pub max_retries: Option<u32>,
}

impl RuntimeArgs {
    pub fn to_config(&self) -> Result<RuntimeConfig, ConfigError> {
        // Flags win over the environment; validate only the merged result.
        let mut config = RuntimeConfig::default();
        config.apply_env()?;
        if let Some(spec) = &self.spec {
            config.spec_location = spec.clone();
        }
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(prefix) = &self.api_prefix {
            config.api_prefix = prefix.clone();
        }
        if let Some(n) = self.max_retries {
            config.max_retries = n;
        }
        config.validate()?;
        Ok(config)
    }
}
