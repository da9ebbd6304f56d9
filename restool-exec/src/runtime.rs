use std::sync::Arc;

use serde_json::{json, Map, Value};
use tokio_util::sync::CancellationToken;

use restool_core::{ApiDocument, ArgumentError, Endpoint, ToolDescriptor};

use crate::cache::{spawn_sweeper, SweeperHandle, TtlCache};
use crate::catalog::{CatalogService, LoadError};
use crate::config::RuntimeConfig;
use crate::executor::{ApiResponse, Executor, Target, ToolError};
use crate::http::{HttpClient, HttpError, ReqwestHttpClient, ResilientClient};

#[derive(Debug, thiserror::Error)]
pub enum StartError {
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] HttpError),
}

/// Result of [`ToolRuntime::call`]; failures are data, never an `Err`.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolOutcome {
    pub is_error: bool,
    pub content: Value,
}

/// Everything one process needs to serve tool calls: caches, catalog,
/// executor and the background sweeper. Must be started inside a Tokio
/// runtime.
pub struct ToolRuntime {
    config: RuntimeConfig,
    catalog: Arc<CatalogService>,
    executor: Executor,
    sweeper: Option<SweeperHandle>,
    shutdown: CancellationToken,
}

impl ToolRuntime {
    pub fn start(config: RuntimeConfig) -> Result<Self, StartError> {
        let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::try_new()?);
        Self::with_http_client(config, http)
    }

    pub fn with_http_client(
        config: RuntimeConfig,
        http: Arc<dyn HttpClient>,
    ) -> Result<Self, StartError> {
        config.validate()?;
        let shutdown = CancellationToken::new();

        let catalog = Arc::new(CatalogService::new(
            config.spec_location.clone(),
            http.clone(),
            config.request_timeout,
            config.spec_cache_ttl,
        ));
        let cache_config = config.cache_config();
        let responses = Arc::new(TtlCache::new(cache_config.default_ttl));
        let sweeper = spawn_sweeper(
            &responses,
            cache_config.sweep_interval,
            shutdown.child_token(),
        );
        let executor = Executor::new(
            catalog.clone(),
            ResilientClient::new(http, config.retry_config()),
            responses,
            Target::new(config.base_url.clone(), config.api_prefix.clone()),
        );

        tracing::debug!(
            spec = %config.spec_location,
            base_url = %config.base_url,
            "tool runtime started"
        );
        Ok(Self {
            config,
            catalog,
            executor,
            sweeper: Some(sweeper),
            shutdown,
        })
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<CatalogService> {
        &self.catalog
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    pub async fn list_operations(&self) -> Result<Vec<ToolDescriptor>, ToolError> {
        self.executor.list_operations().await
    }

    /// Runs one operation. Cancelled in flight by [`ToolRuntime::shutdown`].
    pub async fn execute(
        &self,
        name: &str,
        args: &Map<String, Value>,
    ) -> Result<ApiResponse, ToolError> {
        let cancel = self.shutdown.child_token();
        self.executor.execute_with_cancel(name, args, &cancel).await
    }

    pub async fn call(&self, name: &str, args: &Map<String, Value>) -> ToolOutcome {
        match self.execute(name, args).await {
            Ok(response) => ToolOutcome {
                is_error: false,
                content: serde_json::to_value(&response).unwrap_or(Value::Null),
            },
            Err(e) => {
                tracing::debug!(tool = name, error = %e, "tool call failed");
                ToolOutcome {
                    is_error: true,
                    content: error_content(&e),
                }
            }
        }
    }

    pub async fn document(&self) -> Result<Arc<ApiDocument>, LoadError> {
        self.catalog.document().await
    }

    pub async fn endpoints(&self) -> Result<Vec<Endpoint>, LoadError> {
        self.catalog.endpoints().await
    }

    pub async fn schemas(&self) -> Result<Value, LoadError> {
        self.catalog.schemas().await
    }

    pub async fn listing(&self) -> Result<Vec<ToolDescriptor>, LoadError> {
        self.catalog.listing().await
    }

    /// Cancels in-flight calls and stops the cache sweeper.
    pub async fn shutdown(mut self) {
        self.shutdown.cancel();
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.shutdown().await;
        }
        tracing::debug!("tool runtime stopped");
    }
}

impl Drop for ToolRuntime {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn error_content(e: &ToolError) -> Value {
    let mut content = json!({
        "error": e.kind(),
        "message": e.to_string(),
    });
    if let ToolError::Validation(ArgumentError::Missing(names)) = e {
        content["missing"] = json!(names);
    }
    content
}
