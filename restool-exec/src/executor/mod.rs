//! Validated, cached, retried execution of catalog operations.

mod fingerprint;
mod request;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use restool_core::{validate_arguments, ArgumentError, ToolDescriptor};

use crate::cache::TtlCache;
use crate::catalog::{CatalogService, LoadError};
use crate::http::{HttpResponseParts, RequestError, ResilientClient};

pub use fingerprint::fingerprint;
pub use request::{build_request, Target};

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(#[from] ArgumentError),
    #[error("{0}")]
    Execution(#[from] RequestError),
    #[error("unresolved path parameters in '{template}': {}", .tokens.join(", "))]
    PathSubstitution {
        template: String,
        tokens: Vec<String>,
    },
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Load(#[from] LoadError),
}

impl ToolError {
    /// Stable machine-readable category.
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::NotFound(_) => "not_found",
            ToolError::Validation(_) => "validation",
            ToolError::Execution(_) => "execution",
            ToolError::PathSubstitution { .. } => "path_substitution",
            ToolError::InvalidRequest(_) => "invalid_request",
            ToolError::Load(_) => "load",
        }
    }
}

/// What a call produced. Non-2xx statuses are ordinary responses.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ApiResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: BTreeMap<String, String>,
    /// Parsed JSON when the body is JSON, the text otherwise, `null` when empty.
    pub body: Value,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl From<HttpResponseParts> for ApiResponse {
    fn from(resp: HttpResponseParts) -> Self {
        let body = if resp.body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&resp.body).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&resp.body).into_owned())
            })
        };
        Self {
            status: resp.status,
            status_text: resp.status_text,
            headers: resp.headers,
            body,
        }
    }
}

pub struct Executor {
    catalog: Arc<CatalogService>,
    client: ResilientClient,
    responses: Arc<TtlCache<String, ApiResponse>>,
    target: Target,
}

impl Executor {
    pub fn new(
        catalog: Arc<CatalogService>,
        client: ResilientClient,
        responses: Arc<TtlCache<String, ApiResponse>>,
        target: Target,
    ) -> Self {
        Self {
            catalog,
            client,
            responses,
            target,
        }
    }

    pub fn responses(&self) -> &Arc<TtlCache<String, ApiResponse>> {
        &self.responses
    }

    pub async fn list_operations(&self) -> Result<Vec<ToolDescriptor>, ToolError> {
        Ok(self.catalog.listing().await?)
    }

    pub async fn execute(
        &self,
        name: &str,
        args: &Map<String, Value>,
    ) -> Result<ApiResponse, ToolError> {
        self.execute_with_cancel(name, args, &CancellationToken::new())
            .await
    }

    /// Like [`Executor::execute`]; cancelling `cancel` aborts an in-flight
    /// attempt or retry wait.
    pub async fn execute_with_cancel(
        &self,
        name: &str,
        args: &Map<String, Value>,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse, ToolError> {
        let loaded = self.catalog.ensure_loaded().await?;
        let op = loaded
            .catalog
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        validate_arguments(&loaded.catalog, op, args)?;

        let cache_key = op.is_cacheable().then(|| fingerprint(op, args));
        if let Some(key) = &cache_key {
            if let Some(hit) = self.responses.get(key).await {
                tracing::debug!(tool = %op.name, "response served from cache");
                return Ok(hit);
            }
        }

        let req = build_request(&self.target, op, args)?;
        let response: ApiResponse = match self.client.request(&req, cancel).await {
            Ok(resp) => resp.into(),
            Err(RequestError::ServerStatus { attempts, response }) => {
                tracing::warn!(
                    tool = %op.name,
                    status = response.status,
                    attempts,
                    "server error persisted after retries"
                );
                response.into()
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(key) = cache_key {
            if response.is_success() {
                self.responses.set(key, response.clone(), None).await;
            }
        }
        Ok(response)
    }
}
