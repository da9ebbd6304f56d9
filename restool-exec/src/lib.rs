#![forbid(unsafe_code)]

//! Runtime half of restool: loads an API description, keeps the derived
//! catalog current and executes operations over HTTP with retries and a
//! response cache.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod executor;
pub mod http;
pub mod retry;
pub mod runtime;

pub use crate::cache::{CacheConfig, TtlCache};
pub use crate::catalog::{CatalogService, LoadError, LoadedCatalog};
pub use crate::config::{ConfigError, RuntimeConfig};
pub use crate::executor::{ApiResponse, Executor, Target, ToolError};
pub use crate::http::{HttpClient, HttpError, ReqwestHttpClient, RequestError, ResilientClient};
pub use crate::retry::RetryConfig;
pub use crate::runtime::{StartError, ToolOutcome, ToolRuntime};
