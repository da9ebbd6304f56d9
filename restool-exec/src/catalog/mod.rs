//! Owns the loaded API description and the catalog derived from it.

mod loader;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use restool_core::catalog::{build_catalog, BuildDiagnostic, Catalog, Operation, ToolDescriptor};
use restool_core::{ApiDocument, Endpoint};
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};

use crate::cache::TtlCache;
use crate::http::HttpClient;

pub use loader::LoadError;

/// Cache key of the memoized API description.
pub const SPEC_CACHE_KEY: &str = "openapi-spec";

/// One consistent generation of document + catalog. Replaced as a whole.
#[derive(Debug)]
pub struct LoadedCatalog {
    pub document: Arc<ApiDocument>,
    pub catalog: Catalog,
    pub diagnostics: Vec<BuildDiagnostic>,
}

pub struct CatalogService {
    location: String,
    http: Arc<dyn HttpClient>,
    fetch_timeout: Duration,
    spec_ttl: Duration,
    documents: TtlCache<String, Arc<ApiDocument>>,
    state: RwLock<Option<Arc<LoadedCatalog>>>,
    /// Serializes loads; holds the error of the latest finished load.
    load_lock: Mutex<Option<LoadError>>,
    /// Bumped (under `load_lock`) every time a load finishes.
    finished_loads: AtomicU64,
}

impl CatalogService {
    pub fn new(
        location: impl Into<String>,
        http: Arc<dyn HttpClient>,
        fetch_timeout: Duration,
        spec_ttl: Duration,
    ) -> Self {
        Self {
            location: location.into(),
            http,
            fetch_timeout,
            spec_ttl,
            documents: TtlCache::new(spec_ttl),
            state: RwLock::new(None),
            load_lock: Mutex::new(None),
            finished_loads: AtomicU64::new(0),
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Fetches, parses and validates the document, reusing the memoized copy
    /// while it is fresh.
    pub async fn load(&self) -> Result<Arc<ApiDocument>, LoadError> {
        if let Some(doc) = self.documents.get(SPEC_CACHE_KEY).await {
            tracing::debug!(location = %self.location, "using cached API description");
            return Ok(doc);
        }
        let text = loader::read_location(self.http.as_ref(), &self.location, self.fetch_timeout)
            .await?;
        let doc = Arc::new(loader::parse_document(&self.location, &text)?);
        self.documents
            .set(SPEC_CACHE_KEY.to_string(), doc.clone(), Some(self.spec_ttl))
            .await;
        Ok(doc)
    }

    /// Derives a catalog from `document` and swaps it in atomically.
    pub async fn build(&self, document: Arc<ApiDocument>) -> Arc<LoadedCatalog> {
        let build = build_catalog(&document);
        for d in &build.diagnostics {
            tracing::warn!(method = %d.method, path = %d.path, "skipped: {}", d.message);
        }
        let loaded = Arc::new(LoadedCatalog {
            document,
            catalog: build.catalog,
            diagnostics: build.diagnostics,
        });
        *self.state.write().await = Some(loaded.clone());
        tracing::info!(
            location = %self.location,
            operations = loaded.catalog.len(),
            skipped = loaded.diagnostics.len(),
            "catalog built"
        );
        loaded
    }

    /// Loads and builds once. Callers that arrive while a load is in flight
    /// wait for it and share its outcome, failure included.
    pub async fn ensure_loaded(&self) -> Result<Arc<LoadedCatalog>, LoadError> {
        if let Some(loaded) = self.current().await {
            return Ok(loaded);
        }
        let seen = self.finished_loads.load(Ordering::Acquire);
        let mut last_error = self.load_lock.lock().await;
        if let Some(loaded) = self.current().await {
            return Ok(loaded);
        }
        if self.finished_loads.load(Ordering::Acquire) != seen {
            if let Some(e) = last_error.as_ref() {
                return Err(e.clone());
            }
        }
        let outcome = self.load_and_build().await;
        *last_error = outcome.as_ref().err().cloned();
        self.finished_loads.fetch_add(1, Ordering::Release);
        outcome
    }

    /// Forces a fresh fetch and rebuild. On failure the previous catalog
    /// stays in place.
    pub async fn reload(&self) -> Result<Arc<LoadedCatalog>, LoadError> {
        let mut last_error = self.load_lock.lock().await;
        self.documents.delete(SPEC_CACHE_KEY).await;
        let outcome = self.load_and_build().await;
        *last_error = outcome.as_ref().err().cloned();
        self.finished_loads.fetch_add(1, Ordering::Release);
        outcome
    }

    async fn load_and_build(&self) -> Result<Arc<LoadedCatalog>, LoadError> {
        match self.load().await {
            Ok(doc) => Ok(self.build(doc).await),
            Err(e) => {
                tracing::warn!(location = %self.location, error = %e, "failed to load API description");
                Err(e)
            }
        }
    }

    pub async fn current(&self) -> Option<Arc<LoadedCatalog>> {
        self.state.read().await.clone()
    }

    pub async fn is_loaded(&self) -> bool {
        self.state.read().await.is_some()
    }

    pub async fn operations(&self) -> Result<Vec<Operation>, LoadError> {
        Ok(self.ensure_loaded().await?.catalog.operations().to_vec())
    }

    pub async fn operation(&self, name: &str) -> Result<Option<Operation>, LoadError> {
        Ok(self.ensure_loaded().await?.catalog.get(name).cloned())
    }

    pub async fn listing(&self) -> Result<Vec<ToolDescriptor>, LoadError> {
        Ok(self.ensure_loaded().await?.catalog.listing())
    }

    pub async fn document(&self) -> Result<Arc<ApiDocument>, LoadError> {
        Ok(self.ensure_loaded().await?.document.clone())
    }

    pub async fn endpoints(&self) -> Result<Vec<Endpoint>, LoadError> {
        Ok(self.ensure_loaded().await?.document.endpoints())
    }

    pub async fn schemas(&self) -> Result<Value, LoadError> {
        Ok(self.ensure_loaded().await?.document.schemas())
    }
}
