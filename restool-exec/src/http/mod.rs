mod resilient;

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;

pub use resilient::{RequestError, ResilientClient};

#[derive(Debug, Clone, thiserror::Error)]
pub enum HttpError {
    #[error("timeout")]
    Timeout,
    #[error("connect/dns/tls error: {0}")]
    Network(String),
    #[error("http error: {0}")]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequestParts {
    pub method: String,
    pub url: url::Url,
    pub headers: BTreeMap<String, String>,
    pub query: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequestParts {
    pub fn get(url: url::Url) -> Self {
        Self {
            method: "GET".to_string(),
            url,
            headers: BTreeMap::new(),
            query: Vec::new(),
            body: None,
        }
    }

    /// `url` with the query pairs appended.
    pub fn full_url(&self) -> url::Url {
        let mut url = self.url.clone();
        if !self.query.is_empty() {
            let mut qp = url.query_pairs_mut();
            for (k, v) in &self.query {
                qp.append_pair(k, v);
            }
        }
        url
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponseParts {
    pub status: u16,
    pub status_text: String,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpResponseParts {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }
}

/// One HTTP exchange, no retries.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn send(
        &self,
        req: &HttpRequestParts,
        timeout: Duration,
    ) -> Result<HttpResponseParts, HttpError>;
}

pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn try_new() -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("restool/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HttpError::Other(e.to_string()))?;
        Ok(Self { client })
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::try_new().unwrap_or_else(|_| Self {
            client: reqwest::Client::new(),
        })
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn send(
        &self,
        req: &HttpRequestParts,
        timeout: Duration,
    ) -> Result<HttpResponseParts, HttpError> {
        let method = reqwest::Method::from_bytes(req.method.as_bytes())
            .map_err(|e| HttpError::Other(e.to_string()))?;
        let mut rb = self
            .client
            .request(method, req.full_url())
            .timeout(timeout);

        for (k, v) in &req.headers {
            rb = rb.header(k, v);
        }
        if let Some(body) = &req.body {
            rb = rb.body(body.clone());
        }

        let resp = rb.send().await.map_err(map_reqwest_error)?;
        let status = resp.status();

        let mut headers = BTreeMap::new();
        for (k, v) in resp.headers().iter() {
            if let Ok(s) = v.to_str() {
                headers.insert(k.to_string(), s.to_string());
            }
        }

        let body = resp.bytes().await.map_err(map_reqwest_error)?.to_vec();

        Ok(HttpResponseParts {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}

fn map_reqwest_error(e: reqwest::Error) -> HttpError {
    if e.is_timeout() {
        return HttpError::Timeout;
    }
    if e.is_connect() || e.is_request() {
        return HttpError::Network(e.to_string());
    }
    HttpError::Other(e.to_string())
}
