use std::time::Duration;

use restool_core::{ApiDocument, DocumentLoadError, Violation};

use crate::http::{HttpClient, HttpRequestParts};

#[derive(Debug, Clone, thiserror::Error)]
pub enum LoadError {
    #[error("failed to fetch {location}: {message}")]
    Fetch { location: String, message: String },
    #[error("failed to read {location}: {message}")]
    Read { location: String, message: String },
    #[error("failed to parse {location}: {message}")]
    Parse { location: String, message: String },
    #[error("{location} is not a valid API description: {}", join_violations(.violations))]
    Invalid {
        location: String,
        violations: Vec<Violation>,
    },
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(Violation::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub(crate) fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Reads the raw document text from a URL or a local path. Remote fetches
/// are a single attempt; tool-call retries do not apply here.
pub(crate) async fn read_location(
    http: &dyn HttpClient,
    location: &str,
    timeout: Duration,
) -> Result<String, LoadError> {
    if !is_remote(location) {
        return tokio::fs::read_to_string(location)
            .await
            .map_err(|e| LoadError::Read {
                location: location.to_string(),
                message: e.to_string(),
            });
    }

    let fetch_err = |message: String| LoadError::Fetch {
        location: location.to_string(),
        message,
    };
    let url = url::Url::parse(location).map_err(|e| fetch_err(e.to_string()))?;
    let mut req = HttpRequestParts::get(url);
    req.headers.insert(
        "Accept".to_string(),
        "application/json, application/yaml;q=0.9, */*;q=0.8".to_string(),
    );
    let resp = http
        .send(&req, timeout)
        .await
        .map_err(|e| fetch_err(e.to_string()))?;
    if !resp.is_success() {
        return Err(fetch_err(format!("HTTP {} {}", resp.status, resp.status_text)));
    }
    Ok(String::from_utf8_lossy(&resp.body).into_owned())
}

pub(crate) fn parse_document(location: &str, text: &str) -> Result<ApiDocument, LoadError> {
    ApiDocument::parse(location, text).map_err(|e| match e {
        DocumentLoadError::Parse(e) => LoadError::Parse {
            location: location.to_string(),
            message: e.to_string(),
        },
        DocumentLoadError::Invalid(e) => LoadError::Invalid {
            location: location.to_string(),
            violations: e.violations,
        },
    })
}
