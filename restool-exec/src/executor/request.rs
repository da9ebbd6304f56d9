use std::collections::BTreeMap;

use serde_json::{Map, Value};

use restool_core::catalog::template_tokens;
use restool_core::{Operation, ParamLocation};

use crate::executor::ToolError;
use crate::http::HttpRequestParts;

/// Where operation paths are mounted.
#[derive(Debug, Clone)]
pub struct Target {
    pub base_url: String,
    pub api_prefix: String,
}

impl Target {
    pub fn new(base_url: impl Into<String>, api_prefix: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_prefix: api_prefix.into(),
        }
    }

    fn join(&self, path: &str) -> String {
        format!(
            "{}{}{}",
            self.base_url.trim_end_matches('/'),
            self.api_prefix.trim_end_matches('/'),
            path
        )
    }
}

/// Builds the concrete request for an already validated call.
pub fn build_request(
    target: &Target,
    op: &Operation,
    args: &Map<String, Value>,
) -> Result<HttpRequestParts, ToolError> {
    let mut path = op.path.clone();
    let mut headers = BTreeMap::new();
    let mut query = Vec::new();
    let mut body = None;

    for param in &op.parameters {
        // Null means "not supplied" for every location, the body included.
        let Some(value) = args.get(&param.name).filter(|v| !v.is_null()) else {
            continue;
        };
        match param.location {
            ParamLocation::Body => {
                let bytes = serde_json::to_vec(value)
                    .map_err(|e| ToolError::InvalidRequest(e.to_string()))?;
                body = Some(bytes);
            }
            ParamLocation::Path => {
                let encoded = urlencoding::encode(&scalar_text(value)).into_owned();
                path = path.replace(&format!("{{{}}}", param.name), &encoded);
            }
            ParamLocation::Query => match value {
                Value::Array(items) => {
                    for item in items {
                        query.push((param.name.clone(), scalar_text(item)));
                    }
                }
                _ => query.push((param.name.clone(), scalar_text(value))),
            },
            ParamLocation::Header => {
                headers.insert(param.name.clone(), scalar_text(value));
            }
        }
    }

    let leftover = template_tokens(&path);
    if !leftover.is_empty() {
        return Err(ToolError::PathSubstitution {
            template: op.path.clone(),
            tokens: leftover,
        });
    }

    if body.is_some() && !has_header(&headers, "content-type") {
        headers.insert("Content-Type".to_string(), "application/json".to_string());
    }
    if !has_header(&headers, "accept") {
        headers.insert("Accept".to_string(), "application/json".to_string());
    }

    let raw_url = target.join(&path);
    let url = url::Url::parse(&raw_url)
        .map_err(|e| ToolError::InvalidRequest(format!("{raw_url}: {e}")))?;

    Ok(HttpRequestParts {
        method: op.method.clone(),
        url,
        headers,
        query,
        body,
    })
}

/// Strings go out bare; everything else as its JSON text.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn has_header(headers: &BTreeMap<String, String>, name: &str) -> bool {
    headers.keys().any(|k| k.eq_ignore_ascii_case(name))
}
