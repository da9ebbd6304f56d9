use std::sync::Arc;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::http::{HttpClient, HttpError, HttpRequestParts, HttpResponseParts};
use crate::retry::{decide_retry, RetryConfig, RetryDecision};

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("request failed after {attempts} attempt(s): {source}")]
    Transport { attempts: u32, source: HttpError },
    #[error("server responded {} after {attempts} attempt(s)", .response.status)]
    ServerStatus {
        attempts: u32,
        response: HttpResponseParts,
    },
    #[error("request cancelled after {attempts} attempt(s)")]
    Cancelled { attempts: u32 },
}

/// Sends one logical request, retrying transport failures and 5xx responses
/// with exponential backoff.
#[derive(Clone)]
pub struct ResilientClient {
    http: Arc<dyn HttpClient>,
    retry: RetryConfig,
}

impl ResilientClient {
    pub fn new(http: Arc<dyn HttpClient>, retry: RetryConfig) -> Self {
        Self { http, retry }
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    pub async fn request(
        &self,
        req: &HttpRequestParts,
        cancel: &CancellationToken,
    ) -> Result<HttpResponseParts, RequestError> {
        let url = req.full_url();
        let mut attempt: u32 = 0;
        loop {
            let started = Instant::now();
            let outcome = tokio::select! {
                r = self.http.send(req, self.retry.timeout) => r,
                _ = cancel.cancelled() => {
                    return Err(RequestError::Cancelled { attempts: attempt + 1 });
                }
            };
            let elapsed_ms = started.elapsed().as_millis() as u64;

            let status = match &outcome {
                Ok(resp) => {
                    tracing::debug!(
                        method = %req.method,
                        url = %url,
                        attempt,
                        status = resp.status,
                        elapsed_ms,
                        "http attempt finished"
                    );
                    Some(resp.status)
                }
                Err(e) => {
                    tracing::debug!(
                        method = %req.method,
                        url = %url,
                        attempt,
                        error = %e,
                        elapsed_ms,
                        "http attempt failed"
                    );
                    None
                }
            };

            match decide_retry(&self.retry, attempt, status, || fastrand::u64(..)) {
                RetryDecision::Stop { .. } => return finish(outcome, attempt + 1),
                RetryDecision::RetryAfter { delay, reason } => {
                    tracing::warn!(
                        method = %req.method,
                        url = %url,
                        attempt,
                        ?reason,
                        delay_ms = delay.as_millis() as u64,
                        "retrying request"
                    );
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = cancel.cancelled() => {
                            return Err(RequestError::Cancelled { attempts: attempt + 1 });
                        }
                    }
                    attempt += 1;
                }
            }
        }
    }
}

fn finish(
    outcome: Result<HttpResponseParts, HttpError>,
    attempts: u32,
) -> Result<HttpResponseParts, RequestError> {
    match outcome {
        Ok(response) if response.is_server_error() => {
            Err(RequestError::ServerStatus { attempts, response })
        }
        Ok(response) => Ok(response),
        Err(source) => Err(RequestError::Transport { attempts, source }),
    }
}
