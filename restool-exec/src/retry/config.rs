use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt; total attempts are `max_retries + 1`.
    pub max_retries: u32,
    pub base_delay: Duration,
    /// Full jitter: wait a uniform random delay in `[0, backoff]`.
    pub jitter: bool,
    /// Per-attempt timeout.
    pub timeout: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            jitter: false,
            timeout: Duration::from_secs(30),
        }
    }
}
