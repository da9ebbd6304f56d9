use std::time::Duration;

use crate::retry::config::RetryConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter { delay: Duration, reason: RetryReason },
    Stop { reason: RetryReason },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryReason {
    /// Status outside 5xx; returned to the caller as-is.
    Completed(u16),
    ServerStatus(u16),
    NetworkFailure,
    AttemptsExhausted,
}

/// Decide if we should retry and how long to wait.
///
/// - `attempt`: zero-based index of the attempt that just finished.
/// - `http_status`: status code if a response arrived; `None` means the
///   attempt failed at the transport level (connect, timeout, ...).
/// - `rand_u64`: RNG for full jitter.
pub fn decide_retry(
    cfg: &RetryConfig,
    attempt: u32,
    http_status: Option<u16>,
    rand_u64: impl Fn() -> u64,
) -> RetryDecision {
    if let Some(status) = http_status {
        if !(500..600).contains(&status) {
            return RetryDecision::Stop {
                reason: RetryReason::Completed(status),
            };
        }
    }

    if attempt >= cfg.max_retries {
        return RetryDecision::Stop {
            reason: RetryReason::AttemptsExhausted,
        };
    }

    RetryDecision::RetryAfter {
        delay: backoff_delay(cfg, attempt, rand_u64),
        reason: http_status
            .map(RetryReason::ServerStatus)
            .unwrap_or(RetryReason::NetworkFailure),
    }
}

/// `base_delay * 2^attempt`, optionally with full jitter.
pub fn backoff_delay(cfg: &RetryConfig, attempt: u32, rand_u64: impl Fn() -> u64) -> Duration {
    let factor = 2u32.saturating_pow(attempt);
    let raw = cfg.base_delay.saturating_mul(factor);
    if !cfg.jitter {
        return raw;
    }
    let raw_ms = u64::try_from(raw.as_millis()).unwrap_or(u64::MAX);
    let jitter_ms = if raw_ms == 0 {
        0
    } else {
        rand_u64() % raw_ms.saturating_add(1)
    };
    Duration::from_millis(jitter_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            base_delay: Duration::from_millis(100),
            ..Default::default()
        }
    }

    #[test]
    fn doubles_delay_per_attempt() {
        let c = cfg(5);
        let delays: Vec<u128> = (0..4)
            .map(|a| backoff_delay(&c, a, || 0).as_millis())
            .collect();
        assert_eq!(delays, vec![100, 200, 400, 800]);
    }

    #[test]
    fn jitter_stays_within_backoff() {
        let c = RetryConfig {
            jitter: true,
            ..cfg(5)
        };
        assert_eq!(backoff_delay(&c, 2, || 1_000_000), Duration::from_millis(1_000_000 % 401));
        assert_eq!(backoff_delay(&c, 0, || 7), Duration::from_millis(7));
    }

    #[test]
    fn retries_server_errors_and_network_failures_only() {
        let c = cfg(2);
        assert!(matches!(
            decide_retry(&c, 0, Some(503), || 0),
            RetryDecision::RetryAfter { reason: RetryReason::ServerStatus(503), .. }
        ));
        assert!(matches!(
            decide_retry(&c, 1, None, || 0),
            RetryDecision::RetryAfter { reason: RetryReason::NetworkFailure, .. }
        ));
        assert_eq!(
            decide_retry(&c, 0, Some(404), || 0),
            RetryDecision::Stop { reason: RetryReason::Completed(404) }
        );
        assert_eq!(
            decide_retry(&c, 0, Some(200), || 0),
            RetryDecision::Stop { reason: RetryReason::Completed(200) }
        );
        assert_eq!(
            decide_retry(&c, 2, Some(500), || 0),
            RetryDecision::Stop { reason: RetryReason::AttemptsExhausted }
        );
    }

    #[test]
    fn zero_retries_never_retries() {
        assert_eq!(
            decide_retry(&cfg(0), 0, None, || 0),
            RetryDecision::Stop { reason: RetryReason::AttemptsExhausted }
        );
    }
}
