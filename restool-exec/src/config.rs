use std::time::Duration;

use crate::cache::CacheConfig;
use crate::retry::RetryConfig;

pub const DEFAULT_BASE_URL: &str = "https://petstore3.swagger.io";
pub const DEFAULT_API_PREFIX: &str = "/api/v3";
pub const DEFAULT_SPEC_LOCATION: &str = "https://petstore3.swagger.io/api/v3/openapi.json";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: '{value}' ({reason})")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Settings the runtime consumes; nothing here is persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    pub base_url: String,
    /// Inserted between `base_url` and every operation path.
    pub api_prefix: String,
    /// URL or local file path of the API description.
    pub spec_location: String,
    pub cache_ttl: Duration,
    /// How long a fetched API description is reused before refetching.
    pub spec_cache_ttl: Duration,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
    pub retry_jitter: bool,
    pub request_timeout: Duration,
    pub sweep_interval: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            spec_location: DEFAULT_SPEC_LOCATION.to_string(),
            cache_ttl: Duration::from_secs(5 * 60),
            spec_cache_ttl: Duration::from_secs(60 * 60),
            max_retries: 3,
            retry_base_delay: Duration::from_secs(1),
            retry_jitter: false,
            request_timeout: Duration::from_secs(30),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

impl RuntimeConfig {
    /// Defaults overridden by `RESTOOL_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        cfg.apply_lookup(lookup)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Overlays `RESTOOL_*` environment variables without validating the
    /// result, so callers can apply further overrides first.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`RuntimeConfig::apply_env`] with an arbitrary source. Values
    /// that do not parse are still rejected here.
    pub fn apply_lookup(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(v) = lookup("RESTOOL_BASE_URL") {
            self.base_url = v;
        }
        if let Some(v) = lookup("RESTOOL_API_PREFIX") {
            self.api_prefix = v;
        }
        if let Some(v) = lookup("RESTOOL_SPEC") {
            self.spec_location = v;
        }
        if let Some(v) = lookup("RESTOOL_CACHE_TTL_SECS") {
            self.cache_ttl = Duration::from_secs(parse_num("RESTOOL_CACHE_TTL_SECS", &v)?);
        }
        if let Some(v) = lookup("RESTOOL_MAX_RETRIES") {
            self.max_retries = parse_num("RESTOOL_MAX_RETRIES", &v)?;
        }
        if let Some(v) = lookup("RESTOOL_RETRY_DELAY_MS") {
            self.retry_base_delay = Duration::from_millis(parse_num("RESTOOL_RETRY_DELAY_MS", &v)?);
        }
        if let Some(v) = lookup("RESTOOL_TIMEOUT_SECS") {
            self.request_timeout = Duration::from_secs(parse_num("RESTOOL_TIMEOUT_SECS", &v)?);
        }
        if let Some(v) = lookup("RESTOOL_RETRY_JITTER") {
            self.retry_jitter = parse_bool("RESTOOL_RETRY_JITTER", &v)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidValue {
            name: "base_url",
            value: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        if !self.api_prefix.is_empty() && !self.api_prefix.starts_with('/') {
            return Err(ConfigError::InvalidValue {
                name: "api_prefix",
                value: self.api_prefix.clone(),
                reason: "must be empty or start with '/'".to_string(),
            });
        }
        Ok(())
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.max_retries,
            base_delay: self.retry_base_delay,
            jitter: self.retry_jitter,
            timeout: self.request_timeout,
        }
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            default_ttl: self.cache_ttl,
            sweep_interval: self.sweep_interval,
        }
    }
}

fn parse_num<T>(name: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        name,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name,
            value: value.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_match_documented_values() {
        let cfg = RuntimeConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg, RuntimeConfig::default());
        assert_eq!(cfg.cache_ttl, Duration::from_secs(300));
        assert_eq!(cfg.max_retries, 3);
        assert_eq!(cfg.retry_base_delay, Duration::from_secs(1));
        assert_eq!(cfg.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn environment_overrides() {
        let cfg = RuntimeConfig::from_lookup(lookup(&[
            ("RESTOOL_BASE_URL", "http://localhost:8080"),
            ("RESTOOL_API_PREFIX", ""),
            ("RESTOOL_MAX_RETRIES", "5"),
            ("RESTOOL_RETRY_DELAY_MS", "250"),
            ("RESTOOL_RETRY_JITTER", "yes"),
        ]))
        .unwrap();
        assert_eq!(cfg.base_url, "http://localhost:8080");
        assert_eq!(cfg.api_prefix, "");
        assert_eq!(cfg.retry_config().max_retries, 5);
        assert_eq!(cfg.retry_config().base_delay, Duration::from_millis(250));
        assert!(cfg.retry_config().jitter);
    }

    #[test]
    fn malformed_values_are_rejected() {
        let err = RuntimeConfig::from_lookup(lookup(&[("RESTOOL_MAX_RETRIES", "many")]))
            .unwrap_err();
        assert!(err.to_string().contains("RESTOOL_MAX_RETRIES"));
        assert!(RuntimeConfig::from_lookup(lookup(&[("RESTOOL_BASE_URL", "not a url")])).is_err());
        assert!(RuntimeConfig::from_lookup(lookup(&[("RESTOOL_API_PREFIX", "api")])).is_err());
    }

    #[test]
    fn bad_environment_values_can_be_overridden_before_validation() {
        let mut cfg = RuntimeConfig::default();
        cfg.apply_lookup(lookup(&[("RESTOOL_BASE_URL", "not a url")]))
            .unwrap();
        assert!(cfg.validate().is_err());

        cfg.base_url = "http://localhost:9000".to_string();
        assert!(cfg.validate().is_ok());

        // Unparseable numbers are rejected up front.
        let mut cfg = RuntimeConfig::default();
        assert!(cfg
            .apply_lookup(lookup(&[("RESTOOL_TIMEOUT_SECS", "soon")]))
            .is_err());
    }
}
