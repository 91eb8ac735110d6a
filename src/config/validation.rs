//! Configuration validation.
//!
//! Serde handles the syntax; this pass checks value ranges and that the
//! addresses and URLs can actually be used. All errors are collected, not
//! just the first.

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// Upper bound for any configured duration (one year).
pub const MAX_DURATION_SECS: u64 = 365 * 86_400;

/// A single semantic problem in a loaded configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("upstream.url: {0}")]
    InvalidUrl(String),

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("retries.backoff_factor must be >= 1.0, got {0}")]
    BackoffFactor(f64),

    #[error("retries.jitter_ratio must be within [0, 1], got {0}")]
    JitterRatio(f64),

    #[error("upstream.cache_key must not be empty")]
    EmptyCacheKey,

    #[error("{field} exceeds the maximum of one year")]
    TooLong { field: &'static str },

    #[error(
        "timeouts.request_secs ({request_secs}s) is shorter than a worst-case fetch ({worst_case_secs:.2}s)"
    )]
    RequestBudget {
        request_secs: u64,
        worst_case_secs: f64,
    },
}

/// Check a configuration, returning every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    match Url::parse(&config.upstream.url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::InvalidUrl(format!(
            "unsupported scheme {:?}",
            url.scheme()
        ))),
        Err(e) => errors.push(ValidationError::InvalidUrl(e.to_string())),
    }

    if config.upstream.cache_key.is_empty() {
        errors.push(ValidationError::EmptyCacheKey);
    }

    let positive = [
        ("upstream.timeout_ms", config.upstream.timeout_ms),
        ("cache.default_ttl_secs", config.cache.default_ttl_secs),
        ("retries.max_attempts", u64::from(config.retries.max_attempts)),
        (
            "circuit_breaker.failure_threshold",
            u64::from(config.circuit_breaker.failure_threshold),
        ),
        ("timeouts.request_secs", config.timeouts.request_secs),
    ];
    for (field, value) in positive {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }

    let bounded = [
        ("upstream.timeout_ms", config.upstream.timeout_ms / 1_000),
        ("retries.base_delay_ms", config.retries.base_delay_ms / 1_000),
        ("cache.default_ttl_secs", config.cache.default_ttl_secs),
        (
            "circuit_breaker.reset_timeout_secs",
            config.circuit_breaker.reset_timeout_secs,
        ),
        ("timeouts.request_secs", config.timeouts.request_secs),
    ];
    for (field, secs) in bounded {
        if secs > MAX_DURATION_SECS {
            errors.push(ValidationError::TooLong { field });
        }
    }

    // NaN fails both range checks.
    if !(config.retries.backoff_factor >= 1.0) {
        errors.push(ValidationError::BackoffFactor(config.retries.backoff_factor));
    }
    if !(0.0..=1.0).contains(&config.retries.jitter_ratio) {
        errors.push(ValidationError::JitterRatio(config.retries.jitter_ratio));
    }

    // Only meaningful once the inputs themselves are sane.
    if errors.is_empty() {
        let worst_case_secs = worst_case_fetch_secs(config);
        if !(worst_case_secs < config.timeouts.request_secs as f64) {
            errors.push(ValidationError::RequestBudget {
                request_secs: config.timeouts.request_secs,
                worst_case_secs,
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Longest a fetch can run: every attempt hits its timeout and every backoff
/// sleep draws the maximum jitter.
pub fn worst_case_fetch_secs(config: &GatewayConfig) -> f64 {
    let retries = &config.retries;
    let attempt_secs = config.upstream.timeout_ms as f64 / 1_000.0;
    let base_secs = retries.base_delay_ms as f64 / 1_000.0;

    (0..retries.max_attempts)
        .map(|i| {
            let exponent = i32::try_from(i).unwrap_or(i32::MAX);
            let backoff = base_secs * retries.backoff_factor.powi(exponent);
            attempt_secs + backoff * (1.0 + retries.jitter_ratio)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.upstream.url = "ftp://example.com/products".into();
        config.retries.max_attempts = 0;
        config.retries.backoff_factor = 0.5;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::Zero {
            field: "retries.max_attempts"
        }));
        assert!(errors.contains(&ValidationError::BackoffFactor(0.5)));
    }

    #[test]
    fn test_metrics_address_ignored_when_disabled() {
        let mut config = GatewayConfig::default();
        config.observability.metrics_enabled = false;
        config.observability.metrics_address = "garbage".into();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_worst_case_fetch_for_defaults() {
        // 3 x 5s attempts plus 1.0 + 1.5 + 2.25s of backoff.
        let secs = worst_case_fetch_secs(&GatewayConfig::default());
        assert!((secs - 19.75).abs() < 1e-9);
    }

    #[test]
    fn test_request_timeout_must_cover_whole_fetch() {
        let mut config = GatewayConfig::default();
        config.timeouts.request_secs = 2;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0],
            ValidationError::RequestBudget { request_secs: 2, .. }
        ));
    }

    #[test]
    fn test_huge_ttl_is_rejected() {
        let config: GatewayConfig =
            toml::from_str("[cache]\ndefault_ttl_secs = 9223372036854775807").unwrap();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::TooLong {
                field: "cache.default_ttl_secs"
            }]
        );
    }

    #[test]
    fn test_huge_durations_are_each_reported() {
        let mut config = GatewayConfig::default();
        config.upstream.timeout_ms = u64::MAX;
        config.circuit_breaker.reset_timeout_secs = u64::MAX;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::TooLong {
            field: "upstream.timeout_ms"
        }));
        assert!(errors.contains(&ValidationError::TooLong {
            field: "circuit_breaker.reset_timeout_secs"
        }));
    }

    #[test]
    fn test_jitter_out_of_range() {
        let mut config = GatewayConfig::default();
        config.retries.jitter_ratio = 1.5;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::JitterRatio(1.5)]);
    }
}
