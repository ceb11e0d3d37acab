//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `navigation_timeout_ms` is below 100ms or not shorter than `request_timeout_ms`
    /// - `request_timeout_ms` exceeds 5 minutes
    /// - `chunk_size`, `cache_capacity` or `cache_ttl_secs` is 0
    /// - the lazy-load pass is enabled without a selector or round budget, or
    ///   with a settle interval not shorter than `request_timeout_ms`
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.navigation_timeout_ms < 100 {
            return Err(ConfigError::Invalid {
                field: "navigation_timeout_ms".into(),
                reason: "must be at least 100ms".into(),
            });
        }
        if self.navigation_timeout_ms >= self.request_timeout_ms {
            return Err(ConfigError::Invalid {
                field: "navigation_timeout_ms".into(),
                reason: "must be shorter than request_timeout_ms".into(),
            });
        }
        if self.request_timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "request_timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid { field: "chunk_size".into(), reason: "must be greater than 0".into() });
        }
        if self.cache_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "cache_capacity".into(),
                reason: "must be greater than 0".into(),
            });
        }
        if self.cache_ttl_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "cache_ttl_secs".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.lazy_load {
            if self.lazy_max_rounds == 0 {
                return Err(ConfigError::Invalid {
                    field: "lazy_max_rounds".into(),
                    reason: "must be greater than 0 when lazy_load is enabled".into(),
                });
            }
            if self.load_more_selector.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    field: "load_more_selector".into(),
                    reason: "must not be empty when lazy_load is enabled".into(),
                });
            }
            if self.lazy_settle_ms >= self.request_timeout_ms {
                return Err(ConfigError::Invalid {
                    field: "lazy_settle_ms".into(),
                    reason: "must be shorter than request_timeout_ms".into(),
                });
            }

            let lazy_budget = self
                .navigation_timeout_ms
                .saturating_add(self.lazy_settle_ms.saturating_mul(u64::from(self.lazy_max_rounds) + 1));
            if lazy_budget >= self.request_timeout_ms {
                tracing::warn!(
                    navigation_timeout_ms = self.navigation_timeout_ms,
                    lazy_settle_ms = self.lazy_settle_ms,
                    lazy_max_rounds = self.lazy_max_rounds,
                    request_timeout_ms = self.request_timeout_ms,
                    "navigation plus lazy-load budget can exceed the request deadline"
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_navigation_timeout_too_small() {
        let config = AppConfig { navigation_timeout_ms: 50, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "navigation_timeout_ms"));
    }

    #[test]
    fn test_validate_navigation_not_shorter_than_deadline() {
        let config = AppConfig { navigation_timeout_ms: 30_000, request_timeout_ms: 30_000, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "navigation_timeout_ms"));
    }

    #[test]
    fn test_validate_deadline_exceeds_limit() {
        let config = AppConfig { request_timeout_ms: 301_000, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "request_timeout_ms"));
    }

    #[test]
    fn test_validate_zero_chunk_size() {
        let config = AppConfig { chunk_size: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "chunk_size"));
    }

    #[test]
    fn test_validate_zero_cache_capacity() {
        let config = AppConfig { cache_capacity: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "cache_capacity"));
    }

    #[test]
    fn test_validate_zero_ttl() {
        let config = AppConfig { cache_ttl_secs: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "cache_ttl_secs"));
    }

    #[test]
    fn test_validate_lazy_load_requires_selector() {
        let config = AppConfig { lazy_load: true, load_more_selector: "  ".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "load_more_selector"));
    }

    #[test]
    fn test_validate_empty_selector_ignored_without_lazy_load() {
        let config = AppConfig { load_more_selector: String::new(), ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_huge_settle_rejected_with_lazy_load() {
        let config = AppConfig {
            lazy_load: true,
            lazy_settle_ms: u64::MAX / 2,
            lazy_max_rounds: 5,
            ..Default::default()
        };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "lazy_settle_ms"));
    }

    #[test]
    fn test_validate_huge_settle_ignored_without_lazy_load() {
        let config = AppConfig { lazy_settle_ms: u64::MAX, lazy_max_rounds: u32::MAX, ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_lazy_budget_over_deadline_saturates() {
        let config = AppConfig {
            lazy_load: true,
            lazy_settle_ms: 29_000,
            lazy_max_rounds: u32::MAX,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_edge_case_values() {
        let config = AppConfig {
            navigation_timeout_ms: 100,
            request_timeout_ms: 300_000,
            chunk_size: 1,
            cache_capacity: 1,
            cache_ttl_secs: 1,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
