use std::time::Duration;

use crate::error::ConfigError;

/// TTL used by the bot for callback correlation entries (20 minutes)
pub const DEFAULT_TTL: Duration = Duration::from_secs(20 * 60);

/// Longest accepted TTL (~100 years), keeps deadline arithmetic from overflowing
pub const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Environment variable overriding the entry TTL, in seconds
pub const TTL_ENV: &str = "HASH_STORAGE_TTL_SECS";

/// Environment variable overriding the sweep period, in seconds
pub const CLEANUP_INTERVAL_ENV: &str = "HASH_STORAGE_CLEANUP_INTERVAL_SECS";

/// Smallest sweep period derived from a TTL
const MIN_DERIVED_INTERVAL: Duration = Duration::from_millis(1);

/// Configuration for a hash storage: entry TTL and background sweep period
///
/// # Example
///
/// ```rust
/// use hashstore_core::StorageConfig;
/// use std::time::Duration;
///
/// let config = StorageConfig::new(Duration::from_secs(20 * 60))
///     .with_cleanup_interval(Duration::from_secs(30));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Lifetime of every entry, counted from its last `put`
    pub ttl: Duration,
    /// Interval between sweep runs (default: a tenth of the TTL)
    pub cleanup_interval: Duration,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl StorageConfig {
    /// Creates a configuration with the given TTL and a derived sweep period
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            cleanup_interval: Self::derived_interval(ttl),
        }
    }

    /// Sets the cleanup interval
    ///
    /// This determines how often the background task runs to remove expired
    /// entries. Must not be longer than the TTL.
    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    /// Reads the configuration from the environment.
    ///
    /// Reads:
    /// - `HASH_STORAGE_TTL_SECS` - entry TTL (defaults to 1200)
    /// - `HASH_STORAGE_CLEANUP_INTERVAL_SECS` - sweep period (defaults to TTL / 10)
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = match read_secs(TTL_ENV)? {
            Some(ttl) => Self::new(ttl),
            None => Self::default(),
        };
        let config = match read_secs(CLEANUP_INTERVAL_ENV)? {
            Some(interval) => config.with_cleanup_interval(interval),
            None => config,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks the configuration without building anything
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ttl.is_zero() {
            return Err(ConfigError::ZeroTtl);
        }
        if self.ttl > MAX_TTL {
            return Err(ConfigError::TtlTooLong {
                ttl: self.ttl,
                max: MAX_TTL,
            });
        }
        if self.cleanup_interval.is_zero() {
            return Err(ConfigError::ZeroCleanupInterval);
        }
        if self.cleanup_interval > self.ttl {
            return Err(ConfigError::CleanupIntervalExceedsTtl {
                interval: self.cleanup_interval,
                ttl: self.ttl,
            });
        }
        Ok(())
    }

    fn derived_interval(ttl: Duration) -> Duration {
        (ttl / 10).max(MIN_DERIVED_INTERVAL).min(ttl)
    }
}

fn read_secs(var: &'static str) -> Result<Option<Duration>, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(|secs| Some(Duration::from_secs(secs)))
            .map_err(|_| ConfigError::InvalidEnv { var, value: raw }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StorageConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(1200));
        assert_eq!(config.cleanup_interval, Duration::from_secs(120));
    }

    #[test]
    fn test_custom_cleanup_interval() {
        let config = StorageConfig::new(Duration::from_secs(60))
            .with_cleanup_interval(Duration::from_secs(15));
        assert_eq!(config.cleanup_interval, Duration::from_secs(15));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_tiny_ttl_gets_nonzero_interval() {
        let config = StorageConfig::new(Duration::from_nanos(5));
        assert_eq!(config.cleanup_interval, Duration::from_nanos(5));
        assert!(config.validate().is_ok());

        let config = StorageConfig::new(Duration::from_millis(5));
        assert_eq!(config.cleanup_interval, Duration::from_millis(1));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert_eq!(
            StorageConfig::new(Duration::ZERO).validate(),
            Err(ConfigError::ZeroTtl)
        );
        assert_eq!(
            StorageConfig::new(Duration::from_secs(10))
                .with_cleanup_interval(Duration::ZERO)
                .validate(),
            Err(ConfigError::ZeroCleanupInterval)
        );
        assert!(matches!(
            StorageConfig::new(Duration::MAX).validate(),
            Err(ConfigError::TtlTooLong { .. })
        ));
        assert!(matches!(
            StorageConfig::new(Duration::from_secs(10))
                .with_cleanup_interval(Duration::from_secs(11))
                .validate(),
            Err(ConfigError::CleanupIntervalExceedsTtl { .. })
        ));
    }

    // Environment is process-global, so every env case lives in one test.
    #[test]
    fn test_from_env() {
        std::env::remove_var(TTL_ENV);
        std::env::remove_var(CLEANUP_INTERVAL_ENV);
        assert_eq!(StorageConfig::from_env().unwrap(), StorageConfig::default());

        std::env::set_var(TTL_ENV, "300");
        let config = StorageConfig::from_env().unwrap();
        assert_eq!(config.ttl, Duration::from_secs(300));
        assert_eq!(config.cleanup_interval, Duration::from_secs(30));

        std::env::set_var(CLEANUP_INTERVAL_ENV, "60");
        let config = StorageConfig::from_env().unwrap();
        assert_eq!(config.cleanup_interval, Duration::from_secs(60));

        std::env::set_var(CLEANUP_INTERVAL_ENV, "600");
        assert!(matches!(
            StorageConfig::from_env(),
            Err(ConfigError::CleanupIntervalExceedsTtl { .. })
        ));

        std::env::set_var(TTL_ENV, "twenty minutes");
        assert_eq!(
            StorageConfig::from_env(),
            Err(ConfigError::InvalidEnv {
                var: TTL_ENV,
                value: "twenty minutes".to_string(),
            })
        );

        std::env::remove_var(TTL_ENV);
        std::env::remove_var(CLEANUP_INTERVAL_ENV);
    }
}
