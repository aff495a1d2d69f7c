//! Error types for the hash storage.

use std::time::Duration;
use thiserror::Error;

/// Errors raised while building a [`HashStorage`](crate::HashStorage).
///
/// These are setup failures: they surface once, at construction, and are
/// never produced by regular reads or writes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The entry time-to-live must be positive
    #[error("TTL must be greater than zero")]
    ZeroTtl,

    /// TTL beyond the supported horizon (about 100 years)
    #[error("TTL {ttl:?} exceeds the maximum of {max:?}")]
    TtlTooLong {
        /// Requested TTL
        ttl: Duration,
        /// Largest accepted TTL
        max: Duration,
    },

    /// The sweep period must be positive
    #[error("cleanup interval must be greater than zero")]
    ZeroCleanupInterval,

    /// The sweep period must not exceed the TTL
    #[error("cleanup interval {interval:?} exceeds TTL {ttl:?}")]
    CleanupIntervalExceedsTtl {
        /// Requested sweep period
        interval: Duration,
        /// Configured TTL
        ttl: Duration,
    },

    /// The background sweep needs a Tokio runtime to be spawned on
    #[error("hash storage requires a Tokio runtime; construct it from within #[tokio::main] or #[tokio::test]")]
    NoRuntime,

    /// An environment variable held something other than a whole number of seconds
    #[error("invalid value {value:?} for {var}: expected a number of seconds")]
    InvalidEnv {
        /// Variable name
        var: &'static str,
        /// Raw value found in the environment
        value: String,
    },
}

/// Usage errors for write operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Keys must be non-empty
    #[error("key cannot be empty")]
    EmptyKey,

    /// Key longer than [`MAX_KEY_LENGTH`](crate::MAX_KEY_LENGTH)
    #[error("key is {len} bytes, maximum is {max}")]
    KeyTooLong {
        /// Actual key length in bytes
        len: usize,
        /// Maximum accepted length in bytes
        max: usize,
    },

    /// Callback payload would not fit into a Telegram inline button
    #[error("callback data is {len} bytes, Telegram allows at most {max}")]
    CallbackDataTooLong {
        /// Actual payload length in bytes
        len: usize,
        /// Telegram's limit
        max: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_messages() {
        let err = ConfigError::CleanupIntervalExceedsTtl {
            interval: Duration::from_secs(120),
            ttl: Duration::from_secs(60),
        };
        assert_eq!(err.to_string(), "cleanup interval 120s exceeds TTL 60s");

        let err = ConfigError::InvalidEnv {
            var: "HASH_STORAGE_TTL_SECS",
            value: "soon".to_string(),
        };
        assert!(err.to_string().contains("HASH_STORAGE_TTL_SECS"));
        assert!(err.to_string().contains("\"soon\""));
    }

    #[test]
    fn test_storage_error_contains_sizes() {
        let err = StorageError::KeyTooLong { len: 2000, max: 1024 };
        assert_eq!(err.to_string(), "key is 2000 bytes, maximum is 1024");
    }
}
