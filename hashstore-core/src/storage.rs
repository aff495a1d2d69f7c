use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};

use crate::config::StorageConfig;
use crate::entry::Entry;
use crate::error::{ConfigError, StorageError};

/// Maximum allowed key length (1 KB)
pub const MAX_KEY_LENGTH: usize = 1024;

/// Length of the content-derived keys produced by [`HashStorage::save_hash`]
pub const HASH_LENGTH: usize = 32;

/// Truncates a key for safe logging (callback keys are visible to chat clients)
fn truncate_key_for_log(key: &str) -> String {
    const MAX_LOG_CHARS: usize = 16;
    if key.chars().count() <= MAX_LOG_CHARS {
        key.to_string()
    } else {
        let head: String = key.chars().take(MAX_LOG_CHARS).collect();
        format!("{head}...")
    }
}

fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty() {
        return Err(StorageError::EmptyKey);
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(StorageError::KeyTooLong {
            len: key.len(),
            max: MAX_KEY_LENGTH,
        });
    }
    Ok(())
}

/// Returns `true` if `candidate` has the shape of a key produced by
/// [`HashStorage::save_hash`]: exactly 32 lowercase hex characters.
pub fn is_hash(candidate: &str) -> bool {
    candidate.len() == HASH_LENGTH
        && candidate
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Internal shared state for the storage
struct StorageInner<V> {
    data: DashMap<String, Entry<V>>,
    ttl: Duration,
    /// Signals shutdown to the sweep task. Dropping it (last handle gone)
    /// stops the task as well.
    shutdown_tx: watch::Sender<bool>,
}

/// Thread-safe key/value storage where every entry expires a fixed TTL after
/// its last `put`.
///
/// Backed by `DashMap`, so reads and writes on different keys do not contend
/// on a single lock. Expired entries are never returned: `get` checks the
/// deadline on every read and drops stale entries it runs into, while a
/// background task sweeps the whole map every `cleanup_interval` to reclaim
/// entries nobody asks for again.
///
/// Cloning is cheap and every clone shares the same data. The sweep task
/// stops on [`shutdown`](Self::shutdown) or once the last clone is dropped.
///
/// # Example
///
/// ```rust,no_run
/// use hashstore_core::HashStorage;
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() {
///     let storage: HashStorage<String> =
///         HashStorage::new(Duration::from_secs(20 * 60)).unwrap();
///
///     storage.put("abc123", "context".to_string()).unwrap();
///     assert_eq!(storage.get("abc123").as_deref(), Some("context"));
///
///     storage.delete("abc123");
/// }
/// ```
pub struct HashStorage<V = String> {
    inner: Arc<StorageInner<V>>,
}

impl<V> Clone for HashStorage<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> std::fmt::Debug for HashStorage<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashStorage")
            .field("ttl", &self.inner.ttl)
            .field("len", &self.inner.data.len())
            .finish()
    }
}

impl<V> HashStorage<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates an empty storage with the given TTL and a sweep period of a
    /// tenth of it.
    ///
    /// # Errors
    ///
    /// Fails on a zero or oversized TTL, or when called outside of a Tokio
    /// runtime (the sweep task has to be spawned somewhere).
    pub fn new(ttl: Duration) -> Result<Self, ConfigError> {
        Self::with_config(StorageConfig::new(ttl))
    }

    /// Creates an empty storage with an explicit configuration
    pub fn with_config(config: StorageConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| ConfigError::NoRuntime)?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let inner = Arc::new(StorageInner {
            data: DashMap::new(),
            ttl: config.ttl,
            shutdown_tx,
        });

        runtime.spawn(Self::cleanup_task(
            Arc::downgrade(&inner),
            config.cleanup_interval,
            shutdown_rx,
        ));

        tracing::debug!(
            ttl = ?config.ttl,
            cleanup_interval = ?config.cleanup_interval,
            "hash storage created"
        );

        Ok(Self { inner })
    }

    /// Background task that periodically removes expired entries.
    ///
    /// Holds only a weak reference so it never keeps the storage alive.
    async fn cleanup_task(
        inner: Weak<StorageInner<V>>,
        interval: Duration,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let Some(strong) = inner.upgrade() else {
                        break;
                    };
                    let removed = Self::cleanup_internal(&strong);
                    if removed > 0 {
                        tracing::debug!(
                            removed,
                            remaining = strong.data.len(),
                            "swept expired hash storage entries"
                        );
                    }
                }
                changed = shutdown_rx.changed() => {
                    // Err means every storage handle is gone
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::debug!("hash storage sweep stopped");
    }

    fn cleanup_internal(inner: &StorageInner<V>) -> usize {
        let now = Instant::now();
        let mut removed_count = 0;

        inner.data.retain(|_, entry| {
            if entry.is_expired_at(now) {
                removed_count += 1;
                false
            } else {
                true
            }
        });

        removed_count
    }

    /// Stores `value` under `key`, replacing any previous entry and restarting
    /// its TTL.
    ///
    /// # Errors
    ///
    /// Rejects empty keys and keys longer than [`MAX_KEY_LENGTH`].
    pub fn put(&self, key: impl Into<String>, value: V) -> Result<(), StorageError> {
        let key = key.into();
        validate_key(&key)?;

        let expires_at = Instant::now() + self.inner.ttl;
        tracing::debug!(key = %truncate_key_for_log(&key), "PUT");
        self.inner.data.insert(key, Entry::new(value, expires_at));
        Ok(())
    }

    /// Retrieves a clone of the value stored under `key`.
    ///
    /// Returns `None` if the key doesn't exist or has expired; the two cases
    /// look the same to the caller. An expired entry found here is
    /// removed on the spot.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let entry = self.inner.data.get(key)?;

        if entry.is_expired_at(now) {
            // Drop the read guard before taking the shard write lock
            drop(entry);
            // A concurrent put may have refreshed the entry in between;
            // remove_if re-checks under the write lock.
            self.inner
                .data
                .remove_if(key, |_, entry| entry.is_expired_at(now));
            return None;
        }

        Some(entry.value().value().clone())
    }

    /// Removes `key` and returns its value if it was still live.
    ///
    /// Unlike a `get` followed by `delete`, only one of several concurrent
    /// callers can win the value.
    pub fn take(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let (_, entry) = self.inner.data.remove(key)?;
        tracing::debug!(key = %truncate_key_for_log(key), "TAKE");
        (!entry.is_expired_at(now)).then(|| entry.into_value())
    }

    /// Deletes `key`. Deleting an absent or expired key is a no-op.
    ///
    /// Returns `true` if an entry was physically present, expired or not.
    pub fn delete(&self, key: &str) -> bool {
        let removed = self.inner.data.remove(key).is_some();
        if removed {
            tracing::debug!(key = %truncate_key_for_log(key), "DELETE");
        }
        removed
    }

    /// Checks if a key exists and is not expired
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        let now = Instant::now();
        self.inner
            .data
            .get(key)
            .is_some_and(|entry| !entry.is_expired_at(now))
    }

    /// Runs one sweep pass right now and returns the number of entries removed
    pub fn cleanup(&self) -> usize {
        Self::cleanup_internal(&self.inner)
    }

    /// Drops every entry. Returns the approximate number removed.
    pub fn reset(&self) -> usize {
        let count = self.inner.data.len();
        self.inner.data.clear();
        tracing::debug!(removed = count, "hash storage reset");
        count
    }

    /// Number of entries held, including expired ones not yet swept
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.data.is_empty()
    }

    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    /// Stops the background sweep task.
    ///
    /// The storage keeps working afterwards; expired entries are then only
    /// dropped lazily by `get` or by an explicit [`cleanup`](Self::cleanup).
    pub fn shutdown(&self) {
        if !self.inner.shutdown_tx.send_replace(true) {
            tracing::info!("hash storage sweep shutting down");
        }
    }
}

impl HashStorage<String> {
    /// Stores a callback query under a key derived from its content and
    /// returns that key.
    ///
    /// Telegram caps callback data at 64 bytes, so long queries travel as
    /// this 32 character hex digest instead. Saving the same query twice
    /// yields the same key and restarts its TTL.
    pub fn save_hash(&self, query: &str) -> Result<String, StorageError> {
        let digest = Sha256::digest(query.as_bytes());
        let hash: String = digest
            .iter()
            .take(HASH_LENGTH / 2)
            .map(|byte| format!("{byte:02x}"))
            .collect();

        self.put(hash.clone(), query.to_string())?;
        Ok(hash)
    }
}
