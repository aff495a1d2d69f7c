//! # Hashstore Core
//!
//! In-memory TTL storage that correlates Telegram inline-keyboard callbacks
//! with the bot-side context they were issued for.
//!
//! ## Features
//!
//! - Thread-safe storage using `DashMap`
//! - Store-wide TTL, restarted by every `put` on the same key
//! - Automatic expiration on read (lazy cleanup)
//! - Background sweep task per storage instance, stopped on shutdown or drop
//! - Callback payload codec with graceful handling of expired buttons
//!
//! ## Example
//!
//! ```rust,no_run
//! use hashstore_core::{CallbackCodec, HashStorage, Resolution, StorageConfig};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = StorageConfig::new(Duration::from_secs(20 * 60))
//!         .with_cleanup_interval(Duration::from_secs(60));
//!     let storage: HashStorage<String> = HashStorage::with_config(config).unwrap();
//!
//!     let codec = CallbackCodec::new(storage.clone());
//!     let data = codec.issue("inbound 7".to_string()).unwrap();
//!
//!     match codec.resolve(&data) {
//!         Resolution::Resolved(context) => println!("tapped: {}", context),
//!         other => println!("{}", other.reply_text().unwrap_or("ignored")),
//!     }
//!
//!     storage.shutdown();
//! }
//! ```

mod callback;
mod config;
mod entry;
mod error;
mod storage;

pub use callback::{CallbackCodec, Resolution, CALLBACK_DATA_LIMIT, DEFAULT_PREFIX, EXPIRED_REPLY};
pub use config::{StorageConfig, CLEANUP_INTERVAL_ENV, DEFAULT_TTL, MAX_TTL, TTL_ENV};
pub use entry::Entry;
pub use error::{ConfigError, StorageError};
pub use storage::{is_hash, HashStorage, HASH_LENGTH, MAX_KEY_LENGTH};
