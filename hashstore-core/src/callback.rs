//! Callback payload codec for inline keyboards.
//!
//! Inline buttons can only carry 64 bytes of callback data, so the bot keeps
//! the real context in a [`HashStorage`] and puts a short key on the button.
//! When the user taps it, the key comes back in the callback query and is
//! resolved here.

use uuid::Uuid;

use crate::error::StorageError;
use crate::storage::{is_hash, HashStorage};

/// Telegram's limit on `callback_data`, in bytes
pub const CALLBACK_DATA_LIMIT: usize = 64;

/// Prefix marking payloads issued by [`CallbackCodec::issue`]
pub const DEFAULT_PREFIX: &str = "cb:";

/// Reply sent to the user when a button outlived its stored context
pub const EXPIRED_REPLY: &str = "This button has expired, please try again.";

/// Outcome of resolving an incoming callback payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<C> {
    /// The stored context is still live
    Resolved(C),
    /// Unknown or expired key; the user should start over
    Expired,
    /// Payload was not issued by this codec
    Unrecognized,
}

impl<C> Resolution<C> {
    /// Message to answer the callback query with, if any
    pub fn reply_text(&self) -> Option<&'static str> {
        match self {
            Resolution::Expired => Some(EXPIRED_REPLY),
            _ => None,
        }
    }

    pub fn into_context(self) -> Option<C> {
        match self {
            Resolution::Resolved(context) => Some(context),
            _ => None,
        }
    }

    pub fn is_expired(&self) -> bool {
        matches!(self, Resolution::Expired)
    }
}

/// Issues and resolves callback payloads backed by a [`HashStorage`].
///
/// Keys are random UUIDs, since callback data is visible to chat clients and
/// must not be guessable.
#[derive(Debug, Clone)]
pub struct CallbackCodec<C = String> {
    storage: HashStorage<C>,
    prefix: String,
}

impl<C> CallbackCodec<C>
where
    C: Clone + Send + Sync + 'static,
{
    pub fn new(storage: HashStorage<C>) -> Self {
        Self {
            storage,
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }

    /// Uses a custom payload prefix, e.g. one per menu
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn storage(&self) -> &HashStorage<C> {
        &self.storage
    }

    /// Stores `context` under a fresh key and returns the callback data to
    /// put on the button.
    pub fn issue(&self, context: C) -> Result<String, StorageError> {
        let key = Uuid::new_v4().simple().to_string();
        let data = format!("{}{}", self.prefix, key);
        if data.len() > CALLBACK_DATA_LIMIT {
            return Err(StorageError::CallbackDataTooLong {
                len: data.len(),
                max: CALLBACK_DATA_LIMIT,
            });
        }

        self.storage.put(key, context)?;
        Ok(data)
    }

    /// Looks up the context behind a callback payload. The entry stays in
    /// place, so the button keeps working until it expires.
    pub fn resolve(&self, data: &str) -> Resolution<C> {
        match self.key_of(data) {
            Some(key) => self
                .storage
                .get(key)
                .map_or(Resolution::Expired, Resolution::Resolved),
            None => Resolution::Unrecognized,
        }
    }

    /// Like [`resolve`](Self::resolve) but removes the entry, for buttons that
    /// must act only once. Concurrent taps resolve at most once.
    pub fn consume(&self, data: &str) -> Resolution<C> {
        match self.key_of(data) {
            Some(key) => self
                .storage
                .take(key)
                .map_or(Resolution::Expired, Resolution::Resolved),
            None => Resolution::Unrecognized,
        }
    }

    fn key_of<'a>(&self, data: &'a str) -> Option<&'a str> {
        data.strip_prefix(self.prefix.as_str())
            .filter(|key| !key.is_empty())
    }
}

impl CallbackCodec<String> {
    /// Turns a raw callback query into callback data.
    ///
    /// Queries that fit into a button travel as-is; longer ones (and ones that
    /// would be mistaken for a hash) are swapped for a content hash.
    pub fn encode_query(&self, query: &str) -> Result<String, StorageError> {
        if query.len() <= CALLBACK_DATA_LIMIT && !is_hash(query) {
            return Ok(query.to_string());
        }
        self.storage.save_hash(query)
    }

    /// Reverses [`encode_query`](Self::encode_query). A hash whose query is
    /// gone yields [`Resolution::Expired`].
    pub fn decode_query(&self, data: &str) -> Resolution<String> {
        if !is_hash(data) {
            return Resolution::Resolved(data.to_string());
        }
        match self.storage.get(data) {
            Some(query) => Resolution::Resolved(query),
            None => {
                tracing::debug!("callback query hash expired");
                Resolution::Expired
            }
        }
    }
}
