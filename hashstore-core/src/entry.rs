use tokio::time::Instant;

/// A stored value together with its expiration deadline
#[derive(Debug, Clone)]
pub struct Entry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> Entry<V> {
    /// Creates a new entry with the given value and expiration time
    pub fn new(value: V, expires_at: Instant) -> Self {
        Self { value, expires_at }
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn into_value(self) -> V {
        self.value
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    /// Checks if this entry has expired as of `now`.
    ///
    /// The deadline itself already counts as expired.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    /// Checks if this entry has expired
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_entry_not_expired() {
        let entry = Entry::new("test_value", Instant::now() + Duration::from_secs(60));

        assert_eq!(*entry.value(), "test_value");
        assert!(!entry.is_expired());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expired() {
        let entry = Entry::new(7u32, Instant::now() + Duration::from_secs(1));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(entry.is_expired());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_counts_as_expired() {
        let deadline = Instant::now() + Duration::from_secs(10);
        let entry = Entry::new((), deadline);

        assert!(!entry.is_expired_at(deadline - Duration::from_nanos(1)));
        assert!(entry.is_expired_at(deadline));
        assert_eq!(entry.expires_at(), deadline);
    }
}
