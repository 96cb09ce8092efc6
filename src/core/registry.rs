//! Call metadata registry.
//!
//! Maps a provider call identifier to the language pair negotiated by the
//! call-setup webhook. The media stream for that call consumes the entry once
//! when it starts. Entries for calls whose stream never starts are reclaimed by
//! TTL eviction.

use std::time::{Duration, Instant};

use moka::future::Cache;

use crate::core::languages::LanguagePair;

/// Default lifetime of an unclaimed entry.
pub const DEFAULT_CALL_METADATA_TTL: Duration = Duration::from_secs(300);

/// Default upper bound on concurrently pending calls.
pub const DEFAULT_CALL_METADATA_CAPACITY: u64 = 10_000;

#[derive(Debug, Clone, Copy)]
struct RegisteredCall {
    languages: LanguagePair,
    registered_at: Instant,
}

/// Short-lived call identifier → language pair store.
///
/// Cloning is cheap; clones share the same underlying cache.
#[derive(Clone)]
pub struct CallRegistry {
    entries: Cache<String, RegisteredCall>,
    ttl: Duration,
}

impl CallRegistry {
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        let entries = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();
        Self { entries, ttl }
    }

    /// Record the pair for a call, replacing any previous entry.
    pub async fn put(&self, call_sid: impl Into<String>, languages: LanguagePair) {
        let call_sid = call_sid.into();
        tracing::debug!(call_sid = %call_sid, languages = %languages, "Registered call languages");
        let entry = RegisteredCall {
            languages,
            registered_at: Instant::now(),
        };
        self.entries.insert(call_sid, entry).await;
    }

    /// Atomically read and remove the pair for a call.
    ///
    /// An entry older than the TTL is removed but not returned; the cache only
    /// drops expired entries during its housekeeping.
    pub async fn take(&self, call_sid: &str) -> Option<LanguagePair> {
        let entry = self.entries.remove(call_sid).await?;
        if entry.registered_at.elapsed() >= self.ttl {
            tracing::debug!(call_sid = %call_sid, "Discarding expired call languages");
            return None;
        }
        Some(entry.languages)
    }

    /// Approximate number of unclaimed entries.
    pub fn pending_calls(&self) -> u64 {
        self.entries.entry_count()
    }
}

impl Default for CallRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_CALL_METADATA_TTL, DEFAULT_CALL_METADATA_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(source: &str, target: &str) -> LanguagePair {
        LanguagePair::resolve(Some(source), Some(target))
    }

    #[tokio::test]
    async fn test_take_returns_entry_exactly_once() {
        let registry = CallRegistry::default();
        registry.put("CA123", pair("fr", "de")).await;

        assert_eq!(registry.take("CA123").await, Some(pair("fr", "de")));
        assert_eq!(registry.take("CA123").await, None);
    }

    #[tokio::test]
    async fn test_take_missing_returns_none() {
        let registry = CallRegistry::default();
        assert!(registry.take("CA-unknown").await.is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites_previous_entry() {
        let registry = CallRegistry::default();
        registry.put("CA1", pair("fr", "de")).await;
        registry.put("CA1", pair("ja", "ko")).await;

        assert_eq!(registry.take("CA1").await, Some(pair("ja", "ko")));
        assert_eq!(registry.take("CA1").await, None);
    }

    #[tokio::test]
    async fn test_entries_are_independent_per_call() {
        let registry = CallRegistry::default();
        registry.put("CA1", pair("fr", "en")).await;
        registry.put("CA2", pair("it", "en")).await;

        assert_eq!(registry.take("CA2").await, Some(pair("it", "en")));
        assert_eq!(registry.take("CA1").await, Some(pair("fr", "en")));
    }

    #[tokio::test]
    async fn test_unclaimed_entry_expires() {
        let registry = CallRegistry::new(Duration::from_millis(50), 100);
        registry.put("CA-abandoned", pair("pt", "en")).await;

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(registry.take("CA-abandoned").await.is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_is_not_handed_to_a_new_stream() {
        let registry = CallRegistry::new(Duration::from_millis(50), 100);
        registry.put("CA-stale", pair("pt", "de")).await;

        tokio::time::sleep(Duration::from_millis(300)).await;
        registry.put("CA-fresh", pair("ja", "en")).await;

        assert_eq!(registry.take("CA-stale").await, None);
        assert_eq!(registry.take("CA-fresh").await, Some(pair("ja", "en")));
        // Consumed even though it had expired.
        assert_eq!(registry.take("CA-stale").await, None);
    }

    #[tokio::test]
    async fn test_concurrent_put_and_take() {
        let registry = CallRegistry::default();
        let mut handles = Vec::new();
        for i in 0..32 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                let call_sid = format!("CA{i}");
                registry.put(call_sid.clone(), pair("es", "en")).await;
                registry.take(&call_sid).await
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap(), Some(pair("es", "en")));
        }
    }
}
