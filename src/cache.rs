//! Cache-aside request engine with stale fallback.

use crate::backend::StorageBackend;
use crate::builder::RequestBuilder;
use crate::entry::{now_millis, CacheEntry};
use crate::error::Result;
use crate::key::namespaced;
use crate::observability::{CacheMetrics, NoOpMetrics, TtlPolicy};
use crate::serialization::{deserialize_from_store, serialize_for_store};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Display;
use std::future::Future;
use std::time::{Duration, Instant};

/// Wraps asynchronous producers with a time-boxed persistent cache.
///
/// Each call makes one of two decisions:
///
/// - a stored entry younger than the TTL is returned and the producer is not called
/// - otherwise the producer runs; success is stored and returned, failure falls back to
///   whatever was stored before (however old), and only with nothing stored does the
///   producer's error reach the caller
///
/// Storage problems never fail a request: an unreadable entry is a miss and a failed write
/// still returns the fresh value.
///
/// Concurrent misses on the same key are not coalesced; both producers run and the last
/// write wins.
///
/// # Example
///
/// ```ignore
/// use newsroom_kit::{RequestCache, backend::InMemoryBackend};
/// use std::time::Duration;
///
/// let cache = RequestCache::new(InMemoryBackend::new()).with_namespace("api");
/// let headlines = cache
///     .cached_request("news:category=tech", Duration::from_secs(60), || fetch_headlines())
///     .await?;
/// ```
pub struct RequestCache<B: StorageBackend> {
    backend: B,
    namespace: Option<String>,
    metrics: Box<dyn CacheMetrics>,
    pub(crate) ttl_policy: TtlPolicy,
}

impl<B: StorageBackend> RequestCache<B> {
    /// Create a cache over `backend` with the default TTL policy and no namespace.
    pub fn new(backend: B) -> Self {
        RequestCache {
            backend,
            namespace: None,
            metrics: Box::new(NoOpMetrics),
            ttl_policy: TtlPolicy::default(),
        }
    }

    /// Prefix every stored key with `namespace:`.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Set custom metrics handler.
    pub fn with_metrics(mut self, metrics: Box<dyn CacheMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Set the TTL used when a call does not pass one.
    pub fn with_ttl_policy(mut self, policy: TtlPolicy) -> Self {
        self.ttl_policy = policy;
        self
    }

    /// Start a configurable request for `key`.
    ///
    /// ```ignore
    /// let summary = cache
    ///     .request(format!("summary:{}", article_id))
    ///     .with_ttl(Duration::from_secs(3600))
    ///     .with_retry(RetryPolicy::default())
    ///     .execute(|| generate_summary(&remote, article_id))
    ///     .await?;
    /// ```
    pub fn request(&self, key: impl Into<String>) -> RequestBuilder<'_, B> {
        RequestBuilder::new(self, key.into())
    }

    /// Window the TTL policy assigns to `key`.
    pub fn ttl_for(&self, key: &str) -> Duration {
        self.ttl_policy.get_ttl(key)
    }

    /// [`cached_request`](Self::cached_request) with the policy's TTL for `key`.
    pub async fn get_or_fetch<T, E, F, Fut>(&self, key: &str, producer: F) -> std::result::Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: Display,
    {
        let ttl = self.ttl_for(key);
        self.cached_request(key, ttl, producer).await
    }

    /// Serve `key` from storage if younger than `ttl`, otherwise run `producer`.
    ///
    /// # Errors
    ///
    /// Returns the producer's own error, unchanged, only when the producer fails and
    /// nothing at all is stored for `key`.
    pub async fn cached_request<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        producer: F,
    ) -> std::result::Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: Display,
    {
        let timer = Instant::now();
        let store_key = self.store_key(key);

        let prior = match self.read_entry::<T>(&store_key) {
            Some(entry) if entry.is_fresh(ttl, now_millis()) => {
                debug!("✓ Cache hit for {}", store_key);
                self.metrics.record_hit(&store_key, timer.elapsed());
                return Ok(entry.data);
            }
            Some(entry) => {
                debug!(
                    "Cache entry for {} expired ({} ms old, ttl {:?}), refreshing",
                    store_key,
                    entry.age_millis(now_millis()),
                    ttl
                );
                Some(entry)
            }
            None => {
                debug!("✗ Cache miss for {}", store_key);
                None
            }
        };

        match producer().await {
            Ok(value) => {
                self.write_entry(&store_key, &value);
                self.metrics.record_miss(&store_key, timer.elapsed());
                Ok(value)
            }
            Err(e) => match prior {
                Some(entry) => {
                    warn!(
                        "Producer failed for {}, serving stale value from {}: {}",
                        store_key, entry.timestamp, e
                    );
                    self.metrics.record_stale(&store_key, timer.elapsed());
                    Ok(entry.data)
                }
                None => {
                    self.metrics.record_error(&store_key, &e.to_string());
                    Err(e)
                }
            },
        }
    }

    /// Stored entry for `key` regardless of age, `None` if absent or unreadable.
    pub fn peek<T: DeserializeOwned>(&self, key: &str) -> Option<CacheEntry<T>> {
        self.read_entry(&self.store_key(key))
    }

    /// Remove the entry for `key`.
    ///
    /// # Errors
    /// Returns `Error::BackendError` if the backend refuses the removal.
    pub fn invalidate(&self, key: &str) -> Result<()> {
        let store_key = self.store_key(key);
        self.backend.remove(&store_key)?;
        debug!("✓ Cache invalidated for {}", store_key);
        Ok(())
    }

    /// Remove every entry under this cache's namespace (everything if it has none).
    ///
    /// Returns the number of removed entries.
    pub fn clear(&self) -> Result<usize> {
        let keys = self.backend.keys()?;
        let mut removed = 0;
        match &self.namespace {
            Some(ns) => {
                let prefix = format!("{}:", ns);
                for key in keys.iter().filter(|k| k.starts_with(&prefix)) {
                    self.backend.remove(key)?;
                    removed += 1;
                }
            }
            None => {
                self.backend.clear_all()?;
                removed = keys.len();
            }
        }
        info!("✓ Cleared {} cache entries", removed);
        Ok(removed)
    }

    /// Get backend reference (for advanced use).
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Get mutable backend reference (for advanced use).
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    fn store_key(&self, key: &str) -> String {
        namespaced(self.namespace.as_deref(), key)
    }

    fn read_entry<T: DeserializeOwned>(&self, store_key: &str) -> Option<CacheEntry<T>> {
        let bytes = match self.backend.get(store_key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                warn!("Cache read failed for {}, treating as miss: {}", store_key, e);
                return None;
            }
        };

        match deserialize_from_store::<CacheEntry<T>>(&bytes) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(
                    "Cache entry for {} is unreadable, treating as miss: {}",
                    store_key, e
                );
                None
            }
        }
    }

    fn write_entry<T: Serialize>(&self, store_key: &str, value: &T) {
        let entry = CacheEntry::new(value);
        let written = serialize_for_store(&entry).and_then(|bytes| self.backend.set(store_key, bytes));
        match written {
            Ok(()) => debug!("✓ Cached {}", store_key),
            Err(e) => warn!("Cache write failed for {}, value served uncached: {}", store_key, e),
        }
    }
}
