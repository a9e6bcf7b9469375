//! Builder pattern for configurable cached requests.

use crate::backend::StorageBackend;
use crate::cache::RequestCache;
use crate::retry::RetryPolicy;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Fluent builder for one cached request.
///
/// Provides chainable methods to override the TTL and to wrap the producer in the retry
/// engine. Retries happen inside the cache decision: only after the last attempt fails
/// does the cache consider serving a stale value.
///
/// # Example
///
/// ```ignore
/// use newsroom_kit::RetryPolicy;
/// use std::time::Duration;
///
/// let news = cache
///     .request(CacheKey::new("news").param("page", 1).build())
///     .with_ttl(Duration::from_secs(300))
///     .with_retry(RetryPolicy::default())
///     .execute(|| call_function(&remote, "fetchNews", json!({ "page": 1 })))
///     .await?;
/// ```
pub struct RequestBuilder<'a, B: StorageBackend> {
    cache: &'a RequestCache<B>,
    key: String,
    ttl_override: Option<Duration>,
    retry: Option<RetryPolicy>,
}

impl<'a, B: StorageBackend> RequestBuilder<'a, B> {
    pub(crate) fn new(cache: &'a RequestCache<B>, key: String) -> Self {
        Self {
            cache,
            key,
            ttl_override: None,
            retry: None,
        }
    }

    /// Override TTL for this request.
    ///
    /// Without it the cache's TTL policy decides.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl_override = Some(ttl);
        self
    }

    /// Retry the producer according to `policy` before giving up on it.
    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Shorthand for [`with_retry`](Self::with_retry) with the default initial delay.
    pub fn with_retry_attempts(self, max_attempts: u32) -> Self {
        self.with_retry(RetryPolicy {
            max_attempts,
            ..RetryPolicy::default()
        })
    }

    /// Key this request reads and writes (before namespacing).
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Execute the request.
    ///
    /// # Errors
    ///
    /// Returns the producer's last error when every attempt failed and nothing is
    /// stored for the key.
    pub async fn execute<T, E, F, Fut>(self, producer: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let ttl = self
            .ttl_override
            .unwrap_or_else(|| self.cache.ttl_for(&self.key));

        match self.retry {
            Some(policy) => {
                self.cache
                    .cached_request(&self.key, ttl, move || policy.run(producer))
                    .await
            }
            None => self.cache.cached_request(&self.key, ttl, producer).await,
        }
    }
}
