//! Shareable handle around [`RequestCache`].

use crate::backend::StorageBackend;
use crate::cache::RequestCache;
use std::ops::Deref;
use std::sync::Arc;

/// Cheaply cloneable cache handle for sharing between tasks and page-level loaders.
///
/// Clones point at the same [`RequestCache`]; all of its methods are reachable through
/// `Deref`.
///
/// ```ignore
/// let cache = CacheService::new(RequestCache::new(FileBackend::open("./store")?));
/// let (news, comments) = tokio::join!(
///     cache.cached_request("news", ttl, || fetch_news()),
///     cache.clone().cached_request("comments:id=7", ttl, || fetch_comments(7)),
/// );
/// ```
pub struct CacheService<B: StorageBackend> {
    inner: Arc<RequestCache<B>>,
}

impl<B: StorageBackend> CacheService<B> {
    pub fn new(cache: RequestCache<B>) -> Self {
        CacheService {
            inner: Arc::new(cache),
        }
    }

    /// Build a service over `backend` with default settings.
    pub fn from_backend(backend: B) -> Self {
        Self::new(RequestCache::new(backend))
    }
}

impl<B: StorageBackend> Clone for CacheService<B> {
    fn clone(&self) -> Self {
        CacheService {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: StorageBackend> Deref for CacheService<B> {
    type Target = RequestCache<B>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
