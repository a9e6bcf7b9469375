//! # newsroom-kit
//!
//! Shared plumbing for a news client backed by cloud functions.
//!
//! ## Features
//!
//! - **Stale-fallback cache:** [`RequestCache`] serves fresh stored results, refreshes
//!   expired ones, and falls back to the last good value when a refresh fails
//! - **Retry:** [`retry()`] and [`RetryPolicy`] run an operation with bounded exponential
//!   backoff
//! - **Layered configuration:** [`ConfigResolver`] settles on one configuration per
//!   process from memory, local storage, a remote source, or built-in defaults
//! - **Remote calls:** [`RemoteCall`] abstracts the cloud-function transport with a tagged
//!   success/failure response
//! - **Pluggable storage:** in-memory and file-backed [`StorageBackend`]s
//!
//! ## Quick Start
//!
//! ```ignore
//! use newsroom_kit::{
//!     backend::FileBackend,
//!     config::{ConfigResolver, ProcessEnvironment, RemoteConfigSource},
//!     key::CacheKey,
//!     remote::call_function,
//!     CacheService, RequestCache, RetryPolicy,
//! };
//! use std::sync::Arc;
//!
//! // 1. Resolve configuration once per process
//! newsroom_kit::config::load_dotenv();
//! let store = Arc::new(FileBackend::open("./storage")?);
//! let resolver = ConfigResolver::new(
//!     store.clone(),
//!     RemoteConfigSource::new(transport.clone()),
//!     Arc::new(ProcessEnvironment::new()),
//! );
//! let config = resolver.all_async().await;
//! newsroom_kit::logging::init_from_config(&config);
//!
//! // 2. Cache remote calls, retrying transient failures
//! let cache = CacheService::new(RequestCache::new(store).with_namespace("api"));
//! let key = CacheKey::new("news").param("category", "tech").build();
//! let news: Vec<Article> = cache
//!     .request(key)
//!     .with_ttl(config.cache_ttl())
//!     .with_retry(RetryPolicy::default())
//!     .execute(|| call_function(&transport, "fetchNews", json!({ "category": "tech" })))
//!     .await?;
//! ```

#[macro_use]
extern crate log;

pub mod backend;
pub mod builder;
pub mod cache;
pub mod config;
pub mod entry;
pub mod error;
pub mod key;
pub mod logging;
pub mod observability;
pub mod remote;
pub mod retry;
pub mod serialization;
pub mod service;

// Re-exports for convenience
pub use backend::StorageBackend;
pub use builder::RequestBuilder;
pub use cache::RequestCache;
pub use config::{ConfigResolver, ConfigSnapshot};
pub use entry::CacheEntry;
pub use error::{Error, Result};
pub use remote::{RemoteCall, RemoteResponse};
pub use retry::{retry, RetryPolicy};
pub use service::CacheService;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
