//! Process-scoped configuration resolution.

use super::defaults::default_config;
use super::{
    validate_snapshot, AppConfig, ConfigMap, ConfigOrigin, ConfigSnapshot, ConfigSource,
    EnvironmentDetector, ValidationReport,
};
use crate::backend::StorageBackend;
use crate::error::Result;
use crate::serialization::{deserialize_from_store, serialize_for_store};
use std::sync::{Arc, PoisonError, RwLock};

/// Storage key holding the persisted snapshot.
pub const CONFIG_STORAGE_KEY: &str = "env_config";

/// Resolves configuration once per process and serves it to consumers.
///
/// Create one per process and hand it out by reference. Resolution happens on the first
/// [`resolve`](Self::resolve); afterwards the snapshot never changes until
/// [`reload`](Self::reload) or [`invalidate`](Self::invalidate) is called explicitly.
/// Concurrent first calls share a single resolution.
///
/// Remote failures are logged and never reach the caller: the worst outcome is the
/// built-in default table.
pub struct ConfigResolver<B, S> {
    store: B,
    source: S,
    detector: Arc<dyn EnvironmentDetector>,
    storage_key: String,
    snapshot: RwLock<Option<Arc<ConfigSnapshot>>>,
    resolving: tokio::sync::Mutex<()>,
}

impl<B: StorageBackend, S: ConfigSource> ConfigResolver<B, S> {
    pub fn new(store: B, source: S, detector: Arc<dyn EnvironmentDetector>) -> Self {
        ConfigResolver {
            store,
            source,
            detector,
            storage_key: CONFIG_STORAGE_KEY.to_string(),
            snapshot: RwLock::new(None),
            resolving: tokio::sync::Mutex::new(()),
        }
    }

    /// Persist the snapshot under a different storage key.
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Resolve (first call) or return the memoized snapshot.
    pub async fn resolve(&self) -> Arc<ConfigSnapshot> {
        if let Some(snapshot) = self.snapshot() {
            return snapshot;
        }

        let _gate = self.resolving.lock().await;
        if let Some(snapshot) = self.snapshot() {
            return snapshot;
        }

        let snapshot = Arc::new(self.resolve_tiers().await);
        info!(
            "✓ Configuration resolved from {:?} ({} keys)",
            snapshot.origin(),
            snapshot.len()
        );

        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = Some(snapshot.clone());
        snapshot
    }

    /// Forget the persisted and memoized snapshots, then resolve again.
    ///
    /// Waits for any resolution in flight, so its result cannot land after the reset.
    pub async fn reload(&self) -> Arc<ConfigSnapshot> {
        {
            let _gate = self.resolving.lock().await;
            if let Err(e) = self.clear_local() {
                warn!("Could not clear persisted configuration: {}", e);
            }
            self.invalidate();
        }
        self.resolve().await
    }

    /// Forget the memoized snapshot; the next resolve starts again from local storage.
    pub fn invalidate(&self) {
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Remove the persisted snapshot. The memoized one is untouched.
    ///
    /// # Errors
    /// Returns `Error::BackendError` if the store refuses the removal.
    pub fn clear_local(&self) -> Result<()> {
        self.store.remove(&self.storage_key)?;
        info!("✓ Persisted configuration cleared");
        Ok(())
    }

    /// The memoized snapshot, if resolution already happened.
    pub fn snapshot(&self) -> Option<Arc<ConfigSnapshot>> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// String value for `key`, or `default` when unresolved, absent or empty.
    pub fn get(&self, key: &str, default: &str) -> String {
        match self.snapshot() {
            Some(snapshot) => snapshot.get(key, default),
            None => {
                warn!("Configuration read of {} before resolve()", key);
                default.to_string()
            }
        }
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.snapshot()
            .map_or(default, |s| s.get_bool(key, default))
    }

    pub fn get_number(&self, key: &str, default: i64) -> i64 {
        self.snapshot()
            .map_or(default, |s| s.get_number(key, default))
    }

    /// Whether the detector reports a development build.
    pub fn is_dev(&self) -> bool {
        self.detector.is_dev()
    }

    /// Typed view of the current snapshot.
    pub fn all(&self) -> AppConfig {
        AppConfig::from_snapshot(self.snapshot().as_deref(), self.is_dev())
    }

    /// Resolve, then return the typed view.
    pub async fn all_async(&self) -> AppConfig {
        let snapshot = self.resolve().await;
        AppConfig::from_snapshot(Some(&snapshot), self.is_dev())
    }

    /// Check the required keys against the current snapshot. Never fails.
    pub fn validate(&self) -> ValidationReport {
        let report = validate_snapshot(self.snapshot().as_deref(), self.is_dev());
        if !report.is_valid {
            warn!("Configuration incomplete, missing: {}", report.missing.join(", "));
        }
        report
    }

    async fn resolve_tiers(&self) -> ConfigSnapshot {
        if let Some(values) = self.load_local() {
            return ConfigSnapshot::new(values, ConfigOrigin::Local);
        }

        if let Some(values) = self.load_remote().await {
            self.save_local(&values);
            return ConfigSnapshot::new(values, ConfigOrigin::Remote);
        }

        let is_dev = self.is_dev();
        info!(
            "Using built-in {} configuration",
            if is_dev { "development" } else { "production" }
        );
        let values = default_config(is_dev);
        self.save_local(&values);
        ConfigSnapshot::new(values, ConfigOrigin::Defaults)
    }

    fn load_local(&self) -> Option<ConfigMap> {
        let bytes = match self.store.get(&self.storage_key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                warn!("Could not read persisted configuration: {}", e);
                return None;
            }
        };

        match deserialize_from_store::<ConfigMap>(&bytes) {
            Ok(values) => Some(values),
            Err(e) => {
                warn!("Persisted configuration unreadable, ignoring: {}", e);
                None
            }
        }
    }

    /// Any map the source returns is accepted, including an empty one.
    async fn load_remote(&self) -> Option<ConfigMap> {
        match self.source.fetch().await {
            Ok(values) => {
                if values.is_empty() {
                    warn!("Remote configuration is empty");
                }
                Some(values)
            }
            Err(e) => {
                warn!("Remote configuration unavailable: {}", e);
                None
            }
        }
    }

    fn save_local(&self, values: &ConfigMap) {
        let saved = serialize_for_store(values).and_then(|bytes| self.store.set(&self.storage_key, bytes));
        if let Err(e) = saved {
            warn!("Could not persist configuration: {}", e);
        }
    }
}
