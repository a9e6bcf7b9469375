//! Layered environment configuration.
//!
//! A [`ConfigResolver`] settles on one flat string map per process, taken from the first
//! tier that has one:
//!
//! 1. the snapshot already resolved in this process
//! 2. the snapshot persisted by an earlier run
//! 3. a [`ConfigSource`] (normally the `getEnvConfig` remote function)
//! 4. the built-in development or production table
//!
//! Values stay strings; typed views are parsed on every read.

use std::collections::BTreeMap;

pub mod defaults;
mod detect;
mod dotenv;
mod resolver;
mod source;

pub use detect::{
    load_dotenv, load_dotenv_file, EnvVersion, EnvironmentDetector, ProcessEnvironment,
    StaticEnvironment, ENV_VERSION_VAR,
};
pub use dotenv::{parse_env_content, publish_env, EnvType, ParsedEnv, PublishReceipt, UPDATE_FUNCTION};
pub use resolver::{ConfigResolver, CONFIG_STORAGE_KEY};
pub use source::{
    config_map_from_json, ConfigSource, EnvFileSource, RemoteConfigSource, StaticSource,
    FETCH_FUNCTION,
};

use defaults::{
    CACHE_TTL, CLOUD_ENV_ID, DEBUG, DEEPSEEK_API_BASE_URL, DEEPSEEK_API_KEY, LOG_LEVEL,
    NEWS_API_BASE_URL, NEWS_API_KEY, NODE_ENV, PLACEHOLDER_MARKER, PUSH_TEMPLATE_ID,
    REQUEST_TIMEOUT, REQUIRED_KEYS,
};

/// Flat key to string mapping, the shape of every tier.
pub type ConfigMap = BTreeMap<String, String>;

/// Tier a snapshot was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOrigin {
    Local,
    Remote,
    Defaults,
}

/// Resolved configuration, immutable for the rest of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSnapshot {
    values: ConfigMap,
    origin: ConfigOrigin,
}

impl ConfigSnapshot {
    pub fn new(values: ConfigMap, origin: ConfigOrigin) -> Self {
        ConfigSnapshot { values, origin }
    }

    pub fn origin(&self) -> ConfigOrigin {
        self.origin
    }

    pub fn values(&self) -> &ConfigMap {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value for `key`; an empty string counts as absent.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn get(&self, key: &str, default: &str) -> String {
        self.value(key).unwrap_or(default).to_string()
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.value(key).map_or(default, parse_bool)
    }

    pub fn get_number(&self, key: &str, default: i64) -> i64 {
        self.value(key).and_then(parse_leading_int).unwrap_or(default)
    }
}

/// Truthy values are exactly `"true"` and `"1"`.
pub fn parse_bool(value: &str) -> bool {
    value == "true" || value == "1"
}

/// Parse a base-10 integer prefix: leading whitespace, an optional sign, then digits.
/// Trailing garbage is ignored (`"10s"` is 10); no digits at all is `None`.
pub fn parse_leading_int(value: &str) -> Option<i64> {
    let s = value.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    let magnitude: i64 = digits[..end].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Typed view over a snapshot, with the process's development flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub cloud_env_id: String,
    pub news_api_key: String,
    pub news_api_base_url: String,
    pub deepseek_api_key: String,
    pub deepseek_api_base_url: String,
    pub push_template_id: String,
    /// Milliseconds.
    pub request_timeout: i64,
    /// Seconds.
    pub cache_ttl: i64,
    pub log_level: String,
    pub node_env: String,
    pub is_debug: bool,
    pub is_dev: bool,
}

impl AppConfig {
    /// Build the typed view; an unresolved snapshot yields the fallbacks.
    pub fn from_snapshot(snapshot: Option<&ConfigSnapshot>, is_dev: bool) -> Self {
        let empty = ConfigSnapshot::new(ConfigMap::new(), ConfigOrigin::Defaults);
        let s = snapshot.unwrap_or(&empty);

        AppConfig {
            cloud_env_id: s.get(CLOUD_ENV_ID, ""),
            news_api_key: s.get(NEWS_API_KEY, ""),
            news_api_base_url: s.get(NEWS_API_BASE_URL, ""),
            deepseek_api_key: s.get(DEEPSEEK_API_KEY, ""),
            deepseek_api_base_url: s.get(DEEPSEEK_API_BASE_URL, ""),
            push_template_id: s.get(PUSH_TEMPLATE_ID, ""),
            request_timeout: s.get_number(REQUEST_TIMEOUT, 10_000),
            cache_ttl: s.get_number(CACHE_TTL, 3_600),
            log_level: s.get(LOG_LEVEL, "info"),
            node_env: s.get(NODE_ENV, "development"),
            is_debug: s.get_bool(DEBUG, true),
            is_dev,
        }
    }

    /// Request timeout as a `Duration`; negative values clamp to zero.
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.request_timeout.max(0) as u64)
    }

    /// Cache TTL as a `Duration`; negative values clamp to zero.
    pub fn cache_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.cache_ttl.max(0) as u64)
    }
}

/// Outcome of checking the required keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub is_valid: bool,
    /// Required keys that are absent or still hold a placeholder.
    pub missing: Vec<String>,
    pub config: AppConfig,
}

/// A required key is missing when absent, empty, or containing [`PLACEHOLDER_MARKER`].
pub fn validate_snapshot(snapshot: Option<&ConfigSnapshot>, is_dev: bool) -> ValidationReport {
    let missing: Vec<String> = REQUIRED_KEYS
        .iter()
        .filter(|key| {
            snapshot
                .and_then(|s| s.value(key))
                .map_or(true, |v| v.contains(PLACEHOLDER_MARKER))
        })
        .map(|key| key.to_string())
        .collect();

    ValidationReport {
        is_valid: missing.is_empty(),
        missing,
        config: AppConfig::from_snapshot(snapshot, is_dev),
    }
}
