//! Cache key construction.

use std::fmt::Display;

/// Builds parameter-qualified cache keys.
///
/// Two callers asking for different data must never share a key, so every parameter that
/// changes the producer's result belongs in the key.
///
/// ```
/// use newsroom_kit::key::CacheKey;
///
/// let key = CacheKey::new("news")
///     .param("category", "tech")
///     .param("page", 2)
///     .build();
/// assert_eq!(key, "news:category=tech&page=2");
/// ```
#[derive(Debug, Clone)]
pub struct CacheKey {
    prefix: String,
    params: Vec<(String, String)>,
}

impl CacheKey {
    pub fn new(prefix: impl Into<String>) -> Self {
        CacheKey {
            prefix: prefix.into(),
            params: Vec::new(),
        }
    }

    /// Append a parameter. Order is preserved.
    pub fn param(mut self, name: impl Into<String>, value: impl Display) -> Self {
        self.params.push((name.into(), value.to_string()));
        self
    }

    /// Final key: `prefix` alone, or `prefix:name=value&name=value`.
    pub fn build(&self) -> String {
        if self.params.is_empty() {
            return self.prefix.clone();
        }

        let query = self
            .params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}:{}", self.prefix, query)
    }
}

/// Join a namespace and a caller key into the key written to storage.
pub(crate) fn namespaced(namespace: Option<&str>, key: &str) -> String {
    match namespace {
        Some(ns) => format!("{}:{}", ns, key),
        None => key.to_string(),
    }
}
