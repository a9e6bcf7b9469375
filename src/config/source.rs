//! Where remote-tier configuration comes from.

use super::dotenv::parse_env_content;
use super::ConfigMap;
use crate::error::{Error, Result};
use crate::remote::{call_function, RemoteCall};
use serde_json::{json, Value};
use std::future::Future;
use std::path::PathBuf;

/// Remote function serving the configuration document.
pub const FETCH_FUNCTION: &str = "getEnvConfig";

/// Asynchronous provider of a flat configuration map.
///
/// Any error means "source unavailable"; the resolver falls through to the next tier.
pub trait ConfigSource: Send + Sync {
    fn fetch(&self) -> impl Future<Output = Result<ConfigMap>> + Send;
}

/// Fetches configuration through a [`RemoteCall`] transport.
pub struct RemoteConfigSource<R> {
    remote: R,
    function: String,
}

impl<R: RemoteCall> RemoteConfigSource<R> {
    pub fn new(remote: R) -> Self {
        RemoteConfigSource {
            remote,
            function: FETCH_FUNCTION.to_string(),
        }
    }

    /// Call a differently named function.
    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = function.into();
        self
    }
}

impl<R: RemoteCall> ConfigSource for RemoteConfigSource<R> {
    async fn fetch(&self) -> Result<ConfigMap> {
        let data: Value = call_function(&self.remote, &self.function, json!({})).await?;
        config_map_from_json(data)
    }
}

/// Flatten a JSON object into string values. Scalars are stringified, nulls dropped,
/// nested values kept as JSON text.
pub fn config_map_from_json(data: Value) -> Result<ConfigMap> {
    let object = match data {
        Value::Object(object) => object,
        other => {
            return Err(Error::ConfigError(format!(
                "expected a configuration object, got {}",
                other
            )))
        }
    };

    let mut map = ConfigMap::new();
    for (key, value) in object {
        let text = match value {
            Value::Null => continue,
            Value::String(s) => s,
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            other => other.to_string(),
        };
        map.insert(key, text);
    }
    Ok(map)
}

/// Reads a `.env` file. Any malformed line makes the whole file unavailable.
#[derive(Debug, Clone)]
pub struct EnvFileSource {
    path: PathBuf,
}

impl EnvFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        EnvFileSource { path: path.into() }
    }
}

impl ConfigSource for EnvFileSource {
    async fn fetch(&self) -> Result<ConfigMap> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            Error::ConfigError(format!("cannot read {}: {}", self.path.display(), e))
        })?;

        let parsed = parse_env_content(&content);
        if !parsed.is_valid() {
            return Err(Error::ConfigError(format!(
                "{}: {}",
                self.path.display(),
                parsed.errors.join("; ")
            )));
        }
        Ok(parsed.values)
    }
}

/// Fixed map, or a fixed failure when built with [`StaticSource::unavailable`].
#[derive(Debug, Clone)]
pub struct StaticSource {
    values: Option<ConfigMap>,
}

impl StaticSource {
    pub fn new(values: ConfigMap) -> Self {
        StaticSource {
            values: Some(values),
        }
    }

    /// Source that always fails, for deployments without a remote tier.
    pub fn unavailable() -> Self {
        StaticSource { values: None }
    }
}

impl ConfigSource for StaticSource {
    async fn fetch(&self) -> Result<ConfigMap> {
        self.values
            .clone()
            .ok_or_else(|| Error::ConfigError("no remote configuration source".to_string()))
    }
}
