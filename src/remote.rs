//! Remote procedure call adapter.
//!
//! Cloud functions answer with a `{ success, data?, error? }` envelope. A call that never
//! completes is a transport failure (`Err`); one that completes with `success: false` is
//! an application failure ([`RemoteResponse::Failure`]). Producers usually collapse both
//! into a single error with [`call_function`].

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;

/// Outcome of a remote call that reached the other side.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteResponse {
    Success(Value),
    Failure(RemoteFailure),
}

/// Structured application-level failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFailure {
    pub message: String,
    pub code: Option<String>,
}

impl RemoteFailure {
    pub fn new(message: impl Into<String>) -> Self {
        RemoteFailure {
            message: message.into(),
            code: None,
        }
    }
}

impl RemoteResponse {
    /// Decode a `{ success, data, error, code }` envelope.
    ///
    /// A missing or non-boolean `success` counts as failure; a missing `data` on success
    /// becomes `null`.
    pub fn from_envelope(envelope: Value) -> Self {
        let success = envelope
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        if success {
            let data = envelope.get("data").cloned().unwrap_or(Value::Null);
            return RemoteResponse::Success(data);
        }

        let message = match envelope.get("error") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => "remote call reported failure".to_string(),
            Some(other) => other.to_string(),
        };
        let code = envelope.get("code").and_then(|c| match c {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });

        RemoteResponse::Failure(RemoteFailure { message, code })
    }

    /// Turn an application failure into `Error::Remote` tagged with `function`.
    pub fn into_result(self, function: &str) -> Result<Value> {
        match self {
            RemoteResponse::Success(data) => Ok(data),
            RemoteResponse::Failure(failure) => Err(Error::Remote {
                function: function.to_string(),
                message: failure.message,
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RemoteResponse::Success(_))
    }
}

/// Invoke a named remote procedure with a JSON payload.
///
/// Implementations return `Err` (usually `Error::Transport` or `Error::Timeout`) only when
/// the call could not complete.
pub trait RemoteCall: Send + Sync {
    fn invoke(
        &self,
        name: &str,
        payload: Value,
    ) -> impl Future<Output = Result<RemoteResponse>> + Send;
}

impl<R: RemoteCall> RemoteCall for std::sync::Arc<R> {
    fn invoke(
        &self,
        name: &str,
        payload: Value,
    ) -> impl Future<Output = Result<RemoteResponse>> + Send {
        (**self).invoke(name, payload)
    }
}

/// Call `name`, treat `success: false` as an error, and decode `data` into `T`.
///
/// # Errors
///
/// - transport errors from `remote`, unchanged
/// - `Error::Remote` for application failures
/// - `Error::DeserializationError` when `data` does not fit `T`
pub async fn call_function<R, T>(remote: &R, name: &str, payload: Value) -> Result<T>
where
    R: RemoteCall,
    T: DeserializeOwned,
{
    let data = remote.invoke(name, payload).await?.into_result(name)?;
    serde_json::from_value(data).map_err(|e| {
        Error::DeserializationError(format!("unexpected payload from '{}': {}", name, e))
    })
}

/// Applies a fixed deadline to every call of the wrapped transport.
pub struct TimeoutRemote<R> {
    inner: R,
    timeout: Duration,
}

impl<R: RemoteCall> TimeoutRemote<R> {
    pub fn new(inner: R, timeout: Duration) -> Self {
        TimeoutRemote { inner, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: RemoteCall> RemoteCall for TimeoutRemote<R> {
    fn invoke(
        &self,
        name: &str,
        payload: Value,
    ) -> impl Future<Output = Result<RemoteResponse>> + Send {
        let timeout = self.timeout;
        async move {
            match tokio::time::timeout(timeout, self.inner.invoke(name, payload)).await {
                Ok(result) => result,
                Err(_) => {
                    warn!("Remote call '{}' timed out after {:?}", name, timeout);
                    Err(Error::Timeout(format!(
                        "remote call '{}' exceeded {:?}",
                        name, timeout
                    )))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    /// Answers every call after `delay` with a fixed envelope.
    struct FixedRemote {
        envelope: Value,
        delay: Duration,
    }

    impl RemoteCall for FixedRemote {
        async fn invoke(&self, _name: &str, _payload: Value) -> Result<RemoteResponse> {
            tokio::time::sleep(self.delay).await;
            Ok(RemoteResponse::from_envelope(self.envelope.clone()))
        }
    }

    struct OfflineRemote;

    impl RemoteCall for OfflineRemote {
        async fn invoke(&self, name: &str, _payload: Value) -> Result<RemoteResponse> {
            Err(Error::Transport(format!("{}: network unreachable", name)))
        }
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Summary {
        text: String,
    }

    #[test]
    fn test_envelope_success() {
        let response = RemoteResponse::from_envelope(json!({
            "success": true,
            "data": { "text": "short" }
        }));
        assert_eq!(response, RemoteResponse::Success(json!({ "text": "short" })));
    }

    #[test]
    fn test_envelope_failure() {
        let response = RemoteResponse::from_envelope(json!({
            "success": false,
            "error": "content rejected",
            "code": 87014
        }));
        assert_eq!(
            response,
            RemoteResponse::Failure(RemoteFailure {
                message: "content rejected".to_string(),
                code: Some("87014".to_string()),
            })
        );
    }

    #[test]
    fn test_envelope_without_success_flag_fails() {
        let response = RemoteResponse::from_envelope(json!({ "data": 1 }));
        assert!(!response.is_success());
    }

    #[test]
    fn test_into_result_maps_failure() {
        let err = RemoteResponse::Failure(RemoteFailure::new("boom"))
            .into_result("addComment")
            .unwrap_err();
        assert_eq!(
            err,
            Error::Remote {
                function: "addComment".to_string(),
                message: "boom".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_call_function_decodes() {
        let remote = FixedRemote {
            envelope: json!({ "success": true, "data": { "text": "tl;dr" } }),
            delay: Duration::ZERO,
        };
        let summary: Summary = call_function(&remote, "generateSummary", json!({ "id": 1 }))
            .await
            .unwrap();
        assert_eq!(summary.text, "tl;dr");
    }

    #[tokio::test]
    async fn test_call_function_type_mismatch() {
        let remote = FixedRemote {
            envelope: json!({ "success": true, "data": [1, 2] }),
            delay: Duration::ZERO,
        };
        let err = call_function::<_, Summary>(&remote, "generateSummary", Value::Null)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DeserializationError(_)));
    }

    #[tokio::test]
    async fn test_transport_error_passes_through() {
        let err = call_function::<_, Value>(&OfflineRemote, "fetchNews", Value::Null)
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_remote() {
        let slow = TimeoutRemote::new(
            FixedRemote {
                envelope: json!({ "success": true }),
                delay: Duration::from_secs(30),
            },
            Duration::from_secs(10),
        );
        let err = slow.invoke("fetchNews", Value::Null).await.unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));

        let fast = TimeoutRemote::new(
            FixedRemote {
                envelope: json!({ "success": true, "data": 3 }),
                delay: Duration::from_secs(1),
            },
            Duration::from_secs(10),
        );
        let response = fast.invoke("fetchNews", Value::Null).await.unwrap();
        assert_eq!(response, RemoteResponse::Success(json!(3)));
    }
}
