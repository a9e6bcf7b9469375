//! `.env` text parsing and publishing to the remote configuration store.

use super::ConfigMap;
use crate::error::{Error, Result};
use crate::remote::{call_function, RemoteCall};
use serde::Deserialize;
use serde_json::json;
use std::fmt;

/// Remote function that stores an uploaded `.env` file.
pub const UPDATE_FUNCTION: &str = "updateEnvConfig";

/// Result of parsing `.env` text: every well-formed pair plus one message per bad line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedEnv {
    pub values: ConfigMap,
    pub errors: Vec<String>,
}

impl ParsedEnv {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parse `KEY=VALUE` lines literally, the way the remote store reads an upload.
///
/// Lines are trimmed; blank lines and `#` comments are skipped. The line splits at its
/// first `=`, key and value are trimmed, and one pair of matching `"` or `'` quotes around
/// the value is removed. Nothing is substituted. Later duplicates win. A line without an
/// `=`, or starting with one, is reported as `line N: ...` and skipped.
pub fn parse_env_content(content: &str) -> ParsedEnv {
    let mut parsed = ParsedEnv::default();

    for (index, raw) in content.split('\n').enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once('=').filter(|(key, _)| !key.is_empty()) else {
            parsed
                .errors
                .push(format!("line {}: expected KEY=VALUE, got {}", index + 1, line));
            continue;
        };

        parsed
            .values
            .insert(key.trim().to_string(), unquote(value.trim()).to_string());
    }

    parsed
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Which remote document an upload replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvType {
    Development,
    Production,
}

impl EnvType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvType::Development => "development",
            EnvType::Production => "production",
        }
    }
}

impl fmt::Display for EnvType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Acknowledgement returned by the update function.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishReceipt {
    pub env_type: String,
    pub config_count: usize,
}

/// Validate `.env` text locally, then upload it as the `env_type` document.
///
/// # Errors
///
/// - `Error::ConfigError` if any line fails to parse; nothing is sent
/// - any error of [`call_function`]
pub async fn publish_env<R: RemoteCall>(
    remote: &R,
    content: &str,
    env_type: EnvType,
) -> Result<PublishReceipt> {
    let parsed = parse_env_content(content);
    if !parsed.is_valid() {
        return Err(Error::ConfigError(parsed.errors.join("; ")));
    }

    let receipt: PublishReceipt = call_function(
        remote,
        UPDATE_FUNCTION,
        json!({ "envType": env_type.as_str(), "config": content }),
    )
    .await?;

    info!(
        "✓ Published {} configuration ({} keys)",
        receipt.env_type, receipt.config_count
    );
    Ok(receipt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::RemoteResponse;
    use serde_json::Value;
    use std::sync::Mutex;

    #[test]
    fn test_parse_basic_file() {
        let parsed = parse_env_content(
            "# news\nNEWS_API_KEY=abc123\n\nDEEPSEEK_API_KEY=\"quoted value\"\nLOG_LEVEL='debug'\n",
        );

        assert!(parsed.is_valid());
        assert_eq!(parsed.values.len(), 3);
        assert_eq!(parsed.values["NEWS_API_KEY"], "abc123");
        assert_eq!(parsed.values["DEEPSEEK_API_KEY"], "quoted value");
        assert_eq!(parsed.values["LOG_LEVEL"], "debug");
    }

    #[test]
    fn test_parse_reports_bad_lines() {
        let parsed = parse_env_content("GOOD=1\nthis line has no equals sign\nALSO_GOOD=2\n");

        assert!(!parsed.is_valid());
        assert_eq!(parsed.errors.len(), 1);
        assert_eq!(parsed.values["GOOD"], "1");
        assert_eq!(parsed.values["ALSO_GOOD"], "2");
    }

    #[test]
    fn test_parse_keeps_values_literal() {
        std::env::set_var("NEWSROOM_KIT_DOTENV_TAIL", "INJECTED");
        let parsed = parse_env_content(
            "DEEPSEEK_API_KEY=sk-ab$cd\nNEWS_API_KEY=ab$NEWSROOM_KIT_DOTENV_TAIL\nPUSH_TEMPLATE_ID=hello world\nURL=https://x.io/?a=b\n",
        );
        std::env::remove_var("NEWSROOM_KIT_DOTENV_TAIL");

        assert!(parsed.is_valid(), "{:?}", parsed.errors);
        assert_eq!(parsed.values["DEEPSEEK_API_KEY"], "sk-ab$cd");
        assert_eq!(parsed.values["NEWS_API_KEY"], "ab$NEWSROOM_KIT_DOTENV_TAIL");
        assert_eq!(parsed.values["PUSH_TEMPLATE_ID"], "hello world");
        assert_eq!(parsed.values["URL"], "https://x.io/?a=b");
    }

    #[test]
    fn test_parse_accepts_loose_keys_and_spacing() {
        let parsed = parse_env_content("  1KEY=x\nmy-key = y \nEMPTY=\nLONE=\"\nMIXED=\"a'\r\n");

        assert!(parsed.is_valid(), "{:?}", parsed.errors);
        assert_eq!(parsed.values["1KEY"], "x");
        assert_eq!(parsed.values["my-key"], "y");
        assert_eq!(parsed.values["EMPTY"], "");
        assert_eq!(parsed.values["LONE"], "\"");
        assert_eq!(parsed.values["MIXED"], "\"a'");
    }

    #[test]
    fn test_parse_errors_carry_line_numbers() {
        let parsed = parse_env_content("# header\nA=1\n=nokey\n\nnoequals\n");

        assert_eq!(
            parsed.errors,
            vec![
                "line 3: expected KEY=VALUE, got =nokey".to_string(),
                "line 5: expected KEY=VALUE, got noequals".to_string(),
            ]
        );
        assert_eq!(parsed.values.len(), 1);
    }

    #[test]
    fn test_parse_empty() {
        let parsed = parse_env_content("");
        assert!(parsed.is_valid());
        assert!(parsed.values.is_empty());
    }

    /// Records the last payload and acknowledges it.
    #[derive(Default)]
    struct RecordingRemote {
        last: Mutex<Option<(String, Value)>>,
    }

    impl RemoteCall for RecordingRemote {
        async fn invoke(&self, name: &str, payload: Value) -> Result<RemoteResponse> {
            let env_type = payload["envType"].clone();
            *self.last.lock().expect("Failed to lock") = Some((name.to_string(), payload));
            Ok(RemoteResponse::from_envelope(json!({
                "success": true,
                "data": { "envType": env_type, "configCount": 2, "updatedAt": "2026-01-01" }
            })))
        }
    }

    #[tokio::test]
    async fn test_publish_env() {
        let remote = RecordingRemote::default();
        let receipt = publish_env(&remote, "A=1\nB=2\n", EnvType::Production)
            .await
            .expect("Publish failed");

        assert_eq!(
            receipt,
            PublishReceipt {
                env_type: "production".to_string(),
                config_count: 2
            }
        );

        let (name, payload) = remote.last.lock().expect("Failed to lock").clone().expect("No call");
        assert_eq!(name, UPDATE_FUNCTION);
        assert_eq!(payload["config"], "A=1\nB=2\n");
    }

    #[tokio::test]
    async fn test_publish_rejects_invalid_text_without_calling() {
        let remote = RecordingRemote::default();
        let err = publish_env(&remote, "not valid", EnvType::Development)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ConfigError(_)));
        assert!(remote.last.lock().expect("Failed to lock").is_none());
    }
}
