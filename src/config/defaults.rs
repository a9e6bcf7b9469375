//! Built-in configuration tables and well-known keys.

use super::ConfigMap;

pub const CLOUD_ENV_ID: &str = "CLOUD_ENV_ID";
pub const NEWS_API_KEY: &str = "NEWS_API_KEY";
pub const DEEPSEEK_API_KEY: &str = "DEEPSEEK_API_KEY";
pub const NEWS_API_BASE_URL: &str = "NEWS_API_BASE_URL";
pub const DEEPSEEK_API_BASE_URL: &str = "DEEPSEEK_API_BASE_URL";
pub const PUSH_TEMPLATE_ID: &str = "PUSH_TEMPLATE_ID";
pub const REQUEST_TIMEOUT: &str = "REQUEST_TIMEOUT";
pub const CACHE_TTL: &str = "CACHE_TTL";
pub const LOG_LEVEL: &str = "LOG_LEVEL";
pub const NODE_ENV: &str = "NODE_ENV";
pub const DEBUG: &str = "DEBUG";

/// Keys that must hold a real value for the application to work.
pub const REQUIRED_KEYS: [&str; 3] = [CLOUD_ENV_ID, NEWS_API_KEY, DEEPSEEK_API_KEY];

/// Prefix of template values nobody filled in (`your-news-api-key`).
pub const PLACEHOLDER_MARKER: &str = "your-";

/// Default table for the development or production build.
///
/// Development values are placeholders on purpose, so validation flags them until real
/// credentials are configured.
pub fn default_config(is_dev: bool) -> ConfigMap {
    let table: [(&str, &str); 11] = if is_dev {
        [
            (CLOUD_ENV_ID, "your-env-id"),
            (NEWS_API_KEY, "your-news-api-key"),
            (DEEPSEEK_API_KEY, "your-deepseek-api-key"),
            (NEWS_API_BASE_URL, "https://newsapi.org/v2"),
            (DEEPSEEK_API_BASE_URL, "https://api.deepseek.com"),
            (PUSH_TEMPLATE_ID, "your-push-template-id"),
            (REQUEST_TIMEOUT, "10000"),
            (CACHE_TTL, "3600"),
            (LOG_LEVEL, "info"),
            (NODE_ENV, "development"),
            (DEBUG, "true"),
        ]
    } else {
        [
            (CLOUD_ENV_ID, "prod-env-id"),
            (NEWS_API_KEY, "prod-news-api-key"),
            (DEEPSEEK_API_KEY, "prod-deepseek-api-key"),
            (NEWS_API_BASE_URL, "https://newsapi.org/v2"),
            (DEEPSEEK_API_BASE_URL, "https://api.deepseek.com"),
            (PUSH_TEMPLATE_ID, "prod-push-template-id"),
            (REQUEST_TIMEOUT, "10000"),
            (CACHE_TTL, "3600"),
            (LOG_LEVEL, "error"),
            (NODE_ENV, "production"),
            (DEBUG, "false"),
        ]
    };

    table
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
