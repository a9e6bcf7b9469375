//! Metrics hooks and TTL policy.

use std::time::Duration;

/// Default freshness window when a call does not supply one.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Receives one callback per cache decision.
///
/// All methods default to no-ops so implementors only override what they record.
pub trait CacheMetrics: Send + Sync {
    /// Served a fresh stored value without calling the producer.
    fn record_hit(&self, _key: &str, _duration: Duration) {}

    /// Called the producer and stored its result.
    fn record_miss(&self, _key: &str, _duration: Duration) {}

    /// Producer failed and an older stored value was served instead.
    fn record_stale(&self, _key: &str, _duration: Duration) {}

    /// Producer failed and nothing was stored; the error went back to the caller.
    fn record_error(&self, _key: &str, _error: &str) {}
}

/// Metrics sink that discards everything.
pub struct NoOpMetrics;

impl CacheMetrics for NoOpMetrics {}

/// How long an entry counts as fresh when the caller does not say.
#[derive(Clone, Debug, Default)]
pub enum TtlPolicy {
    /// [`DEFAULT_TTL`] for every key.
    #[default]
    Default,

    /// Same window for every key.
    Fixed(Duration),

    /// First matching key prefix wins, otherwise the fallback.
    PerPrefix {
        rules: Vec<(String, Duration)>,
        fallback: Duration,
    },
}

impl TtlPolicy {
    /// Window applied to `key`.
    pub fn get_ttl(&self, key: &str) -> Duration {
        match self {
            TtlPolicy::Default => DEFAULT_TTL,
            TtlPolicy::Fixed(d) => *d,
            TtlPolicy::PerPrefix { rules, fallback } => rules
                .iter()
                .find(|(prefix, _)| key.starts_with(prefix.as_str()))
                .map(|(_, d)| *d)
                .unwrap_or(*fallback),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        assert_eq!(TtlPolicy::default().get_ttl("any"), Duration::from_secs(300));
    }

    #[test]
    fn test_fixed_policy() {
        let policy = TtlPolicy::Fixed(Duration::from_secs(60));
        assert_eq!(policy.get_ttl("news"), Duration::from_secs(60));
    }

    #[test]
    fn test_per_prefix_policy() {
        let policy = TtlPolicy::PerPrefix {
            rules: vec![
                ("summary".to_string(), Duration::from_secs(3600)),
                ("news".to_string(), Duration::from_secs(120)),
            ],
            fallback: Duration::from_secs(30),
        };

        assert_eq!(policy.get_ttl("summary:id=1"), Duration::from_secs(3600));
        assert_eq!(policy.get_ttl("news:page=1"), Duration::from_secs(120));
        assert_eq!(policy.get_ttl("comments"), Duration::from_secs(30));
    }
}
