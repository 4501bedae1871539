//! Run configuration: trigger inputs, wait policy and HTTP client settings.
//!
//! Values arrive from the CLI (with CI_TRIGGER_* env fallbacks handled by clap); this module only
//! holds them and provides the defaults and duration parsing shared by the CLI.

use std::time::Duration;

pub const DEFAULT_DISCOVERY_ATTEMPTS: u32 = 5;
pub const DEFAULT_DISCOVERY_DELAY: Duration = Duration::from_secs(2);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Retry and pacing knobs for discovery and polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Attempts per scope when listing builds (at least 1).
    pub discovery_attempts: u32,
    /// Pause between discovery attempts.
    pub discovery_delay: Duration,
    /// Pause between poll rounds.
    pub poll_interval: Duration,
    /// Upper bound on the poll loop; None waits until every build is terminal.
    pub max_wait: Option<Duration>,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            discovery_attempts: DEFAULT_DISCOVERY_ATTEMPTS,
            discovery_delay: DEFAULT_DISCOVERY_DELAY,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_wait: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_HTTP_TIMEOUT,
            user_agent: format!("ci-trigger/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Raw trigger inputs as given on the command line; validated by `trigger::validate`.
#[derive(Debug, Clone, Default)]
pub struct TriggerInputs {
    pub ref_name: Option<String>,
    pub token: Option<String>,
    pub url: Option<String>,
    pub tag: bool,
    pub version: Option<String>,
}

/// Everything a run needs.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub inputs: TriggerInputs,
    pub wait: bool,
    pub user_token: Option<String>,
    pub dry_run: bool,
    pub policy: WaitPolicy,
    pub http: HttpConfig,
}

/// Parse a human duration such as `2s`, `500ms` or `1h 30m`. Bare integers are seconds.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration".to_string());
    }
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }
    humantime::parse_duration(s).map_err(|e| format!("invalid duration '{s}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_matches_fixed_constants() {
        let p = WaitPolicy::default();
        assert_eq!(p.discovery_attempts, 5);
        assert_eq!(p.discovery_delay, Duration::from_secs(2));
        assert_eq!(p.poll_interval, Duration::from_secs(10));
        assert!(p.max_wait.is_none());
    }

    #[test]
    fn test_parse_duration_forms() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("15").unwrap(), Duration::from_secs(15));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("1h 30m").unwrap(), Duration::from_secs(5400));
        assert!(parse_duration("").is_err());
        assert!(parse_duration("soon").is_err());
    }

    #[test]
    fn test_user_agent_carries_version() {
        let h = HttpConfig::default();
        assert!(h.user_agent.starts_with("ci-trigger/"));
    }
}
