//! Polling settings.

use std::env;
use std::time::Duration;

use crate::error::AgentError;

/// Default wait between answer checks, in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: f64 = 2.0;

/// Default polling budget for batch runs, in seconds.
pub const DEFAULT_BATCH_TIMEOUT_SECS: f64 = 60.0;

/// Default polling budget for agent and chat runs, in seconds.
pub const DEFAULT_AGENT_TIMEOUT_SECS: f64 = 120.0;

/// How often and how long to wait for an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Wait before each `get_answer` call, including the first.
    pub interval: Duration,
    /// Budget measured from the start of polling. Checked once per loop,
    /// before the wait, so the real cutoff can overshoot by one interval.
    pub timeout: Duration,
}

impl PollSettings {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    /// Build from second values, rejecting negative or non-finite input.
    pub fn from_secs(interval_secs: f64, timeout_secs: f64) -> Result<Self, AgentError> {
        Ok(Self {
            interval: secs("polling interval", interval_secs)?,
            timeout: secs("timeout", timeout_secs)?,
        })
    }

    /// 2 second interval, 60 second budget.
    pub fn batch_default() -> Self {
        Self::new(
            Duration::from_secs_f64(DEFAULT_POLL_INTERVAL_SECS),
            Duration::from_secs_f64(DEFAULT_BATCH_TIMEOUT_SECS),
        )
    }

    /// 2 second interval, 120 second budget.
    pub fn agent_default() -> Self {
        Self::new(
            Duration::from_secs_f64(DEFAULT_POLL_INTERVAL_SECS),
            Duration::from_secs_f64(DEFAULT_AGENT_TIMEOUT_SECS),
        )
    }

    /// Build agent settings where `0` (or any unusable value) means "use the default".
    pub fn agent_from_secs(interval_secs: f64, timeout_secs: f64) -> Self {
        let defaults = Self::agent_default();
        Self {
            interval: positive_secs(interval_secs).unwrap_or(defaults.interval),
            timeout: positive_secs(timeout_secs).unwrap_or(defaults.timeout),
        }
    }

    /// Read settings from environment variables, falling back to `defaults`.
    ///
    /// Optional environment variables:
    /// - `TOQAN_POLL_INTERVAL_SECS` - Wait between checks
    /// - `TOQAN_TIMEOUT_SECS` - Polling budget
    pub fn from_env(defaults: Self) -> Self {
        let read = |name: &str| {
            env::var(name)
                .ok()
                .and_then(|v| v.trim().parse::<f64>().ok())
                .and_then(positive_secs)
        };

        Self {
            interval: read("TOQAN_POLL_INTERVAL_SECS").unwrap_or(defaults.interval),
            timeout: read("TOQAN_TIMEOUT_SECS").unwrap_or(defaults.timeout),
        }
    }
}

fn secs(name: &str, value: f64) -> Result<Duration, AgentError> {
    Duration::try_from_secs_f64(value)
        .map_err(|_| AgentError::Validation(format!("invalid {}: {}", name, value)))
}

fn positive_secs(value: f64) -> Option<Duration> {
    if value > 0.0 {
        Duration::try_from_secs_f64(value).ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let batch = PollSettings::batch_default();
        assert_eq!(batch.interval, Duration::from_secs(2));
        assert_eq!(batch.timeout, Duration::from_secs(60));

        let agent = PollSettings::agent_default();
        assert_eq!(agent.timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_from_secs_accepts_zero_and_fractions() {
        let settings = PollSettings::from_secs(0.5, 0.0).unwrap();
        assert_eq!(settings.interval, Duration::from_millis(500));
        assert_eq!(settings.timeout, Duration::ZERO);
    }

    #[test]
    fn test_from_secs_rejects_negative_and_nan() {
        assert!(matches!(
            PollSettings::from_secs(-1.0, 10.0),
            Err(AgentError::Validation(_))
        ));
        assert!(PollSettings::from_secs(1.0, f64::NAN).is_err());
    }

    #[test]
    fn test_agent_from_secs_treats_zero_as_default() {
        let settings = PollSettings::agent_from_secs(0.0, 0.0);
        assert_eq!(settings, PollSettings::agent_default());

        let settings = PollSettings::agent_from_secs(1.0, 30.0);
        assert_eq!(settings.interval, Duration::from_secs(1));
        assert_eq!(settings.timeout, Duration::from_secs(30));
    }

    // Environment-based scenarios run in one test; env vars are process-global.
    #[test]
    fn test_from_env_scenarios() {
        std::env::remove_var("TOQAN_POLL_INTERVAL_SECS");
        std::env::remove_var("TOQAN_TIMEOUT_SECS");
        assert_eq!(
            PollSettings::from_env(PollSettings::batch_default()),
            PollSettings::batch_default()
        );

        std::env::set_var("TOQAN_POLL_INTERVAL_SECS", "0.25");
        std::env::set_var("TOQAN_TIMEOUT_SECS", "not a number");
        let settings = PollSettings::from_env(PollSettings::batch_default());
        assert_eq!(settings.interval, Duration::from_millis(250));
        assert_eq!(settings.timeout, Duration::from_secs(60));

        std::env::remove_var("TOQAN_POLL_INTERVAL_SECS");
        std::env::remove_var("TOQAN_TIMEOUT_SECS");
    }
}
