use std::env;
use std::time::Duration;

use tracing::{info, warn};

/// Longest accepted code lifetime
pub const MAX_CODE_TTL: Duration = Duration::from_secs(24 * 60 * 60);
/// Longest accepted cooldown between two code requests
pub const MAX_COOLDOWN: Duration = Duration::from_secs(60 * 60);

/// Verification code settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationConfig {
    /// How long an issued code stays valid
    pub code_ttl: Duration,
    /// Minimum gap between two code requests from one client IP
    pub cooldown: Duration,
    /// Wrong submissions after which a pending code is discarded
    pub max_attempts: u32,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            code_ttl: Duration::from_secs(180),
            cooldown: Duration::from_secs(60),
            max_attempts: 5,
        }
    }
}

fn seconds_from_env(name: &str, default: Duration, max: Duration) -> Duration {
    let value = env::var(name)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(default);

    if value > max {
        warn!("{} exceeds {}s, clamping", name, max.as_secs());
        return max;
    }
    value
}

impl VerificationConfig {
    /// Read `VERIFY_CODE_TTL_SECONDS`, `VERIFY_CODE_COOLDOWN_SECONDS` and
    /// `VERIFY_CODE_MAX_ATTEMPTS`, falling back to the defaults for missing
    /// or unparsable values. Durations are clamped to [`MAX_CODE_TTL`] and
    /// [`MAX_COOLDOWN`].
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let code_ttl = seconds_from_env("VERIFY_CODE_TTL_SECONDS", defaults.code_ttl, MAX_CODE_TTL);
        let cooldown = seconds_from_env("VERIFY_CODE_COOLDOWN_SECONDS", defaults.cooldown, MAX_COOLDOWN);

        let max_attempts = env::var("VERIFY_CODE_MAX_ATTEMPTS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(defaults.max_attempts);

        info!(
            "Verification configuration: ttl={}s, cooldown={}s, max_attempts={}",
            code_ttl.as_secs(),
            cooldown.as_secs(),
            max_attempts
        );

        Self {
            code_ttl,
            cooldown,
            max_attempts,
        }
    }

    /// Code lifetime in whole minutes, at least one, for message text
    pub fn ttl_minutes(&self) -> u64 {
        (self.code_ttl.as_secs() / 60).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = VerificationConfig::default();
        assert_eq!(config.code_ttl, Duration::from_secs(180));
        assert_eq!(config.cooldown, Duration::from_secs(60));
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.ttl_minutes(), 3);
    }

    #[test]
    fn test_ttl_minutes_floor() {
        let config = VerificationConfig {
            code_ttl: Duration::from_secs(30),
            ..VerificationConfig::default()
        };
        assert_eq!(config.ttl_minutes(), 1);
    }

    #[test]
    fn test_oversized_values_are_clamped() {
        env::set_var("TRIGUARD_TEST_HUGE_TTL", u64::MAX.to_string());
        assert_eq!(
            seconds_from_env("TRIGUARD_TEST_HUGE_TTL", Duration::from_secs(180), MAX_CODE_TTL),
            MAX_CODE_TTL
        );

        env::set_var("TRIGUARD_TEST_SMALL_TTL", "90");
        assert_eq!(
            seconds_from_env("TRIGUARD_TEST_SMALL_TTL", Duration::from_secs(180), MAX_CODE_TTL),
            Duration::from_secs(90)
        );

        assert_eq!(
            seconds_from_env("TRIGUARD_TEST_UNSET_TTL", Duration::from_secs(180), MAX_CODE_TTL),
            Duration::from_secs(180)
        );
    }
}
