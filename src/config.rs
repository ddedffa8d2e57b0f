use chrono_tz::Tz;
use std::time::Duration;

/// Configuration for the insight pipeline.
///
/// The timezone is deliberately explicit: the "1 AM snapshot" rule and all
/// calendar-day bucketing run in this configured zone, never in whatever
/// zone the host happens to be deployed in.
#[derive(Debug, Clone)]
pub struct InsightConfig {
    /// Zone used for calendar-day bucketing and the snapshot hour
    pub timezone: Tz,
    /// Local hour whose readings are preferred as the day's representative
    /// sample (0-23)
    pub snapshot_hour: u32,
    /// How long a cached crop-safety result stays valid
    pub cache_ttl: Duration,
    /// Most recent cultivation weeks recomputed per history call
    pub history_max_weeks: u32,
    /// Hard per-week sample cap on cultivation-history queries
    pub week_sample_limit: usize,
    /// Bound on each per-device time-series query
    pub query_timeout: Duration,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::UTC,
            snapshot_hour: 1,
            cache_ttl: Duration::from_secs(24 * 60 * 60),
            history_max_weeks: 8,
            week_sample_limit: 500,
            query_timeout: Duration::from_secs(10),
        }
    }
}

impl InsightConfig {
    /// Create a config from environment variables, falling back to defaults
    /// for anything unset.
    ///
    /// Recognized variables:
    /// * `INSIGHT_TIMEZONE` - IANA zone name, e.g. "Asia/Bangkok"
    /// * `INSIGHT_SNAPSHOT_HOUR` - local hour 0-23
    /// * `INSIGHT_CACHE_TTL_HOURS` - cache entry lifetime
    /// * `INSIGHT_HISTORY_MAX_WEEKS` - cultivation-history window
    /// * `INSIGHT_WEEK_SAMPLE_LIMIT` - per-week query cap
    /// * `INSIGHT_QUERY_TIMEOUT_SECS` - per-device query bound
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("INSIGHT_TIMEZONE") {
            config.timezone = raw
                .parse::<Tz>()
                .map_err(|_| ConfigError::InvalidTimezone(raw))?;
        }

        if let Ok(raw) = std::env::var("INSIGHT_SNAPSHOT_HOUR") {
            let hour: u32 = raw
                .parse()
                .map_err(|_| ConfigError::InvalidValue("INSIGHT_SNAPSHOT_HOUR", raw.clone()))?;
            if hour > 23 {
                return Err(ConfigError::InvalidValue("INSIGHT_SNAPSHOT_HOUR", raw));
            }
            config.snapshot_hour = hour;
        }

        if let Ok(raw) = std::env::var("INSIGHT_CACHE_TTL_HOURS") {
            let hours: u64 = raw
                .parse()
                .map_err(|_| ConfigError::InvalidValue("INSIGHT_CACHE_TTL_HOURS", raw))?;
            config.cache_ttl = Duration::from_secs(hours * 60 * 60);
        }

        if let Ok(raw) = std::env::var("INSIGHT_HISTORY_MAX_WEEKS") {
            let weeks: u32 = raw
                .parse()
                .map_err(|_| ConfigError::InvalidValue("INSIGHT_HISTORY_MAX_WEEKS", raw.clone()))?;
            if weeks == 0 {
                return Err(ConfigError::InvalidValue("INSIGHT_HISTORY_MAX_WEEKS", raw));
            }
            config.history_max_weeks = weeks;
        }

        if let Ok(raw) = std::env::var("INSIGHT_WEEK_SAMPLE_LIMIT") {
            config.week_sample_limit = raw
                .parse()
                .map_err(|_| ConfigError::InvalidValue("INSIGHT_WEEK_SAMPLE_LIMIT", raw))?;
        }

        if let Ok(raw) = std::env::var("INSIGHT_QUERY_TIMEOUT_SECS") {
            let secs: u64 = raw
                .parse()
                .map_err(|_| ConfigError::InvalidValue("INSIGHT_QUERY_TIMEOUT_SECS", raw))?;
            config.query_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown IANA timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = InsightConfig::default();

        assert_eq!(config.timezone, chrono_tz::UTC);
        assert_eq!(config.snapshot_hour, 1);
        assert_eq!(config.cache_ttl, Duration::from_secs(86400));
        assert_eq!(config.history_max_weeks, 8);
        assert_eq!(config.week_sample_limit, 500);
    }

    // Environment phases run inside one test because the test harness runs
    // tests concurrently and these share process-wide env vars.
    #[test]
    fn test_from_env() {
        // Valid overrides
        std::env::set_var("INSIGHT_TIMEZONE", "Asia/Bangkok");
        std::env::set_var("INSIGHT_SNAPSHOT_HOUR", "2");
        std::env::set_var("INSIGHT_CACHE_TTL_HOURS", "12");

        let config = InsightConfig::from_env().unwrap();
        assert_eq!(config.timezone, chrono_tz::Asia::Bangkok);
        assert_eq!(config.snapshot_hour, 2);
        assert_eq!(config.cache_ttl, Duration::from_secs(12 * 3600));

        // Unknown timezone is rejected
        std::env::set_var("INSIGHT_TIMEZONE", "Mars/Olympus_Mons");
        assert!(matches!(
            InsightConfig::from_env(),
            Err(ConfigError::InvalidTimezone(_))
        ));
        std::env::remove_var("INSIGHT_TIMEZONE");

        // Out-of-range snapshot hour is rejected
        std::env::set_var("INSIGHT_SNAPSHOT_HOUR", "24");
        assert!(matches!(
            InsightConfig::from_env(),
            Err(ConfigError::InvalidValue("INSIGHT_SNAPSHOT_HOUR", _))
        ));

        std::env::remove_var("INSIGHT_SNAPSHOT_HOUR");
        std::env::remove_var("INSIGHT_CACHE_TTL_HOURS");
    }
}
