use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// Clock trait for abstracting time operations.
///
/// Every component that needs "now" or "today" takes an injected clock so
/// TTL expiry and week arithmetic are deterministic under test.
pub trait Clock: Send + Sync {
    /// Current instant in UTC
    fn now(&self) -> DateTime<Utc>;

    /// Current calendar date in the given zone
    fn today(&self, timezone: Tz) -> NaiveDate {
        self.now().with_timezone(&timezone).date_naive()
    }
}

/// Production implementation of Clock using system time
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Test implementation of Clock with fixed/controllable time
#[derive(Debug, Clone)]
pub struct FixedClock {
    timestamp: std::sync::Arc<std::sync::Mutex<DateTime<Utc>>>,
}

impl FixedClock {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp: std::sync::Arc::new(std::sync::Mutex::new(timestamp)),
        }
    }

    /// Create a FixedClock from an RFC3339 string
    pub fn from_rfc3339(timestamp_str: &str) -> Result<Self, chrono::ParseError> {
        let timestamp = DateTime::parse_from_rfc3339(timestamp_str)?.with_timezone(&Utc);
        Ok(Self::new(timestamp))
    }

    /// Update the fixed time
    pub fn set_time(&self, timestamp: DateTime<Utc>) {
        *self.timestamp.lock().expect("clock mutex poisoned") = timestamp;
    }

    /// Advance time by the given number of seconds
    pub fn advance_seconds(&self, seconds: i64) {
        let mut guard = self.timestamp.lock().expect("clock mutex poisoned");
        *guard += chrono::Duration::seconds(seconds);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.timestamp.lock().expect("clock mutex poisoned")
    }
}
