use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::Reading;

/// Errors surfaced by a time-series backend.
///
/// The two variants carry different blast radii: `Unavailable` means the
/// store itself cannot be reached and aborts the whole request, while
/// `Query` covers a single failed range query and is tolerated — the
/// caller proceeds with whatever other devices returned.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("time-series source unavailable: {0}")]
    Unavailable(String),

    #[error("query failed: {0}")]
    Query(String),
}

/// Read-only range-query interface over the external time-series store.
///
/// Implementations must return rows ordered by time descending whenever a
/// `limit` is applied, so a limited query keeps the newest readings. This
/// core never writes through this interface.
pub trait TimeSeriesSource: Send + Sync {
    /// Fetch readings for the given devices within [start, end] inclusive.
    ///
    /// # Arguments
    /// * `device_ids` - devices to query; implementations may fan out or
    ///   batch internally, the caller already splits per device
    /// * `start` / `end` - inclusive UTC time range
    /// * `limit` - optional hard cap on returned rows (newest first)
    fn query(
        &self,
        device_ids: &[String],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: Option<usize>,
    ) -> impl std::future::Future<Output = Result<Vec<Reading>, SourceError>> + Send;
}
