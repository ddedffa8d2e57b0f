use chrono::Timelike;
use chrono_tz::Tz;
use std::collections::BTreeMap;

use crate::domain::{local_date, DailyAverage, Reading, SoilAccumulator};

/// Reduces raw readings into one averaged record per (device, local
/// calendar day), preferring readings taken at the configured snapshot hour.
///
/// The snapshot/all-day choice is made once per day: when a day has any
/// snapshot-hour reading, every parameter of that day comes from the
/// snapshot accumulator (and a parameter the snapshot did not report stays
/// `None`); only a day without a single snapshot-hour reading falls back to
/// averaging all of its readings.
#[derive(Debug, Clone)]
pub struct DailyAggregator {
    timezone: Tz,
    snapshot_hour: u32,
}

/// Parallel accumulators for one (device, day) bucket
#[derive(Debug, Default)]
struct DayBucket {
    snapshot: SoilAccumulator,
    all_day: SoilAccumulator,
}

impl DailyAggregator {
    pub fn new(timezone: Tz, snapshot_hour: u32) -> Self {
        Self {
            timezone,
            snapshot_hour,
        }
    }

    /// Bucket readings by (device, local date) and average each bucket.
    ///
    /// Returns per-device daily series sorted by date ascending. Empty
    /// input yields an empty map, not an error.
    pub fn aggregate(&self, readings: &[Reading]) -> BTreeMap<String, Vec<DailyAverage>> {
        let mut buckets: BTreeMap<(String, chrono::NaiveDate), DayBucket> = BTreeMap::new();

        for reading in readings {
            let local = reading.time.with_timezone(&self.timezone);
            let date = local_date(reading.time, self.timezone);
            let bucket = buckets.entry((reading.device.clone(), date)).or_default();

            if local.hour() == self.snapshot_hour {
                bucket.snapshot.add(&reading.values);
            }
            bucket.all_day.add(&reading.values);
        }

        let mut result: BTreeMap<String, Vec<DailyAverage>> = BTreeMap::new();
        for ((device, date), bucket) in buckets {
            let values = if bucket.snapshot.has_samples() {
                bucket.snapshot.means()
            } else {
                bucket.all_day.means()
            };
            result
                .entry(device.clone())
                .or_default()
                .push(DailyAverage {
                    device,
                    date,
                    values,
                });
        }

        // BTreeMap iteration is already (device, date) ascending, so each
        // per-device vector comes out date-sorted.
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SoilValues;
    use chrono::{DateTime, Utc};

    fn reading(device: &str, rfc3339: &str, moisture: f64) -> Reading {
        Reading {
            device: device.to_string(),
            time: DateTime::parse_from_rfc3339(rfc3339)
                .unwrap()
                .with_timezone(&Utc),
            values: SoilValues {
                moisture_pct: Some(moisture),
                ..Default::default()
            },
        }
    }

    fn aggregator() -> DailyAggregator {
        DailyAggregator::new(chrono_tz::UTC, 1)
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        assert!(aggregator().aggregate(&[]).is_empty());
    }

    #[test]
    fn test_snapshot_hour_reading_wins_over_rest_of_day() {
        let readings = vec![
            reading("dev-a", "2026-01-01T01:00:00Z", 25.0),
            reading("dev-a", "2026-01-01T09:00:00Z", 60.0),
            reading("dev-a", "2026-01-01T15:00:00Z", 70.0),
        ];

        let daily = aggregator().aggregate(&readings);
        let days = &daily["dev-a"];
        assert_eq!(days.len(), 1);
        // Only the 01:00 snapshot contributes, not the all-day mean
        assert_eq!(days[0].values.moisture_pct, Some(25.0));
        assert_eq!(days[0].date, chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
    }

    #[test]
    fn test_no_snapshot_reading_falls_back_to_all_day_mean() {
        let readings = vec![
            reading("dev-a", "2026-01-01T09:00:00Z", 20.0),
            reading("dev-a", "2026-01-01T15:00:00Z", 30.0),
        ];

        let daily = aggregator().aggregate(&readings);
        assert_eq!(daily["dev-a"][0].values.moisture_pct, Some(25.0));
    }

    #[test]
    fn test_snapshot_day_leaves_unreported_parameters_null() {
        // The 01:00 reading reports only moisture; ph appears later in the
        // day. The day-level snapshot decision keeps ph as null.
        let mut snapshot = reading("dev-a", "2026-01-01T01:30:00Z", 25.0);
        snapshot.values.ph = None;
        let mut midday = reading("dev-a", "2026-01-01T12:00:00Z", 60.0);
        midday.values.ph = Some(6.5);

        let daily = aggregator().aggregate(&[snapshot, midday]);
        let day = &daily["dev-a"][0];
        assert_eq!(day.values.moisture_pct, Some(25.0));
        assert_eq!(day.values.ph, None);
    }

    #[test]
    fn test_days_are_split_by_configured_local_zone() {
        // 18:00 UTC on Jan 1 is already 01:00 Jan 2 in Bangkok (UTC+7),
        // which is also the snapshot hour there.
        let readings = vec![
            reading("dev-a", "2026-01-01T05:00:00Z", 40.0),
            reading("dev-a", "2026-01-01T18:00:00Z", 30.0),
        ];

        let bangkok = DailyAggregator::new(chrono_tz::Asia::Bangkok, 1);
        let daily = bangkok.aggregate(&readings);
        let days = &daily["dev-a"];

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert_eq!(days[0].values.moisture_pct, Some(40.0));
        assert_eq!(days[1].date, chrono::NaiveDate::from_ymd_opt(2026, 1, 2).unwrap());
        assert_eq!(days[1].values.moisture_pct, Some(30.0));
    }

    #[test]
    fn test_devices_are_kept_separate() {
        let readings = vec![
            reading("dev-a", "2026-01-01T09:00:00Z", 20.0),
            reading("dev-b", "2026-01-01T09:00:00Z", 30.0),
        ];

        let daily = aggregator().aggregate(&readings);
        assert_eq!(daily.len(), 2);
        assert_eq!(daily["dev-a"][0].values.moisture_pct, Some(20.0));
        assert_eq!(daily["dev-b"][0].values.moisture_pct, Some(30.0));
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let readings = vec![
            reading("dev-a", "2026-01-01T01:00:00Z", 25.0),
            reading("dev-a", "2026-01-02T09:00:00Z", 31.0),
            reading("dev-a", "2026-01-02T21:00:00Z", 29.0),
        ];

        let first = aggregator().aggregate(&readings);
        let second = aggregator().aggregate(&readings);
        assert_eq!(first, second);
    }
}
