use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cache::{ScoreCache, ScoreCacheKey};
use crate::config::InsightConfig;
use crate::cultivation::{derive_week_entry, CultivationHistory};
use crate::daily::DailyAggregator;
use crate::domain::{
    week_bounds, weeks_since_planting, Reading, ReconciledDay, SoilAccumulator, SoilValues,
    WeeklyAverage,
};
use crate::error::Computed;
use crate::profiles::CropProfiles;
use crate::reconcile::reconcile_daily;
use crate::scoring::{score_values, SafetyScoreResult};
use crate::source::{SourceError, TimeSeriesSource};
use crate::time::{Clock, SystemClock};
use crate::weekly::aggregate_weeks;

// ============================================================================
// Response Models
// ============================================================================

/// One cultivation week with its averaged values and safety analysis.
/// `analysis` is absent when the week had nothing scorable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeekReport {
    pub average: WeeklyAverage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<SafetyScoreResult>,
}

/// Weekly health trend for a farmer profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeeklySummary {
    pub weeks: Vec<WeekReport>,
    pub total_weeks: u32,
}

/// Latest reconciled reading across a farmer's devices, scored
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CurrentHealth {
    pub values: SoilValues,
    pub analysis: SafetyScoreResult,
    /// Devices that contributed a recent reading
    pub device_count: u32,
}

/// Cached per-week safety-score timeline for one crop
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CropSafetyReport {
    /// Resolved profile name ("general" for unrecognized crops)
    pub crop: String,
    pub weeks: Vec<WeekReport>,
    pub total_weeks: u32,
}

// ============================================================================
// Service
// ============================================================================

/// Orchestrates the whole insight pipeline: concurrent per-device source
/// queries, daily/weekly aggregation, reconciliation, scoring, the
/// cultivation timeline, and the TTL score cache.
///
/// Stateless per call apart from the injected cache; safe to share behind
/// an `Arc` across concurrent requests.
pub struct InsightService<S> {
    source: S,
    config: InsightConfig,
    clock: Arc<dyn Clock>,
    profiles: CropProfiles,
    daily: DailyAggregator,
    cache: ScoreCache<CropSafetyReport>,
}

impl<S: TimeSeriesSource> InsightService<S> {
    pub fn new(source: S, config: InsightConfig) -> Self {
        Self::with_clock(source, config, Arc::new(SystemClock::new()))
    }

    /// Construct with an explicit clock (fixed clocks in tests)
    pub fn with_clock(source: S, config: InsightConfig, clock: Arc<dyn Clock>) -> Self {
        let daily = DailyAggregator::new(config.timezone, config.snapshot_hour);
        let cache = ScoreCache::new(config.cache_ttl, clock.clone());
        Self {
            source,
            config,
            clock,
            profiles: CropProfiles::builtin(),
            daily,
            cache,
        }
    }

    // ------------------------------------------------------------------
    // Upstream operations
    // ------------------------------------------------------------------

    /// Weekly averages plus per-week safety analysis from the planting
    /// date to today (or the harvest date, whichever comes first).
    pub async fn compute_weekly_summary(
        &self,
        farmer_id: &str,
        device_ids: &[String],
        planting_date: NaiveDate,
        harvest_date: Option<NaiveDate>,
    ) -> Result<Computed<WeeklySummary>, SourceError> {
        info!(
            "Computing weekly summary for farmer {} across {} devices",
            farmer_id,
            device_ids.len()
        );

        let today = self.effective_today(harvest_date);
        let profile = self.profiles.general().clone();
        let (weeks, total_weeks) = match self
            .weekly_reports(device_ids, planting_date, today, |values| {
                score_values(values, &profile)
            })
            .await?
        {
            Some(result) => result,
            None => {
                return Ok(Computed::insufficient_data(
                    "no readings found for the requested devices and range",
                ))
            }
        };

        info!(
            "Weekly summary for farmer {}: {} weeks emitted of {} since planting",
            farmer_id,
            weeks.len(),
            total_weeks
        );
        Ok(Computed::ready(WeeklySummary { weeks, total_weeks }))
    }

    /// Latest reading per device, reconciled across devices and scored
    /// against the general profile.
    pub async fn compute_current_health(
        &self,
        device_ids: &[String],
    ) -> Result<Computed<CurrentHealth>, SourceError> {
        let now = self.clock.now();
        let readings = self
            .query_devices(device_ids, now - chrono::Duration::hours(24), now, Some(1))
            .await?;
        if readings.is_empty() {
            return Ok(Computed::insufficient_data(
                "no recent readings for the requested devices",
            ));
        }

        let device_count = readings.len() as u32;
        let mut accumulator = SoilAccumulator::new();
        for reading in &readings {
            accumulator.add(&reading.values);
        }
        let values = accumulator.means();

        let Some(analysis) = score_values(&values, self.profiles.general()) else {
            return Ok(Computed::insufficient_data(
                "recent readings carry no scorable parameters",
            ));
        };

        debug!(
            "Current health across {} devices: score {}",
            device_count, analysis.score
        );
        Ok(Computed::ready(CurrentHealth {
            values,
            analysis,
            device_count,
        }))
    }

    /// Per-week crop-safety timeline, memoized per (farmer, crop, device
    /// set) with the configured TTL.
    pub async fn compute_crop_safety(
        &self,
        farmer_id: &str,
        device_ids: &[String],
        planting_date: NaiveDate,
        harvest_date: Option<NaiveDate>,
        crop_type: &str,
    ) -> Result<Computed<CropSafetyReport>, SourceError> {
        let profile = self.profiles.resolve(crop_type).clone();
        let key = ScoreCacheKey::new(farmer_id, profile.name.clone(), device_ids);

        if let Some(report) = self.cache.get(&key) {
            info!(
                "Crop safety cache hit for farmer {} crop {}",
                farmer_id, profile.name
            );
            return Ok(Computed::ready(report));
        }

        let today = self.effective_today(harvest_date);
        let (weeks, total_weeks) = match self
            .weekly_reports(device_ids, planting_date, today, |values| {
                score_values(values, &profile)
            })
            .await?
        {
            Some(result) => result,
            None => {
                return Ok(Computed::insufficient_data(
                    "no readings found for the requested devices and range",
                ))
            }
        };

        let report = CropSafetyReport {
            crop: profile.name.clone(),
            weeks,
            total_weeks,
        };
        self.cache.put(key, report.clone());
        info!(
            "Crop safety computed and cached for farmer {} crop {} ({} weeks)",
            farmer_id,
            profile.name,
            report.weeks.len()
        );
        Ok(Computed::ready(report))
    }

    /// Week-indexed watering/nutrient timeline over the most recent
    /// `max_weeks` cultivation weeks (bounded sampling per week).
    pub async fn compute_cultivation_history(
        &self,
        device_ids: &[String],
        planting_date: NaiveDate,
        crop_type: &str,
        max_weeks: Option<u32>,
    ) -> Result<Computed<CultivationHistory>, SourceError> {
        let today = self.clock.today(self.config.timezone);
        let total_weeks = weeks_since_planting(planting_date, today);
        if total_weeks == 0 {
            return Ok(Computed::insufficient_data(
                "planting date is in the future",
            ));
        }

        let profile = self.profiles.resolve(crop_type);
        let window = total_weeks.min(max_weeks.unwrap_or(self.config.history_max_weeks).max(1));
        let first_week = total_weeks - window + 1;

        let mut entries = Vec::with_capacity(window as usize);
        for week in first_week..=total_weeks {
            let (week_start, week_end) = week_bounds(planting_date, week);
            let query_end = week_end.min(today);
            let (start, end) = self.utc_range(week_start, query_end);
            let readings = self
                .query_devices(device_ids, start, end, Some(self.config.week_sample_limit))
                .await?;
            entries.push(derive_week_entry(
                week, week_start, week_end, &readings, profile,
            ));
        }

        info!(
            "Cultivation history: {} of {} weeks computed for crop {}",
            window, total_weeks, profile.name
        );
        Ok(Computed::ready(CultivationHistory {
            entries,
            total_weeks,
            has_more: total_weeks > window,
        }))
    }

    /// Wholesale cache clear, invoked by the external daily scheduler.
    /// Returns the number of entries dropped.
    pub fn clear_cache(&self) -> usize {
        let cleared = self.cache.clear_all();
        info!("Score cache cleared: {} entries dropped", cleared);
        cleared
    }

    // ------------------------------------------------------------------
    // Pipeline plumbing
    // ------------------------------------------------------------------

    /// Full raw-to-weekly pipeline: fan-out query, daily aggregation,
    /// reconciliation, weekly windows, per-week analysis. `None` when the
    /// range yields no data at all.
    async fn weekly_reports(
        &self,
        device_ids: &[String],
        planting_date: NaiveDate,
        today: NaiveDate,
        analyze: impl Fn(&SoilValues) -> Option<SafetyScoreResult>,
    ) -> Result<Option<(Vec<WeekReport>, u32)>, SourceError> {
        if today < planting_date {
            return Ok(None);
        }

        let (start, end) = self.utc_range(planting_date, today);
        let readings = self.query_devices(device_ids, start, end, None).await?;
        if readings.is_empty() {
            return Ok(None);
        }

        let per_device = self.daily.aggregate(&readings);
        let farm_days: Vec<ReconciledDay> = reconcile_daily(&per_device);
        let weeks = aggregate_weeks(&farm_days, planting_date, today);
        if weeks.is_empty() {
            return Ok(None);
        }

        let total_weeks = weeks_since_planting(planting_date, today);
        let reports = weeks
            .into_iter()
            .map(|average| {
                let analysis = analyze(&average.values);
                WeekReport { average, analysis }
            })
            .collect();
        Ok(Some((reports, total_weeks)))
    }

    /// Issue one range query per device concurrently and merge the rows.
    ///
    /// A failed or timed-out device query is logged and skipped so one bad
    /// probe cannot abort the farmer's whole request; only a source-down
    /// `Unavailable` error is propagated. All queries complete (or fail)
    /// before the merged rows are returned — no partial aggregation.
    async fn query_devices(
        &self,
        device_ids: &[String],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: Option<usize>,
    ) -> Result<Vec<Reading>, SourceError> {
        let queries = device_ids.iter().map(|device| async move {
            let result = tokio::time::timeout(
                self.config.query_timeout,
                self.source
                    .query(std::slice::from_ref(device), start, end, limit),
            )
            .await;
            (device, result)
        });

        let mut readings = Vec::new();
        for (device, result) in join_all(queries).await {
            match result {
                Ok(Ok(rows)) => {
                    debug!("Device {}: {} rows", device, rows.len());
                    readings.extend(rows);
                }
                Ok(Err(SourceError::Unavailable(message))) => {
                    return Err(SourceError::Unavailable(message));
                }
                Ok(Err(SourceError::Query(message))) => {
                    warn!(
                        "Query failed for device {}: {} - continuing with remaining devices",
                        device, message
                    );
                }
                Err(_) => {
                    warn!(
                        "Query timed out for device {} after {:?} - continuing with remaining devices",
                        device, self.config.query_timeout
                    );
                }
            }
        }
        Ok(readings)
    }

    /// Today in the configured zone, capped at the harvest date when set
    fn effective_today(&self, harvest_date: Option<NaiveDate>) -> NaiveDate {
        let today = self.clock.today(self.config.timezone);
        match harvest_date {
            Some(harvest) => harvest.min(today),
            None => today,
        }
    }

    /// UTC instants spanning [start_date 00:00, end_date 23:59:59] in the
    /// configured zone
    fn utc_range(&self, start_date: NaiveDate, end_date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        let tz = self.config.timezone;
        let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).expect("valid time of day");

        let start_local = start_date.and_time(NaiveTime::MIN);
        let end_local = end_date.and_time(end_of_day);

        // DST gaps can make a local midnight nonexistent; fall back to
        // interpreting the naive instant as UTC for those rare edges.
        let start = tz
            .from_local_datetime(&start_local)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&start_local));
        let end = tz
            .from_local_datetime(&end_local)
            .latest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&end_local));
        (start, end)
    }
}
