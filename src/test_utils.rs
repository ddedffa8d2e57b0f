//! Test utilities: an in-memory time-series source and property-test
//! generators
//!
//! `MemorySource` mimics the real store's query contract (inclusive range,
//! newest-first when limited) and can be told to fail or hang per device.
//! The `generators` module holds proptest strategies for domain values.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::{Parameter, Reading, SoilValues};
use crate::source::{SourceError, TimeSeriesSource};

/// How a `MemorySource` should misbehave for a given device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    /// Per-device query error, the pipeline should skip the device
    Query,
    /// Source-down error, the pipeline should abort
    Unavailable,
    /// Never respond, for exercising query timeouts
    Hang,
}

/// In-memory [`TimeSeriesSource`] backed by a plain vector of readings.
pub struct MemorySource {
    readings: Mutex<Vec<Reading>>,
    failures: Mutex<HashMap<String, FailureMode>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self {
            readings: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_readings(readings: Vec<Reading>) -> Self {
        Self {
            readings: Mutex::new(readings),
            failures: Mutex::new(HashMap::new()),
        }
    }

    pub fn push(&self, reading: Reading) {
        self.readings.lock().unwrap().push(reading);
    }

    /// Make every query against `device_id` behave per `mode`
    pub fn fail_device(&self, device_id: &str, mode: FailureMode) {
        self.failures
            .lock()
            .unwrap()
            .insert(device_id.to_string(), mode);
    }
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSeriesSource for MemorySource {
    async fn query(
        &self,
        device_ids: &[String],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: Option<usize>,
    ) -> Result<Vec<Reading>, SourceError> {
        // Copy the modes out so no lock guard is held across an await
        let modes: Vec<(String, FailureMode)> = {
            let failures = self.failures.lock().unwrap();
            device_ids
                .iter()
                .filter_map(|device| failures.get(device).map(|mode| (device.clone(), *mode)))
                .collect()
        };
        for (device, mode) in modes {
            match mode {
                FailureMode::Query => {
                    return Err(SourceError::Query(format!(
                        "injected query failure for {}",
                        device
                    )));
                }
                FailureMode::Unavailable => {
                    return Err(SourceError::Unavailable(
                        "injected source outage".to_string(),
                    ));
                }
                FailureMode::Hang => {
                    tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
                }
            }
        }

        let mut rows: Vec<Reading> = self
            .readings
            .lock()
            .unwrap()
            .iter()
            .filter(|r| device_ids.contains(&r.device) && r.time >= start && r.time <= end)
            .cloned()
            .collect();
        match limit {
            Some(limit) => {
                rows.sort_by_key(|r| std::cmp::Reverse(r.time));
                rows.truncate(limit);
            }
            None => rows.sort_by_key(|r| r.time),
        }
        Ok(rows)
    }
}

/// Build a reading from an RFC3339 timestamp; panics on a malformed
/// timestamp, which is the right behavior in a test fixture.
pub fn reading_at(device: &str, timestamp: &str, values: SoilValues) -> Reading {
    Reading {
        device: device.to_string(),
        time: DateTime::parse_from_rfc3339(timestamp)
            .expect("valid RFC3339 timestamp")
            .with_timezone(&Utc),
        values,
    }
}

/// Shorthand for a reading carrying only a moisture value
pub fn moisture_reading(device: &str, timestamp: &str, moisture_pct: f64) -> Reading {
    let mut values = SoilValues::default();
    values.set(Parameter::Moisture, Some(moisture_pct));
    reading_at(device, timestamp, values)
}

pub mod generators {
    use proptest::prelude::*;

    use crate::domain::{Parameter, SoilValues};

    /// Generate a device identifier like "esp32-soil-07"
    pub fn device_id() -> impl Strategy<Value = String> {
        (1u32..100).prop_map(|n| format!("esp32-soil-{:02}", n))
    }

    /// Generate soil values with each parameter independently present or
    /// absent, within physically plausible bounds
    pub fn soil_values() -> impl Strategy<Value = SoilValues> {
        (
            prop::option::of(-10.0..60.0f64),    // temperature_c
            prop::option::of(0.0..100.0f64),     // moisture_pct
            prop::option::of(0.0..5000.0f64),    // ec_us_cm
            prop::option::of(3.0..10.0f64),      // ph
            prop::option::of(0.0..200.0f64),     // nitrogen_mg_kg
            prop::option::of(0.0..100.0f64),     // phosphorus_mg_kg
            prop::option::of(0.0..200.0f64),     // potassium_mg_kg
            prop::option::of(0.0..3000.0f64),    // salinity_mg_l
        )
            .prop_map(|(temp, moisture, ec, ph, n, p, k, salinity)| {
                let mut values = SoilValues::default();
                let samples = [
                    (Parameter::Temperature, temp),
                    (Parameter::Moisture, moisture),
                    (Parameter::Ec, ec),
                    (Parameter::Ph, ph),
                    (Parameter::Nitrogen, n),
                    (Parameter::Phosphorus, p),
                    (Parameter::Potassium, k),
                    (Parameter::Salinity, salinity),
                ];
                for (parameter, sample) in samples {
                    values.set(parameter, sample);
                }
                values
            })
    }

    /// Generate soil values guaranteed to carry at least one parameter
    pub fn nonempty_soil_values() -> impl Strategy<Value = SoilValues> {
        soil_values().prop_filter("at least one parameter present", |v| !v.is_empty())
    }
}
