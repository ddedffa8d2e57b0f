use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Core Domain Models
// ============================================================================

/// A raw multi-parameter reading reported by one soil probe
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reading {
    pub device: String,
    pub time: DateTime<Utc>,
    pub values: SoilValues,
}

/// The 8 measured soil/environment parameters of a reading or an aggregate.
///
/// Every field is optional: a probe may fail to report any subset, and a
/// missing value must stay `None` through every pipeline stage. 0 is a legal
/// sensor value for several parameters and is never used to mean "absent".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SoilValues {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_c: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moisture_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ec_us_cm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ph: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nitrogen_mg_kg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phosphorus_mg_kg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub potassium_mg_kg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salinity_mg_l: Option<f64>,
}

/// Identifies one of the 8 soil parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    Temperature,
    Moisture,
    Ec,
    Ph,
    Nitrogen,
    Phosphorus,
    Potassium,
    Salinity,
}

impl Parameter {
    /// All parameters in field order
    pub const ALL: [Parameter; 8] = [
        Parameter::Temperature,
        Parameter::Moisture,
        Parameter::Ec,
        Parameter::Ph,
        Parameter::Nitrogen,
        Parameter::Phosphorus,
        Parameter::Potassium,
        Parameter::Salinity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Parameter::Temperature => "temperature",
            Parameter::Moisture => "moisture",
            Parameter::Ec => "ec",
            Parameter::Ph => "ph",
            Parameter::Nitrogen => "nitrogen",
            Parameter::Phosphorus => "phosphorus",
            Parameter::Potassium => "potassium",
            Parameter::Salinity => "salinity",
        }
    }

    /// Human-readable label used in flagged-parameter notes
    pub fn label(&self) -> &'static str {
        match self {
            Parameter::Temperature => "soil temperature",
            Parameter::Moisture => "soil moisture",
            Parameter::Ec => "electrical conductivity",
            Parameter::Ph => "soil pH",
            Parameter::Nitrogen => "nitrogen",
            Parameter::Phosphorus => "phosphorus",
            Parameter::Potassium => "potassium",
            Parameter::Salinity => "salinity",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl SoilValues {
    /// Value of a single parameter
    pub fn get(&self, parameter: Parameter) -> Option<f64> {
        match parameter {
            Parameter::Temperature => self.temperature_c,
            Parameter::Moisture => self.moisture_pct,
            Parameter::Ec => self.ec_us_cm,
            Parameter::Ph => self.ph,
            Parameter::Nitrogen => self.nitrogen_mg_kg,
            Parameter::Phosphorus => self.phosphorus_mg_kg,
            Parameter::Potassium => self.potassium_mg_kg,
            Parameter::Salinity => self.salinity_mg_l,
        }
    }

    pub fn set(&mut self, parameter: Parameter, value: Option<f64>) {
        match parameter {
            Parameter::Temperature => self.temperature_c = value,
            Parameter::Moisture => self.moisture_pct = value,
            Parameter::Ec => self.ec_us_cm = value,
            Parameter::Ph => self.ph = value,
            Parameter::Nitrogen => self.nitrogen_mg_kg = value,
            Parameter::Phosphorus => self.phosphorus_mg_kg = value,
            Parameter::Potassium => self.potassium_mg_kg = value,
            Parameter::Salinity => self.salinity_mg_l = value,
        }
    }

    /// True when no parameter carries a value
    pub fn is_empty(&self) -> bool {
        Parameter::ALL.iter().all(|p| self.get(*p).is_none())
    }
}

// ============================================================================
// Aggregation Accumulator
// ============================================================================

/// Per-parameter sum/count accumulator for arithmetic means over non-null
/// samples. A parameter with zero contributing samples stays `None` in the
/// resulting means; it is never reported as 0 or interpolated.
#[derive(Debug, Clone, Default)]
pub struct SoilAccumulator {
    sums: [f64; 8],
    counts: [u32; 8],
}

impl SoilAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one set of values into the accumulator, skipping `None` fields
    pub fn add(&mut self, values: &SoilValues) {
        for parameter in Parameter::ALL {
            if let Some(value) = values.get(parameter) {
                self.add_sample(parameter, value);
            }
        }
    }

    pub fn add_sample(&mut self, parameter: Parameter, value: f64) {
        let i = parameter.index();
        self.sums[i] += value;
        self.counts[i] += 1;
    }

    pub fn sample_count(&self, parameter: Parameter) -> u32 {
        self.counts[parameter.index()]
    }

    /// True when at least one sample was folded in for any parameter
    pub fn has_samples(&self) -> bool {
        self.counts.iter().any(|c| *c > 0)
    }

    pub fn mean(&self, parameter: Parameter) -> Option<f64> {
        let i = parameter.index();
        if self.counts[i] == 0 {
            None
        } else {
            Some(self.sums[i] / self.counts[i] as f64)
        }
    }

    pub fn means(&self) -> SoilValues {
        let mut values = SoilValues::default();
        for parameter in Parameter::ALL {
            values.set(parameter, self.mean(parameter));
        }
        values
    }
}

// ============================================================================
// Aggregate Models
// ============================================================================

/// One averaged record per (device, local calendar day)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyAverage {
    pub device: String,
    pub date: NaiveDate,
    pub values: SoilValues,
}

/// A farmer-level day produced by reconciling every assigned device
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReconciledDay {
    pub date: NaiveDate,
    pub values: SoilValues,
    /// Devices that contributed data on this date
    pub device_count: u32,
}

/// One fixed 7-day window anchored at the planting date
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeeklyAverage {
    /// 1-based, week 1 starts on the planting date
    pub week_number: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Daily records that contributed to this window
    pub data_points: u32,
    /// Most devices seen on any single day of the window
    pub device_count: u32,
    pub values: SoilValues,
}

// ============================================================================
// Week Arithmetic
// ============================================================================

/// Inclusive [start, end] bounds of a 1-based cultivation week
pub fn week_bounds(planting_date: NaiveDate, week_number: u32) -> (NaiveDate, NaiveDate) {
    let start = planting_date + chrono::Duration::days(7 * (week_number as i64 - 1));
    (start, start + chrono::Duration::days(6))
}

/// Number of cultivation weeks elapsed from planting to `today` inclusive.
/// Returns 0 when the planting date is still in the future.
pub fn weeks_since_planting(planting_date: NaiveDate, today: NaiveDate) -> u32 {
    if today < planting_date {
        return 0;
    }
    ((today - planting_date).num_days() / 7 + 1) as u32
}

/// Local calendar date of a UTC instant in the configured zone
pub fn local_date(time: DateTime<Utc>, timezone: chrono_tz::Tz) -> NaiveDate {
    time.with_timezone(&timezone).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_soil_values_get_set_round_trip() {
        let mut values = SoilValues::default();
        assert!(values.is_empty());

        values.set(Parameter::Moisture, Some(25.0));
        values.set(Parameter::Ph, Some(6.5));

        assert_eq!(values.get(Parameter::Moisture), Some(25.0));
        assert_eq!(values.get(Parameter::Ph), Some(6.5));
        assert_eq!(values.get(Parameter::Nitrogen), None);
        assert!(!values.is_empty());
    }

    #[test]
    fn test_parameter_wire_labels_match_as_str() {
        // as_str is the stable external name; it must agree with the
        // serde representation
        for parameter in Parameter::ALL {
            let json = serde_json::to_value(parameter).unwrap();
            assert_eq!(json, serde_json::Value::String(parameter.as_str().to_string()));
        }
    }

    #[test]
    fn test_accumulator_means_ignore_missing() {
        let mut acc = SoilAccumulator::new();
        acc.add(&SoilValues {
            moisture_pct: Some(20.0),
            ph: Some(6.0),
            ..Default::default()
        });
        acc.add(&SoilValues {
            moisture_pct: Some(30.0),
            ..Default::default()
        });

        let means = acc.means();
        assert_eq!(means.moisture_pct, Some(25.0));
        // ph only had one sample, the second reading does not drag it down
        assert_eq!(means.ph, Some(6.0));
        assert_eq!(means.nitrogen_mg_kg, None);
        assert_eq!(acc.sample_count(Parameter::Moisture), 2);
        assert_eq!(acc.sample_count(Parameter::Ph), 1);
    }

    #[test]
    fn test_accumulator_empty_has_no_samples() {
        let acc = SoilAccumulator::new();
        assert!(!acc.has_samples());
        assert!(acc.means().is_empty());
    }

    #[test]
    fn test_week_bounds_are_seven_day_spans() {
        let planting = date(2026, 1, 1);

        let (start, end) = week_bounds(planting, 1);
        assert_eq!(start, date(2026, 1, 1));
        assert_eq!(end, date(2026, 1, 7));

        let (start, end) = week_bounds(planting, 3);
        assert_eq!(start, date(2026, 1, 15));
        assert_eq!(end, date(2026, 1, 21));
    }

    #[test]
    fn test_weeks_since_planting() {
        let planting = date(2026, 1, 1);

        // Planting day itself is week 1
        assert_eq!(weeks_since_planting(planting, date(2026, 1, 1)), 1);
        // Day 6 is still week 1, day 7 opens week 2
        assert_eq!(weeks_since_planting(planting, date(2026, 1, 7)), 1);
        assert_eq!(weeks_since_planting(planting, date(2026, 1, 8)), 2);
        // 10 full weeks out
        assert_eq!(weeks_since_planting(planting, date(2026, 3, 12)), 11);
        // Future planting date yields no weeks
        assert_eq!(weeks_since_planting(planting, date(2025, 12, 31)), 0);
    }

    #[test]
    fn test_local_date_respects_configured_zone() {
        // 2026-01-01 23:30 UTC is already 2026-01-02 in Bangkok (UTC+7)
        let time = DateTime::parse_from_rfc3339("2026-01-01T23:30:00Z")
            .unwrap()
            .with_timezone(&Utc);

        assert_eq!(local_date(time, chrono_tz::UTC), date(2026, 1, 1));
        assert_eq!(
            local_date(time, chrono_tz::Asia::Bangkok),
            date(2026, 1, 2)
        );
    }
}
