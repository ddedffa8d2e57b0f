use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{Parameter, Reading, SoilAccumulator};
use crate::profiles::{CropProfile, ParameterRange};

// ============================================================================
// Timeline Models
// ============================================================================

/// Coarse weekly status for the cultivation timeline
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CultivationStatus {
    Appropriate,
    Warning,
    Critical,
    /// Not computable: the week had no samples for the inputs this status
    /// needs
    Pending,
}

impl CultivationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CultivationStatus::Appropriate => "appropriate",
            CultivationStatus::Warning => "warning",
            CultivationStatus::Critical => "critical",
            CultivationStatus::Pending => "pending",
        }
    }
}

/// One week of the cultivation-history timeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CultivationWeekEntry {
    /// Absolute 1-based week number since planting
    pub week: u32,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub watering_status: CultivationStatus,
    pub nutrient_status: CultivationStatus,
    /// Whether any reading existed in the week, regardless of whether the
    /// statuses were computable
    pub has_data: bool,
}

/// Week-indexed timeline bounded to the recent window
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CultivationHistory {
    pub entries: Vec<CultivationWeekEntry>,
    pub total_weeks: u32,
    /// True when older weeks exist beyond the returned window
    pub has_more: bool,
}

// ============================================================================
// Status Derivation
// ============================================================================

/// Watering status from the week's mean moisture against the crop's
/// optimal moisture band. Critical below 70% of min or above 130% of max.
pub fn watering_status(moisture_mean: Option<f64>, range: &ParameterRange) -> CultivationStatus {
    let Some(moisture) = moisture_mean else {
        return CultivationStatus::Pending;
    };

    if range.contains(moisture) {
        CultivationStatus::Appropriate
    } else if moisture < range.optimal_min * 0.7 || moisture > range.optimal_max * 1.3 {
        CultivationStatus::Critical
    } else {
        CultivationStatus::Warning
    }
}

/// Nutrient status from the week's mean N, P and K. All three must be
/// present to compute anything; critical when any falls below 50% of its
/// optimal min or above 150% of its optimal max.
pub fn nutrient_status(
    nitrogen: Option<f64>,
    phosphorus: Option<f64>,
    potassium: Option<f64>,
    profile: &CropProfile,
) -> CultivationStatus {
    let (Some(n), Some(p), Some(k)) = (nitrogen, phosphorus, potassium) else {
        return CultivationStatus::Pending;
    };

    let pairs = [
        (n, profile.range(Parameter::Nitrogen)),
        (p, profile.range(Parameter::Phosphorus)),
        (k, profile.range(Parameter::Potassium)),
    ];

    if pairs
        .iter()
        .any(|(v, r)| *v < r.optimal_min * 0.5 || *v > r.optimal_max * 1.5)
    {
        CultivationStatus::Critical
    } else if pairs.iter().all(|(v, r)| r.contains(*v)) {
        CultivationStatus::Appropriate
    } else {
        CultivationStatus::Warning
    }
}

/// Derive one timeline entry from the raw readings sampled for a week
pub fn derive_week_entry(
    week: u32,
    week_start: NaiveDate,
    week_end: NaiveDate,
    readings: &[Reading],
    profile: &CropProfile,
) -> CultivationWeekEntry {
    let mut accumulator = SoilAccumulator::new();
    for reading in readings {
        accumulator.add(&reading.values);
    }

    CultivationWeekEntry {
        week,
        week_start,
        week_end,
        watering_status: watering_status(
            accumulator.mean(Parameter::Moisture),
            profile.range(Parameter::Moisture),
        ),
        nutrient_status: nutrient_status(
            accumulator.mean(Parameter::Nitrogen),
            accumulator.mean(Parameter::Phosphorus),
            accumulator.mean(Parameter::Potassium),
            profile,
        ),
        has_data: !readings.is_empty(),
    }
}
