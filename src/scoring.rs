use serde::{Deserialize, Serialize};

use crate::domain::{Parameter, SoilValues};
use crate::profiles::{CropProfile, ParameterRange};

// ============================================================================
// Score Models
// ============================================================================

/// Coarse health label derived from the overall safety score
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Fair,
    NotHealthy,
    Critical,
}

impl HealthStatus {
    /// Label thresholds on the final 1-10 score
    pub fn from_score(score: f64) -> Self {
        if score >= 8.0 {
            HealthStatus::Healthy
        } else if score >= 6.0 {
            HealthStatus::Fair
        } else if score >= 4.0 {
            HealthStatus::NotHealthy
        } else {
            HealthStatus::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Fair => "fair",
            HealthStatus::NotHealthy => "not_healthy",
            HealthStatus::Critical => "critical",
        }
    }
}

/// Severity of a flagged parameter
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Moderate,
    Critical,
}

/// Score of a single parameter that had data
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParameterScore {
    pub parameter: Parameter,
    pub value: f64,
    pub score: f64,
    pub weight: f64,
}

/// A parameter whose score fell below the attention threshold
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlaggedParameter {
    pub parameter: Parameter,
    pub value: f64,
    pub optimal_min: f64,
    pub optimal_max: f64,
    pub severity: Severity,
    pub note: String,
}

/// Weighted composite closeness-to-optimal result for one aggregate record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SafetyScoreResult {
    /// Final score in [1, 10], rounded to one decimal
    pub score: f64,
    pub status: HealthStatus,
    pub parameter_scores: Vec<ParameterScore>,
    pub flagged: Vec<FlaggedParameter>,
    /// Deduplicated remediation suggestions, in flag order
    pub suggestions: Vec<String>,
}

// ============================================================================
// Scoring
// ============================================================================

/// Parameters scoring below this are flagged with a suggestion
const FLAG_THRESHOLD: f64 = 7.0;
/// Flagged parameters scoring below this are critical rather than moderate
const CRITICAL_THRESHOLD: f64 = 4.0;

/// Round to one decimal place
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Closeness-to-optimal score for one parameter value.
///
/// In-range values score a flat 10. Outside the range the score falls
/// linearly with the overshoot, hitting 0 at a distance of one full range
/// width (2x the midpoint tolerance) beyond the violated bound. Never
/// negative, never above 10; rounded to one decimal.
pub fn parameter_score(value: f64, range: &ParameterRange) -> f64 {
    if range.contains(value) {
        return 10.0;
    }

    let distance = if value < range.optimal_min {
        range.optimal_min - value
    } else {
        value - range.optimal_max
    };
    let max_distance = range.optimal_max - range.optimal_min;
    if max_distance <= 0.0 {
        return 0.0;
    }

    round1((10.0 - 10.0 * distance / max_distance).max(0.0))
}

/// Score one aggregate record against a crop profile.
///
/// Serves both the weekly path and the "current" single-snapshot path so
/// the two never drift apart. Parameters without data are excluded from
/// scoring entirely; when nothing is scorable the result is `None` —
/// insufficient data, not a zero score.
pub fn score_values(values: &SoilValues, profile: &CropProfile) -> Option<SafetyScoreResult> {
    let mut parameter_scores = Vec::new();
    let mut flagged = Vec::new();
    let mut suggestions: Vec<String> = Vec::new();
    let mut weighted_sum = 0.0;
    let mut weight_sum = 0.0;

    for parameter in Parameter::ALL {
        let Some(value) = values.get(parameter) else {
            continue;
        };
        let range = profile.range(parameter);
        let score = parameter_score(value, range);

        weighted_sum += score * range.weight;
        weight_sum += range.weight;
        parameter_scores.push(ParameterScore {
            parameter,
            value,
            score,
            weight: range.weight,
        });

        if score < FLAG_THRESHOLD {
            let severity = if score < CRITICAL_THRESHOLD {
                Severity::Critical
            } else {
                Severity::Moderate
            };
            let below = value < range.optimal_min;
            let direction = if below { "below" } else { "above" };
            flagged.push(FlaggedParameter {
                parameter,
                value,
                optimal_min: range.optimal_min,
                optimal_max: range.optimal_max,
                severity,
                note: format!(
                    "{} is {:.1}, {} the optimal range {}-{}",
                    parameter.label(),
                    value,
                    direction,
                    range.optimal_min,
                    range.optimal_max
                ),
            });

            let suggestion = remediation_suggestion(parameter, below).to_string();
            if !suggestions.contains(&suggestion) {
                suggestions.push(suggestion);
            }
        }
    }

    if weight_sum == 0.0 {
        return None;
    }

    let score = round1((weighted_sum / weight_sum).clamp(1.0, 10.0));
    Some(SafetyScoreResult {
        score,
        status: HealthStatus::from_score(score),
        parameter_scores,
        flagged,
        suggestions,
    })
}

/// Deterministic remediation suggestion per parameter and deviation side
fn remediation_suggestion(parameter: Parameter, below: bool) -> &'static str {
    match (parameter, below) {
        (Parameter::Temperature, true) => "Mulch the topsoil to retain warmth",
        (Parameter::Temperature, false) => "Provide shade or irrigate during the hottest hours",
        (Parameter::Moisture, true) => "Increase irrigation frequency",
        (Parameter::Moisture, false) => "Reduce irrigation and improve drainage",
        (Parameter::Ec, true) => "Apply a balanced fertilizer to raise nutrient concentration",
        (Parameter::Ec, false) => "Leach the soil with fresh water to lower conductivity",
        (Parameter::Ph, true) => "Apply agricultural lime to raise soil pH",
        (Parameter::Ph, false) => "Work in sulfur or organic matter to lower soil pH",
        (Parameter::Nitrogen, true) => "Apply a nitrogen-rich fertilizer such as urea",
        (Parameter::Nitrogen, false) => "Pause nitrogen fertilization until levels recover",
        (Parameter::Phosphorus, true) => "Apply phosphate fertilizer",
        (Parameter::Phosphorus, false) => "Avoid further phosphate applications",
        (Parameter::Potassium, true) => "Apply potash fertilizer",
        (Parameter::Potassium, false) => "Reduce potash applications",
        (Parameter::Salinity, true) => "Maintain the current salinity management",
        (Parameter::Salinity, false) => "Flush the soil with low-salinity water and improve drainage",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::CropProfiles;

    fn rice_values(moisture: Option<f64>, nitrogen: Option<f64>) -> SoilValues {
        SoilValues {
            moisture_pct: moisture,
            nitrogen_mg_kg: nitrogen,
            ..Default::default()
        }
    }

    #[test]
    fn test_in_range_value_scores_ten() {
        let range = ParameterRange::new(25.0, 40.0, 1.0);
        assert_eq!(parameter_score(25.0, &range), 10.0);
        assert_eq!(parameter_score(40.0, &range), 10.0);
        assert_eq!(parameter_score(32.0, &range), 10.0);
    }

    #[test]
    fn test_out_of_range_score_falls_linearly() {
        let range = ParameterRange::new(30.0, 50.0, 1.0);
        // Half the range width below min: 10 - 10 * 10/20 = 5
        assert_eq!(parameter_score(20.0, &range), 5.0);
        // A full range width below min bottoms out at 0
        assert_eq!(parameter_score(10.0, &range), 0.0);
        // And further out stays clamped at 0, never negative
        assert_eq!(parameter_score(-50.0, &range), 0.0);
        // Above max mirrors below min
        assert_eq!(parameter_score(60.0, &range), 5.0);
    }

    #[test]
    fn test_all_null_record_is_not_scorable() {
        let profiles = CropProfiles::builtin();
        let result = score_values(&SoilValues::default(), profiles.resolve("rice"));
        assert!(result.is_none());
    }

    #[test]
    fn test_single_bad_parameter_clamps_overall_to_one() {
        // Rice nitrogen=10 against [30,50], everything else null.
        // Parameter score 0, weighted mean 0, final clamps to 1.
        let profiles = CropProfiles::builtin();
        let result = score_values(&rice_values(None, Some(10.0)), profiles.resolve("rice"))
            .expect("one scorable parameter");

        assert_eq!(result.parameter_scores.len(), 1);
        assert_eq!(result.parameter_scores[0].score, 0.0);
        assert_eq!(result.score, 1.0);
        assert_eq!(result.status, HealthStatus::Critical);

        assert_eq!(result.flagged.len(), 1);
        let flag = &result.flagged[0];
        assert_eq!(flag.parameter, Parameter::Nitrogen);
        assert_eq!(flag.severity, Severity::Critical);
        assert!(flag.note.contains("below"));
    }

    #[test]
    fn test_all_in_range_is_healthy_ten() {
        let profiles = CropProfiles::builtin();
        let values = SoilValues {
            temperature_c: Some(28.0),
            moisture_pct: Some(30.0),
            ec_us_cm: Some(1000.0),
            ph: Some(6.2),
            nitrogen_mg_kg: Some(40.0),
            phosphorus_mg_kg: Some(15.0),
            potassium_mg_kg: Some(25.0),
            salinity_mg_l: Some(200.0),
        };

        let result = score_values(&values, profiles.resolve("rice")).unwrap();
        assert_eq!(result.score, 10.0);
        assert_eq!(result.status, HealthStatus::Healthy);
        assert!(result.flagged.is_empty());
        assert!(result.suggestions.is_empty());
        assert_eq!(result.parameter_scores.len(), 8);
    }

    #[test]
    fn test_overall_score_is_weight_weighted() {
        // moisture (weight 1.5) at 10, nitrogen (weight 1.2) at 0:
        // (10*1.5 + 0*1.2) / 2.7 = 5.556 -> 5.6
        let profiles = CropProfiles::builtin();
        let result = score_values(&rice_values(Some(30.0), Some(10.0)), profiles.resolve("rice"))
            .unwrap();

        assert_eq!(result.score, 5.6);
        assert_eq!(result.status, HealthStatus::NotHealthy);
    }

    #[test]
    fn test_moderate_flag_between_thresholds() {
        // rice moisture [25,40], width 15. value 47.5 -> distance 7.5,
        // score 10 - 10*7.5/15 = 5 -> moderate flag
        let profiles = CropProfiles::builtin();
        let result =
            score_values(&rice_values(Some(47.5), None), profiles.resolve("rice")).unwrap();

        assert_eq!(result.flagged.len(), 1);
        assert_eq!(result.flagged[0].severity, Severity::Moderate);
        assert!(result.flagged[0].note.contains("above"));
        assert_eq!(result.suggestions, vec!["Reduce irrigation and improve drainage"]);
    }

    #[test]
    fn test_suggestions_are_deduplicated() {
        let profiles = CropProfiles::builtin();
        let values = SoilValues {
            // Both far below range, distinct suggestions expected once each
            nitrogen_mg_kg: Some(0.0),
            phosphorus_mg_kg: Some(0.0),
            ..Default::default()
        };

        let result = score_values(&values, profiles.resolve("rice")).unwrap();
        assert_eq!(result.suggestions.len(), 2);
        let unique: std::collections::HashSet<_> = result.suggestions.iter().collect();
        assert_eq!(unique.len(), result.suggestions.len());
    }

    #[test]
    fn test_status_wire_labels_match_as_str() {
        let statuses = [
            HealthStatus::Healthy,
            HealthStatus::Fair,
            HealthStatus::NotHealthy,
            HealthStatus::Critical,
        ];
        for status in statuses {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, serde_json::Value::String(status.as_str().to_string()));
        }
    }

    #[test]
    fn test_status_label_thresholds() {
        assert_eq!(HealthStatus::from_score(10.0), HealthStatus::Healthy);
        assert_eq!(HealthStatus::from_score(8.0), HealthStatus::Healthy);
        assert_eq!(HealthStatus::from_score(7.9), HealthStatus::Fair);
        assert_eq!(HealthStatus::from_score(6.0), HealthStatus::Fair);
        assert_eq!(HealthStatus::from_score(5.9), HealthStatus::NotHealthy);
        assert_eq!(HealthStatus::from_score(4.0), HealthStatus::NotHealthy);
        assert_eq!(HealthStatus::from_score(3.9), HealthStatus::Critical);
        assert_eq!(HealthStatus::from_score(1.0), HealthStatus::Critical);
    }
}
