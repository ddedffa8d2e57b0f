use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::Parameter;

/// Crop-specific optimal band and scoring weight for one soil parameter
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ParameterRange {
    pub optimal_min: f64,
    pub optimal_max: f64,
    pub weight: f64,
}

impl ParameterRange {
    pub const fn new(optimal_min: f64, optimal_max: f64, weight: f64) -> Self {
        Self {
            optimal_min,
            optimal_max,
            weight,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.optimal_min && value <= self.optimal_max
    }
}

/// A named set of optimal ranges, one per parameter. Static configuration,
/// immutable at runtime.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CropProfile {
    pub name: String,
    ranges: [ParameterRange; 8],
}

impl CropProfile {
    pub fn new(name: impl Into<String>, ranges: [ParameterRange; 8]) -> Self {
        Self {
            name: name.into(),
            ranges,
        }
    }

    pub fn range(&self, parameter: Parameter) -> &ParameterRange {
        &self.ranges[parameter as usize]
    }
}

/// Registry of built-in crop profiles with a "general" fallback.
///
/// Unknown crop names silently resolve to the general profile; an
/// unrecognized crop is a documented fallback, not an error path.
#[derive(Debug, Clone)]
pub struct CropProfiles {
    profiles: HashMap<String, CropProfile>,
    general: CropProfile,
}

impl CropProfiles {
    /// Build the built-in profile set (rice, vegetables, general)
    pub fn builtin() -> Self {
        let mut profiles = HashMap::new();

        // Ranges ordered as Parameter::ALL: temperature, moisture, ec, ph,
        // nitrogen, phosphorus, potassium, salinity.
        let rice = CropProfile::new(
            "rice",
            [
                ParameterRange::new(20.0, 35.0, 1.0),
                ParameterRange::new(25.0, 40.0, 1.5),
                ParameterRange::new(500.0, 2000.0, 0.8),
                ParameterRange::new(5.5, 7.0, 1.2),
                ParameterRange::new(30.0, 50.0, 1.2),
                ParameterRange::new(10.0, 25.0, 1.0),
                ParameterRange::new(15.0, 40.0, 1.0),
                ParameterRange::new(0.0, 600.0, 0.8),
            ],
        );
        let vegetables = CropProfile::new(
            "vegetables",
            [
                ParameterRange::new(15.0, 30.0, 1.0),
                ParameterRange::new(40.0, 70.0, 1.5),
                ParameterRange::new(800.0, 2500.0, 0.8),
                ParameterRange::new(6.0, 7.0, 1.2),
                ParameterRange::new(25.0, 60.0, 1.2),
                ParameterRange::new(15.0, 40.0, 1.0),
                ParameterRange::new(20.0, 60.0, 1.0),
                ParameterRange::new(0.0, 800.0, 0.8),
            ],
        );
        let general = CropProfile::new(
            "general",
            [
                ParameterRange::new(15.0, 35.0, 1.0),
                ParameterRange::new(20.0, 60.0, 1.5),
                ParameterRange::new(200.0, 3000.0, 0.8),
                ParameterRange::new(5.5, 7.5, 1.2),
                ParameterRange::new(20.0, 60.0, 1.0),
                ParameterRange::new(10.0, 40.0, 1.0),
                ParameterRange::new(10.0, 60.0, 1.0),
                ParameterRange::new(0.0, 1000.0, 0.8),
            ],
        );

        profiles.insert(rice.name.clone(), rice);
        profiles.insert(vegetables.name.clone(), vegetables);
        profiles.insert(general.name.clone(), general.clone());

        Self { profiles, general }
    }

    /// Resolve a crop type to its profile, falling back to "general" for
    /// unrecognized names. Lookup is case-insensitive.
    pub fn resolve(&self, crop_type: &str) -> &CropProfile {
        self.profiles
            .get(crop_type.trim().to_lowercase().as_str())
            .unwrap_or(&self.general)
    }

    pub fn general(&self) -> &CropProfile {
        &self.general
    }
}

impl Default for CropProfiles {
    fn default() -> Self {
        Self::builtin()
    }
}
