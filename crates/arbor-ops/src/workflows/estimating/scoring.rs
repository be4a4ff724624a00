use serde::{Deserialize, Serialize};

use super::domain::{HazardIndicatorSet, TreeMeasurement};

/// Composite of the structural score before and after hazard adjustment.
/// All three figures are carried unrounded; rule thresholds downstream compare
/// against the exact values, and rounding happens only when the published
/// result is assembled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeScore {
    pub base_score: f64,
    pub hazard_impact_percent: f64,
    pub final_score: f64,
}

impl TreeScore {
    pub fn compose(measurement: &TreeMeasurement, hazards: &HazardIndicatorSet) -> Self {
        let base_score = base_score(measurement);
        let hazard_impact_percent = hazard_impact_percent(hazards);
        let final_score = base_score * (1.0 + hazard_impact_percent / 100.0);

        Self {
            base_score,
            hazard_impact_percent,
            final_score,
        }
    }
}

/// Volumetric proxy for removal complexity: height times canopy diameter
/// times trunk diameter expressed in feet. A relative score, not a physical
/// volume; callers must not read units into it.
pub(crate) fn base_score(measurement: &TreeMeasurement) -> f64 {
    measurement.height_ft * (measurement.canopy_radius_ft * 2.0) * (measurement.dbh_in / 12.0)
}

/// Sum of the flagged indicator weights. Deliberately uncapped: a heavily
/// hazardous site can exceed 100 and more than double the base score.
pub(crate) fn hazard_impact_percent(hazards: &HazardIndicatorSet) -> f64 {
    hazards.iter().map(|indicator| indicator.weight_percent()).sum()
}
