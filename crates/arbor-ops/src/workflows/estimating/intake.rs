use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{CostParameters, HazardIndicatorSet, TreeMeasurement};

/// Validation errors raised by the intake guard.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IntakeViolation {
    #[error("tree height must be a positive number of feet (found {0})")]
    NonPositiveHeight(f64),
    #[error("canopy radius must be a positive number of feet (found {0})")]
    NonPositiveCanopyRadius(f64),
    #[error("trunk diameter must be a positive number of inches (found {0})")]
    NonPositiveDbh(f64),
    #[error("measurement field '{field}' is not a finite number")]
    NonFiniteMeasurement { field: &'static str },
}

/// Raw assessment submission as it arrives from a field report or API call.
/// Hazards come in as an open `name -> bool` map so new indicator spellings
/// never break intake; unknown names are dropped during conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentSubmission {
    pub height_ft: f64,
    pub canopy_radius_ft: f64,
    pub dbh_in: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub species: Option<String>,
    #[serde(default)]
    pub hazards: BTreeMap<String, bool>,
    /// Per-call pricing override. Omitted on almost every call; the service's
    /// configured parameters apply then.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<CostParameters>,
}

/// Geometry-only submission backing the quick estimate path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuickEstimateSubmission {
    pub height_ft: f64,
    pub canopy_radius_ft: f64,
    pub dbh_in: f64,
}

/// Guard responsible for producing validated pipeline inputs.
///
/// The scoring pipeline itself performs no validation and is total over
/// well-typed inputs; every submission path must come through here so the
/// engine never sees non-positive or non-finite geometry.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntakeGuard;

impl IntakeGuard {
    pub fn measurement_from_submission(
        &self,
        submission: AssessmentSubmission,
    ) -> Result<(TreeMeasurement, HazardIndicatorSet), IntakeViolation> {
        let AssessmentSubmission {
            height_ft,
            canopy_radius_ft,
            dbh_in,
            species,
            hazards,
            parameters: _,
        } = submission;

        let measurement = self.measurement(height_ft, canopy_radius_ft, dbh_in, species)?;
        let hazards = HazardIndicatorSet::from_flags(&hazards);

        Ok((measurement, hazards))
    }

    pub fn measurement_from_quick(
        &self,
        submission: QuickEstimateSubmission,
    ) -> Result<TreeMeasurement, IntakeViolation> {
        let QuickEstimateSubmission {
            height_ft,
            canopy_radius_ft,
            dbh_in,
        } = submission;

        self.measurement(height_ft, canopy_radius_ft, dbh_in, None)
    }

    fn measurement(
        &self,
        height_ft: f64,
        canopy_radius_ft: f64,
        dbh_in: f64,
        species: Option<String>,
    ) -> Result<TreeMeasurement, IntakeViolation> {
        check_finite("height_ft", height_ft)?;
        check_finite("canopy_radius_ft", canopy_radius_ft)?;
        check_finite("dbh_in", dbh_in)?;

        if height_ft <= 0.0 {
            return Err(IntakeViolation::NonPositiveHeight(height_ft));
        }
        if canopy_radius_ft <= 0.0 {
            return Err(IntakeViolation::NonPositiveCanopyRadius(canopy_radius_ft));
        }
        if dbh_in <= 0.0 {
            return Err(IntakeViolation::NonPositiveDbh(dbh_in));
        }

        let species = species.filter(|name| !name.trim().is_empty());

        Ok(TreeMeasurement {
            height_ft,
            canopy_radius_ft,
            dbh_in,
            species,
        })
    }
}

fn check_finite(field: &'static str, value: f64) -> Result<(), IntakeViolation> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(IntakeViolation::NonFiniteMeasurement { field })
    }
}
