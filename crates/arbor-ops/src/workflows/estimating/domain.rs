use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Identifier wrapper for trees within a job's estimate.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TreeId(pub String);

/// Identifier wrapper for parent job records.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

/// Tree geometry captured during a site visit. Created once per assessment
/// and never mutated; callers are responsible for validating positive values
/// through the intake guard before the scoring pipeline sees them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeMeasurement {
    pub height_ft: f64,
    pub canopy_radius_ft: f64,
    /// Diameter at breast height, in inches.
    pub dbh_in: f64,
    /// Advisory only; never feeds the arithmetic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub species: Option<String>,
}

/// Site-hazard indicators observed during assessment. Each carries a fixed
/// impact weight in percentage points; the weights live in one lookup so the
/// table can be audited and revised without touching control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardIndicator {
    Pool,
    Fence,
    Structures,
    Utilities,
    Permitting,
    SteepTerrain,
    SoftSoil,
    LimitedAccess,
    NearbyVehicles,
    GlassWindows,
    SepticTank,
    OverheadLines,
    UndergroundUtilities,
}

impl HazardIndicator {
    pub const ALL: [HazardIndicator; 13] = [
        HazardIndicator::Pool,
        HazardIndicator::Fence,
        HazardIndicator::Structures,
        HazardIndicator::Utilities,
        HazardIndicator::Permitting,
        HazardIndicator::SteepTerrain,
        HazardIndicator::SoftSoil,
        HazardIndicator::LimitedAccess,
        HazardIndicator::NearbyVehicles,
        HazardIndicator::GlassWindows,
        HazardIndicator::SepticTank,
        HazardIndicator::OverheadLines,
        HazardIndicator::UndergroundUtilities,
    ];

    /// Impact weight in percentage points applied to the base score.
    pub const fn weight_percent(self) -> f64 {
        match self {
            HazardIndicator::Pool => 15.0,
            HazardIndicator::Fence => 10.0,
            HazardIndicator::Structures => 20.0,
            HazardIndicator::Utilities => 25.0,
            HazardIndicator::Permitting => 30.0,
            HazardIndicator::SteepTerrain => 12.0,
            HazardIndicator::SoftSoil => 8.0,
            HazardIndicator::LimitedAccess => 18.0,
            HazardIndicator::NearbyVehicles => 14.0,
            HazardIndicator::GlassWindows => 9.0,
            HazardIndicator::SepticTank => 7.0,
            HazardIndicator::OverheadLines => 22.0,
            HazardIndicator::UndergroundUtilities => 19.0,
        }
    }

    pub const fn key(self) -> &'static str {
        match self {
            HazardIndicator::Pool => "pool",
            HazardIndicator::Fence => "fence",
            HazardIndicator::Structures => "structures",
            HazardIndicator::Utilities => "utilities",
            HazardIndicator::Permitting => "permitting",
            HazardIndicator::SteepTerrain => "steep_terrain",
            HazardIndicator::SoftSoil => "soft_soil",
            HazardIndicator::LimitedAccess => "limited_access",
            HazardIndicator::NearbyVehicles => "nearby_vehicles",
            HazardIndicator::GlassWindows => "glass_windows",
            HazardIndicator::SepticTank => "septic_tank",
            HazardIndicator::OverheadLines => "overhead_lines",
            HazardIndicator::UndergroundUtilities => "underground_utilities",
        }
    }

    /// Resolve an indicator from a field-report key. Accepts snake_case and
    /// legacy camelCase spellings; anything else is unknown and the caller
    /// decides whether to ignore it.
    pub fn from_key(key: &str) -> Option<Self> {
        let compact: String = key
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        HazardIndicator::ALL
            .iter()
            .copied()
            .find(|indicator| {
                let canonical: String = indicator.key().chars().filter(|c| *c != '_').collect();
                canonical == compact
            })
    }
}

/// The set of indicators flagged true for a single assessment. Missing
/// indicators are simply absent; there is no tri-state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HazardIndicatorSet {
    flagged: BTreeSet<HazardIndicator>,
}

impl HazardIndicatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(indicators: impl IntoIterator<Item = HazardIndicator>) -> Self {
        Self {
            flagged: indicators.into_iter().collect(),
        }
    }

    /// Build a set from an open `name -> bool` map, the shape field reports
    /// arrive in. Unknown keys are ignored, never summed and never an error;
    /// keys mapped to false are equivalent to absent keys.
    pub fn from_flags(flags: &BTreeMap<String, bool>) -> Self {
        let flagged = flags
            .iter()
            .filter(|(_, on)| **on)
            .filter_map(|(key, _)| HazardIndicator::from_key(key))
            .collect();
        Self { flagged }
    }

    pub fn set(&mut self, indicator: HazardIndicator, on: bool) {
        if on {
            self.flagged.insert(indicator);
        } else {
            self.flagged.remove(&indicator);
        }
    }

    pub fn contains(&self, indicator: HazardIndicator) -> bool {
        self.flagged.contains(&indicator)
    }

    pub fn iter(&self) -> impl Iterator<Item = HazardIndicator> + '_ {
        self.flagged.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.flagged.is_empty()
    }

    pub fn len(&self) -> usize {
        self.flagged.len()
    }
}

/// Pricing dials for the estimate. Treated as deployment configuration, not
/// domain state; both the full assessment and the quick estimate consume the
/// same `STANDARD` default so the two paths cannot drift apart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostParameters {
    pub setup_cost: f64,
    pub rate_per_point: f64,
    pub profit_multiplier: f64,
}

impl CostParameters {
    pub const STANDARD: CostParameters = CostParameters {
        setup_cost: 200.0,
        rate_per_point: 0.75,
        profit_multiplier: 1.5,
    };
}

impl Default for CostParameters {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Coarse bucket for quick estimates, derived from thresholds on the
/// unrounded base score. Boundaries are inclusive on the next tier up:
/// exactly 1000 is Medium, exactly 2000 is Large, exactly 3500 is Extra Large.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizeCategory {
    #[serde(rename = "Small")]
    Small,
    #[serde(rename = "Medium")]
    Medium,
    #[serde(rename = "Large")]
    Large,
    #[serde(rename = "Extra Large")]
    ExtraLarge,
}

impl SizeCategory {
    pub fn for_score(base_score: f64) -> Self {
        if base_score < 1000.0 {
            SizeCategory::Small
        } else if base_score < 2000.0 {
            SizeCategory::Medium
        } else if base_score < 3500.0 {
            SizeCategory::Large
        } else {
            SizeCategory::ExtraLarge
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            SizeCategory::Small => "Small",
            SizeCategory::Medium => "Medium",
            SizeCategory::Large => "Large",
            SizeCategory::ExtraLarge => "Extra Large",
        }
    }
}
