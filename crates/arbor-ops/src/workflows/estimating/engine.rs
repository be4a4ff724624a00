use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{CostParameters, HazardIndicatorSet, SizeCategory, TreeMeasurement};
use super::rules::{self, RuleContext, RuleEffect};
use super::scoring::{self, TreeScore};

/// Published assessment for one tree: rounded public-facing figures plus the
/// full rule and risk audit trail. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub base_score: f64,
    /// Small integer-weighted sum; published unrounded.
    pub hazard_impact_percent: f64,
    pub final_score: f64,
    pub total_cost: f64,
    pub applied_rules: Vec<String>,
    pub risk_flags: Vec<String>,
    pub breakdown: CostBreakdown,
}

/// Display-oriented cost decomposition. Each component is rounded
/// independently, so the parts may disagree with each other by a unit; the
/// authoritative figure is `final_cost`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub setup_cost: f64,
    pub score_cost: f64,
    pub subtotal: f64,
    pub markup: f64,
    pub final_cost: f64,
    pub additional_fees: BTreeMap<String, f64>,
}

/// Storage-free estimate for the instant-quote path: geometry only, default
/// pricing, no business rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickEstimate {
    pub base_score: f64,
    pub estimated_cost: f64,
    pub category: SizeCategory,
}

/// Stateless assessor applying the configured pricing dials to validated
/// measurements.
///
/// The whole pipeline is a pure function of its inputs: no I/O, no clock, no
/// shared state. Repeated invocation with identical inputs is bit-for-bit
/// idempotent, and any number of assessments may run concurrently. Inputs are
/// assumed to have passed the intake guard; the engine itself rejects nothing.
pub struct AssessmentEngine {
    parameters: CostParameters,
}

impl AssessmentEngine {
    pub fn new(parameters: CostParameters) -> Self {
        Self { parameters }
    }

    pub fn with_defaults() -> Self {
        Self::new(CostParameters::STANDARD)
    }

    pub fn parameters(&self) -> &CostParameters {
        &self.parameters
    }

    /// Full assessment: compose the score, price it, run the ordered rule
    /// pass, and assemble the rounded result.
    pub fn assess(
        &self,
        measurement: &TreeMeasurement,
        hazards: &HazardIndicatorSet,
    ) -> AssessmentResult {
        let score = TreeScore::compose(measurement, hazards);
        let base_cost = base_cost(score.final_score, &self.parameters);

        let context = RuleContext {
            measurement,
            hazards,
            hazard_impact_percent: score.hazard_impact_percent,
            parameters: &self.parameters,
        };
        let effect = rules::run_rules(&context, base_cost);

        assemble(score, effect, &self.parameters)
    }

    /// Quick estimate from geometry alone. The size category is derived from
    /// the unrounded base score; the published score and cost are rounded.
    pub fn quick_estimate(&self, measurement: &TreeMeasurement) -> QuickEstimate {
        let base_score = scoring::base_score(measurement);
        let estimated_cost = base_cost(base_score, &self.parameters);
        let category = SizeCategory::for_score(base_score);

        QuickEstimate {
            base_score: base_score.round(),
            estimated_cost: estimated_cost.round(),
            category,
        }
    }
}

/// Pre-rules monetary estimate; the rule engine's starting accumulator value.
fn base_cost(final_score: f64, parameters: &CostParameters) -> f64 {
    let score_cost = final_score * parameters.rate_per_point;
    let subtotal = parameters.setup_cost + score_cost;
    subtotal * parameters.profit_multiplier
}

fn assemble(score: TreeScore, effect: RuleEffect, parameters: &CostParameters) -> AssessmentResult {
    let score_cost = score.final_score * parameters.rate_per_point;
    let subtotal = parameters.setup_cost + score_cost;
    let markup = subtotal * (parameters.profit_multiplier - 1.0);

    let RuleEffect {
        cost,
        applied_rules,
        risk_flags,
        additional_fees,
    } = effect;

    AssessmentResult {
        base_score: score.base_score.round(),
        hazard_impact_percent: score.hazard_impact_percent,
        final_score: score.final_score.round(),
        total_cost: cost.round(),
        applied_rules,
        risk_flags,
        breakdown: CostBreakdown {
            setup_cost: parameters.setup_cost,
            score_cost: score_cost.round(),
            subtotal: subtotal.round(),
            markup: markup.round(),
            final_cost: cost.round(),
            additional_fees,
        },
    }
}
