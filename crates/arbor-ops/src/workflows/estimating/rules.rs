use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{CostParameters, HazardIndicator, HazardIndicatorSet, TreeMeasurement};

const LARGE_TREE_DBH_IN: f64 = 24.0;
const LARGE_TREE_MULTIPLIER: f64 = 1.15;
const HIGH_RISK_IMPACT_PERCENT: f64 = 50.0;
const SAFETY_EQUIPMENT_FEE: f64 = 150.0;
const MINIMUM_JOB_COST: f64 = 500.0;
const CRANE_HEIGHT_FT: f64 = 60.0;
const CRANE_ACCESS_HEIGHT_FT: f64 = 40.0;
const CRANE_SETUP_FEE: f64 = 800.0;
const CRANE_RATE_PREMIUM: f64 = 0.25;
const PERMIT_PROCESSING_FEE: f64 = 150.0;

/// Read-only inputs every business rule can inspect.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RuleContext<'a> {
    pub(crate) measurement: &'a TreeMeasurement,
    pub(crate) hazards: &'a HazardIndicatorSet,
    pub(crate) hazard_impact_percent: f64,
    pub(crate) parameters: &'a CostParameters,
}

/// Accumulator threaded through the rule pass. The trails are append-only
/// within one evaluation: no rule removes an entry a predecessor added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleEffect {
    pub cost: f64,
    pub applied_rules: Vec<String>,
    pub risk_flags: Vec<String>,
    pub additional_fees: BTreeMap<String, f64>,
}

impl RuleEffect {
    pub(crate) fn seeded(base_cost: f64) -> Self {
        Self {
            cost: base_cost,
            applied_rules: Vec::new(),
            risk_flags: Vec::new(),
            additional_fees: BTreeMap::new(),
        }
    }

    /// Record a named fee and fold its amount into the running cost. Writing
    /// the same name twice replaces the recorded amount; each rule in the
    /// current table writes its own distinct key once.
    fn charge_fee(&mut self, name: &str, amount: f64) {
        self.additional_fees.insert(name.to_string(), amount);
        self.cost += amount;
    }
}

/// One ordered, conditionally-triggered adjustment step. `order` is the
/// evaluation position; the table is folded lowest-order first and each rule
/// sees the cost after all earlier rules have applied.
pub(crate) struct BusinessRule {
    pub(crate) code: &'static str,
    pub(crate) order: u8,
    pub(crate) apply: fn(&RuleContext<'_>, RuleEffect) -> RuleEffect,
}

/// The rule table in evaluation order. The minimum-job-size floor sits ahead
/// of the crane and permit fees on purpose: it floors the running subtotal at
/// that point in the pipeline, not the published total. Reordering it changes
/// quote arithmetic for small jobs.
pub(crate) fn rule_table() -> Vec<BusinessRule> {
    let mut rules = vec![
        BusinessRule {
            code: "large_tree_bonus",
            order: 10,
            apply: large_tree_bonus,
        },
        BusinessRule {
            code: "high_risk_protocol",
            order: 20,
            apply: high_risk_protocol,
        },
        BusinessRule {
            code: "minimum_job_size",
            order: 30,
            apply: minimum_job_size,
        },
        BusinessRule {
            code: "crane_requirement",
            order: 40,
            apply: crane_requirement,
        },
        BusinessRule {
            code: "permit_alert",
            order: 50,
            apply: permit_alert,
        },
    ];

    rules.sort_by_key(|rule| rule.order);
    debug_assert!(
        rules
            .windows(2)
            .all(|pair| pair[0].order < pair[1].order && pair[0].code != pair[1].code),
        "rule table must be strictly ordered with distinct codes"
    );
    rules
}

/// Left fold of the full table over a freshly seeded accumulator.
pub(crate) fn run_rules(context: &RuleContext<'_>, base_cost: f64) -> RuleEffect {
    rule_table()
        .iter()
        .fold(RuleEffect::seeded(base_cost), |effect, rule| {
            (rule.apply)(context, effect)
        })
}

fn large_tree_bonus(context: &RuleContext<'_>, mut effect: RuleEffect) -> RuleEffect {
    if context.measurement.dbh_in >= LARGE_TREE_DBH_IN {
        effect.cost *= LARGE_TREE_MULTIPLIER;
        effect.applied_rules.push("Large Tree Bonus (+15%)".to_string());
    }
    effect
}

fn high_risk_protocol(context: &RuleContext<'_>, mut effect: RuleEffect) -> RuleEffect {
    if context.hazard_impact_percent >= HIGH_RISK_IMPACT_PERCENT {
        effect
            .risk_flags
            .push("supervisor review required".to_string());
        effect
            .risk_flags
            .push("site visit required before work begins".to_string());
        effect.charge_fee("Safety Equipment", SAFETY_EQUIPMENT_FEE);
        effect
            .applied_rules
            .push("High-Risk Safety Protocol (+$150 safety equipment)".to_string());
    }
    effect
}

fn minimum_job_size(_context: &RuleContext<'_>, mut effect: RuleEffect) -> RuleEffect {
    if effect.cost < MINIMUM_JOB_COST {
        effect.cost = MINIMUM_JOB_COST;
        effect
            .applied_rules
            .push("Minimum Job Size ($500 floor)".to_string());
    }
    effect
}

fn crane_requirement(context: &RuleContext<'_>, mut effect: RuleEffect) -> RuleEffect {
    let height_ft = context.measurement.height_ft;
    let tight_access = context.hazards.contains(HazardIndicator::LimitedAccess);

    if height_ft > CRANE_HEIGHT_FT || (height_ft > CRANE_ACCESS_HEIGHT_FT && tight_access) {
        effect.charge_fee("Crane Setup", CRANE_SETUP_FEE);
        let increased_score_cost = height_ft * (context.parameters.rate_per_point * CRANE_RATE_PREMIUM);
        effect.cost += increased_score_cost;
        effect
            .risk_flags
            .push("crane required: specialized operator needed".to_string());
        effect
            .applied_rules
            .push("Crane Requirement (+$800 setup, +25% rate on height)".to_string());
    }
    effect
}

fn permit_alert(context: &RuleContext<'_>, mut effect: RuleEffect) -> RuleEffect {
    if context.hazards.contains(HazardIndicator::Permitting) {
        effect.charge_fee("Permit Processing", PERMIT_PROCESSING_FEE);
        effect
            .risk_flags
            .push("permits required: 7-14 day timeline extension".to_string());
        effect
            .applied_rules
            .push("Permit Alert (+$150 processing)".to_string());
    }
    effect
}
