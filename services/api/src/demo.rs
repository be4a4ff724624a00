use std::collections::BTreeMap;
use std::sync::Arc;

use arbor_ops::error::AppError;
use arbor_ops::workflows::estimating::{
    AssessmentResult, AssessmentSubmission, CostParameters, EstimatingService, JobEstimateRecord,
    JobId, QuickEstimateSubmission, TreeId,
};
use arbor_ops::workflows::inventory::TreeInventoryImporter;
use chrono::{Local, NaiveDate};
use clap::Args;

use crate::cli::{AssessArgs, BatchArgs, QuickArgs};
use crate::infra::{parse_date, InMemoryAlertPublisher, InMemoryJobRepository};

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Assessment date stamped on the demo attachments (defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) assessed_on: Option<NaiveDate>,
}

fn build_service() -> (
    EstimatingService<InMemoryJobRepository, InMemoryAlertPublisher>,
    Arc<InMemoryAlertPublisher>,
) {
    let repository = Arc::new(InMemoryJobRepository::default());
    let alerts = Arc::new(InMemoryAlertPublisher::default());
    let service = EstimatingService::new(repository, alerts.clone(), CostParameters::STANDARD);
    (service, alerts)
}

fn hazard_flags(names: &[String]) -> BTreeMap<String, bool> {
    names
        .iter()
        .map(|name| (name.trim().to_string(), true))
        .collect()
}

pub(crate) fn run_quick(args: QuickArgs) -> Result<(), AppError> {
    let (service, _) = build_service();

    let estimate = service.quick_estimate(QuickEstimateSubmission {
        height_ft: args.height_ft,
        canopy_radius_ft: args.canopy_radius_ft,
        dbh_in: args.dbh_in,
    })?;

    println!("Quick estimate");
    println!("- Base score: {}", estimate.base_score);
    println!("- Estimated cost: ${}", estimate.estimated_cost);
    println!("- Size category: {}", estimate.category.label());

    Ok(())
}

pub(crate) fn run_assess(args: AssessArgs) -> Result<(), AppError> {
    let (service, _) = build_service();

    let result = service.assess(AssessmentSubmission {
        height_ft: args.height_ft,
        canopy_radius_ft: args.canopy_radius_ft,
        dbh_in: args.dbh_in,
        species: args.species,
        hazards: hazard_flags(&args.hazards),
        parameters: None,
    })?;

    render_assessment(&result);
    Ok(())
}

pub(crate) fn run_batch(args: BatchArgs) -> Result<(), AppError> {
    let (service, alerts) = build_service();
    let assessed_on = args
        .assessed_on
        .unwrap_or_else(|| Local::now().date_naive());

    let entries = TreeInventoryImporter::from_path(&args.csv)?;
    let job_id = JobId(args.job_id);
    service.open_job(job_id.clone(), assessed_on)?;
    let record = service.attach_inventory(&job_id, entries, assessed_on)?;

    render_job(&record);
    render_alert_count(alerts.events().len());
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let assessed_on = args
        .assessed_on
        .unwrap_or_else(|| Local::now().date_naive());
    let (service, alerts) = build_service();

    println!("Estimating workflow demo (evaluated {assessed_on})");

    let quick = service.quick_estimate(QuickEstimateSubmission {
        height_ft: 45.0,
        canopy_radius_ft: 15.0,
        dbh_in: 18.0,
    })?;
    println!(
        "\nInstant quote for a walk-in call: score {}, ${} ({})",
        quick.base_score,
        quick.estimated_cost,
        quick.category.label()
    );

    let job_id = JobId("JOB-1042".to_string());
    service.open_job(job_id.clone(), assessed_on)?;

    service.attach_to_job(
        &job_id,
        TreeId("T-001".to_string()),
        AssessmentSubmission {
            height_ft: 80.0,
            canopy_radius_ft: 25.0,
            dbh_in: 36.0,
            species: Some("Red Oak".to_string()),
            hazards: BTreeMap::new(),
            parameters: None,
        },
        assessed_on,
    )?;

    service.attach_to_job(
        &job_id,
        TreeId("T-002".to_string()),
        AssessmentSubmission {
            height_ft: 10.0,
            canopy_radius_ft: 5.0,
            dbh_in: 6.0,
            species: Some("Serviceberry".to_string()),
            hazards: BTreeMap::new(),
            parameters: None,
        },
        assessed_on,
    )?;

    let record = service.attach_to_job(
        &job_id,
        TreeId("T-003".to_string()),
        AssessmentSubmission {
            height_ft: 55.0,
            canopy_radius_ft: 20.0,
            dbh_in: 22.0,
            species: Some("Silver Maple".to_string()),
            hazards: hazard_flags(&[
                "permitting".to_string(),
                "utilities".to_string(),
                "overhead_lines".to_string(),
            ]),
            parameters: None,
        },
        assessed_on,
    )?;

    render_job(&record);
    render_alert_count(alerts.events().len());

    Ok(())
}

fn render_assessment(result: &AssessmentResult) {
    println!("Assessment");
    println!("- Base score: {}", result.base_score);
    println!("- Hazard impact: {}%", result.hazard_impact_percent);
    println!("- Final score: {}", result.final_score);
    println!("- Total cost: ${}", result.total_cost);

    if result.applied_rules.is_empty() {
        println!("\nApplied rules: none");
    } else {
        println!("\nApplied rules");
        for rule in &result.applied_rules {
            println!("- {rule}");
        }
    }

    if result.risk_flags.is_empty() {
        println!("\nRisk flags: none");
    } else {
        println!("\nRisk flags");
        for flag in &result.risk_flags {
            println!("- {flag}");
        }
    }

    let breakdown = &result.breakdown;
    println!("\nCost breakdown");
    println!("- Setup: ${}", breakdown.setup_cost);
    println!("- Score cost: ${}", breakdown.score_cost);
    println!("- Subtotal: ${}", breakdown.subtotal);
    println!("- Markup: ${}", breakdown.markup);
    for (name, amount) in &breakdown.additional_fees {
        println!("- {name}: ${amount}");
    }
    println!("- Final: ${}", breakdown.final_cost);
}

fn render_job(record: &JobEstimateRecord) {
    println!(
        "\nJob {} ({} tree(s), opened {})",
        record.job_id.0,
        record.trees.len(),
        record.opened_on
    );
    for attachment in record.trees.values() {
        let species = attachment
            .measurement
            .species
            .as_deref()
            .unwrap_or("unidentified");
        println!(
            "- {} | {} | score {} | ${}",
            attachment.tree_id.0,
            species,
            attachment.result.final_score,
            attachment.result.total_cost
        );
        for flag in &attachment.result.risk_flags {
            println!("    flag: {flag}");
        }
    }
    println!("Total estimate: ${}", record.total_estimate);
}

fn render_alert_count(count: usize) {
    if count == 0 {
        println!("\nCrew safety alerts: none");
    } else {
        println!("\nCrew safety alerts dispatched: {count}");
    }
}
