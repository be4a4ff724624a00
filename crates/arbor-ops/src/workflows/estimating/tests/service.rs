use std::sync::Arc;

use super::common::*;
use crate::workflows::estimating::domain::{CostParameters, HazardIndicator, JobId, TreeId};
use crate::workflows::estimating::intake::IntakeViolation;
use crate::workflows::estimating::repository::{JobEstimateRepository, RepositoryError};
use crate::workflows::estimating::service::{EstimatingService, EstimatingServiceError};

fn job_id(suffix: &str) -> JobId {
    JobId(format!("job-{suffix}"))
}

fn tree_id(suffix: &str) -> TreeId {
    TreeId(format!("tree-{suffix}"))
}

#[test]
fn attaching_the_same_tree_twice_keeps_one_entry() {
    let (service, _, _) = build_service();
    let job = job_id("idempotent");
    service
        .open_job(job.clone(), assessment_date())
        .expect("job opens");

    let submission = submission_for(&tall_oak(), &[]);
    service
        .attach_to_job(&job, tree_id("1"), submission.clone(), assessment_date())
        .expect("first attach");
    let record = service
        .attach_to_job(&job, tree_id("1"), submission, assessment_date())
        .expect("second attach");

    assert_eq!(record.trees.len(), 1);
    let attachment = record.trees.get(&tree_id("1")).expect("entry present");
    assert_eq!(record.total_estimate, attachment.result.total_cost);
}

#[test]
fn reassessment_replaces_the_entry_and_recomputes_the_total() {
    let (service, _, _) = build_service();
    let job = job_id("recompute");
    service
        .open_job(job.clone(), assessment_date())
        .expect("job opens");

    service
        .attach_to_job(
            &job,
            tree_id("oak"),
            submission_for(&tall_oak(), &[]),
            assessment_date(),
        )
        .expect("attach oak");
    let first = service
        .attach_to_job(
            &job,
            tree_id("sapling"),
            submission_for(&sapling(), &[]),
            assessment_date(),
        )
        .expect("attach sapling");

    assert_eq!(first.trees.len(), 2);
    assert_eq!(first.total_estimate, 16_685.0 + 500.0);

    // Re-survey the oak with hazards present; the total reflects the
    // replacement, not an accumulation.
    let updated = service
        .attach_to_job(
            &job,
            tree_id("oak"),
            submission_for(&tall_oak(), &[HazardIndicator::Permitting]),
            assessment_date(),
        )
        .expect("reattach oak");

    assert_eq!(updated.trees.len(), 2);
    let oak = updated.trees.get(&tree_id("oak")).expect("oak present");
    let small = updated
        .trees
        .get(&tree_id("sapling"))
        .expect("sapling present");
    assert_eq!(
        updated.total_estimate,
        oak.result.total_cost + small.result.total_cost
    );
    assert!(oak.result.total_cost > 16_685.0);
}

#[test]
fn attach_to_missing_job_fails_loudly_and_writes_nothing() {
    let (service, repository, alerts) = build_service();
    let missing = job_id("missing");

    let error = service
        .attach_to_job(
            &missing,
            tree_id("1"),
            submission_for(&tall_oak(), &[]),
            assessment_date(),
        )
        .expect_err("missing parent rejected");

    assert!(matches!(
        error,
        EstimatingServiceError::Repository(RepositoryError::NotFound)
    ));
    assert!(repository.fetch(&missing).expect("fetch").is_none());
    assert!(alerts.events().is_empty());
}

#[test]
fn opening_the_same_job_twice_conflicts() {
    let (service, _, _) = build_service();
    let job = job_id("conflict");
    service
        .open_job(job.clone(), assessment_date())
        .expect("first open");

    let error = service
        .open_job(job, assessment_date())
        .expect_err("second open rejected");
    assert!(matches!(
        error,
        EstimatingServiceError::Repository(RepositoryError::Conflict)
    ));
}

#[test]
fn risky_attachment_dispatches_a_crew_alert() {
    let (service, _, alerts) = build_service();
    let job = job_id("alerts");
    service
        .open_job(job.clone(), assessment_date())
        .expect("job opens");

    // Clear-site sapling: no flags, no alert.
    service
        .attach_to_job(
            &job,
            tree_id("quiet"),
            submission_for(&sapling(), &[]),
            assessment_date(),
        )
        .expect("attach quiet tree");
    assert!(alerts.events().is_empty());

    service
        .attach_to_job(
            &job,
            tree_id("loud"),
            submission_for(
                &measurement(30.0, 10.0, 12.0),
                &[
                    HazardIndicator::Permitting,
                    HazardIndicator::Utilities,
                    HazardIndicator::OverheadLines,
                ],
            ),
            assessment_date(),
        )
        .expect("attach risky tree");

    let events = alerts.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].template, "high_risk_assessment");
    assert_eq!(events[0].tree_id, tree_id("loud"));
    assert!(events[0]
        .details
        .get("risk_flags")
        .expect("flags recorded")
        .contains("supervisor review required"));
}

#[test]
fn intake_rejects_bad_geometry_before_the_engine_runs() {
    let (service, _, _) = build_service();

    let mut bad = submission_for(&tall_oak(), &[]);
    bad.height_ft = 0.0;
    let error = service.assess(bad).expect_err("zero height rejected");
    assert!(matches!(
        error,
        EstimatingServiceError::Intake(IntakeViolation::NonPositiveHeight(_))
    ));

    let mut bad = submission_for(&tall_oak(), &[]);
    bad.dbh_in = f64::NAN;
    let error = service.assess(bad).expect_err("nan rejected");
    assert!(matches!(
        error,
        EstimatingServiceError::Intake(IntakeViolation::NonFiniteMeasurement { field: "dbh_in" })
    ));
}

#[test]
fn per_call_pricing_override_beats_the_configured_default() {
    let (service, _, _) = build_service();

    let mut submission = submission_for(&measurement(30.0, 10.0, 12.0), &[]);
    submission.parameters = Some(CostParameters {
        setup_cost: 100.0,
        rate_per_point: 1.0,
        profit_multiplier: 2.0,
    });

    let result = service.assess(submission).expect("assessment succeeds");
    // base score 600 -> (100 + 600) * 2
    assert_eq!(result.total_cost, 1_400.0);
    assert_eq!(result.breakdown.setup_cost, 100.0);

    // Omitting the override falls back to the configured default pricing.
    let default_result = service
        .assess(submission_for(&measurement(30.0, 10.0, 12.0), &[]))
        .expect("assessment succeeds");
    assert_eq!(default_result.breakdown.setup_cost, 200.0);
}

#[test]
fn repository_outages_surface_to_the_caller() {
    let service = EstimatingService::new(
        Arc::new(UnavailableRepository),
        Arc::new(MemoryAlerts::default()),
        CostParameters::STANDARD,
    );

    let error = service
        .open_job(job_id("down"), assessment_date())
        .expect_err("outage surfaces");
    assert!(matches!(
        error,
        EstimatingServiceError::Repository(RepositoryError::Unavailable(_))
    ));
}

#[test]
fn concurrent_attachments_to_one_job_both_land() {
    let (service, _, _) = build_service();
    let service = Arc::new(service);
    let job = job_id("parallel");
    service
        .open_job(job.clone(), assessment_date())
        .expect("job opens");

    let handles: Vec<_> = (0..8)
        .map(|n| {
            let service = service.clone();
            let job = job.clone();
            std::thread::spawn(move || {
                service
                    .attach_to_job(
                        &job,
                        TreeId(format!("tree-{n}")),
                        submission_for(&sapling(), &[]),
                        assessment_date(),
                    )
                    .expect("attach succeeds")
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("thread completes");
    }

    let record = service.job(&job).expect("job present");
    assert_eq!(record.trees.len(), 8);
    assert_eq!(record.total_estimate, 8.0 * 500.0);
}
