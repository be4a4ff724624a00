use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;

use super::domain::{CostParameters, HazardIndicatorSet, JobId, TreeId, TreeMeasurement};
use super::engine::{AssessmentEngine, AssessmentResult, QuickEstimate};
use super::intake::{AssessmentSubmission, IntakeGuard, IntakeViolation, QuickEstimateSubmission};
use super::repository::{
    AlertError, AlertPublisher, AssessmentAttachment, CrewSafetyAlert, JobEstimateRecord,
    JobEstimateRepository, RepositoryError,
};
use crate::workflows::inventory::InventoryEntry;

/// Service composing the intake guard, assessment engine, job repository, and
/// crew alerting.
pub struct EstimatingService<R, A> {
    guard: IntakeGuard,
    engine: Arc<AssessmentEngine>,
    repository: Arc<R>,
    alerts: Arc<A>,
}

impl<R, A> EstimatingService<R, A>
where
    R: JobEstimateRepository + 'static,
    A: AlertPublisher + 'static,
{
    pub fn new(repository: Arc<R>, alerts: Arc<A>, parameters: CostParameters) -> Self {
        Self {
            guard: IntakeGuard,
            engine: Arc::new(AssessmentEngine::new(parameters)),
            repository,
            alerts,
        }
    }

    /// Compute a full assessment without touching storage.
    pub fn assess(
        &self,
        submission: AssessmentSubmission,
    ) -> Result<AssessmentResult, EstimatingServiceError> {
        let overrides = submission.parameters;
        let (measurement, hazards) = self.guard.measurement_from_submission(submission)?;
        Ok(self.assess_validated(&measurement, &hazards, overrides))
    }

    /// Run the engine with the caller's pricing override when one was
    /// supplied, otherwise with the service's configured parameters.
    fn assess_validated(
        &self,
        measurement: &TreeMeasurement,
        hazards: &HazardIndicatorSet,
        overrides: Option<CostParameters>,
    ) -> AssessmentResult {
        match overrides {
            Some(parameters) => AssessmentEngine::new(parameters).assess(measurement, hazards),
            None => self.engine.assess(measurement, hazards),
        }
    }

    /// Instant ballpark from geometry alone.
    pub fn quick_estimate(
        &self,
        submission: QuickEstimateSubmission,
    ) -> Result<QuickEstimate, EstimatingServiceError> {
        let measurement = self.guard.measurement_from_quick(submission)?;
        Ok(self.engine.quick_estimate(&measurement))
    }

    /// Create an empty job estimate to attach trees onto.
    pub fn open_job(
        &self,
        job_id: JobId,
        opened_on: NaiveDate,
    ) -> Result<JobEstimateRecord, EstimatingServiceError> {
        let record = JobEstimateRecord::open(job_id, opened_on);
        let stored = self.repository.create(record)?;
        Ok(stored)
    }

    /// Assess one tree and attach the result to its parent job. The
    /// repository applies the upsert-plus-recompute atomically; when the
    /// stored assessment carries risk flags a crew safety alert goes out.
    pub fn attach_to_job(
        &self,
        job_id: &JobId,
        tree_id: TreeId,
        submission: AssessmentSubmission,
        assessed_on: NaiveDate,
    ) -> Result<JobEstimateRecord, EstimatingServiceError> {
        let overrides = submission.parameters;
        let (measurement, hazards) = self.guard.measurement_from_submission(submission)?;
        let result = self.assess_validated(&measurement, &hazards, overrides);

        let attachment = AssessmentAttachment {
            tree_id: tree_id.clone(),
            measurement,
            hazards,
            result: result.clone(),
            assessed_on,
        };
        let record = self.repository.attach(job_id, attachment)?;

        if !result.risk_flags.is_empty() {
            let mut details = BTreeMap::new();
            details.insert("risk_flags".to_string(), result.risk_flags.join("; "));
            details.insert("total_cost".to_string(), format!("{:.0}", result.total_cost));
            self.alerts.publish(CrewSafetyAlert {
                template: "high_risk_assessment".to_string(),
                job_id: job_id.clone(),
                tree_id,
                details,
            })?;
        }

        Ok(record)
    }

    /// Attach every entry of an imported tree inventory to a job, in file
    /// order. Rows sharing a tree identifier collapse onto one attachment via
    /// the normal upsert semantics.
    pub fn attach_inventory(
        &self,
        job_id: &JobId,
        entries: Vec<InventoryEntry>,
        assessed_on: NaiveDate,
    ) -> Result<JobEstimateRecord, EstimatingServiceError> {
        let mut record = self.repository.fetch(job_id)?.ok_or(RepositoryError::NotFound)?;

        for entry in entries {
            record = self.attach_to_job(job_id, entry.tree_id, entry.submission, assessed_on)?;
        }

        Ok(record)
    }

    /// Fetch a job estimate for API responses.
    pub fn job(&self, job_id: &JobId) -> Result<JobEstimateRecord, EstimatingServiceError> {
        let record = self
            .repository
            .fetch(job_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }
}

/// Error raised by the estimating service.
#[derive(Debug, thiserror::Error)]
pub enum EstimatingServiceError {
    #[error(transparent)]
    Intake(#[from] IntakeViolation),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Alert(#[from] AlertError),
}
