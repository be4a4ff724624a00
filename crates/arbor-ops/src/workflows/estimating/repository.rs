use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{HazardIndicatorSet, JobId, TreeId, TreeMeasurement};
use super::engine::AssessmentResult;

/// One tree's assessment as stored on a parent job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentAttachment {
    pub tree_id: TreeId,
    pub measurement: TreeMeasurement,
    pub hazards: HazardIndicatorSet,
    pub result: AssessmentResult,
    pub assessed_on: NaiveDate,
}

/// Parent job record aggregating per-tree assessments.
///
/// `trees` is keyed by tree identifier, so a tree appears at most once and
/// re-assessment is an upsert. `total_estimate` is always derived by summing
/// the current collection, never adjusted incrementally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobEstimateRecord {
    pub job_id: JobId,
    pub opened_on: NaiveDate,
    pub trees: BTreeMap<TreeId, AssessmentAttachment>,
    pub total_estimate: f64,
}

impl JobEstimateRecord {
    pub fn open(job_id: JobId, opened_on: NaiveDate) -> Self {
        Self {
            job_id,
            opened_on,
            trees: BTreeMap::new(),
            total_estimate: 0.0,
        }
    }

    /// Replace-by-key then recompute the total over the resulting collection.
    pub fn attach(&mut self, attachment: AssessmentAttachment) {
        self.trees.insert(attachment.tree_id.clone(), attachment);
        self.recompute_total();
    }

    pub fn recompute_total(&mut self) {
        self.total_estimate = self
            .trees
            .values()
            .map(|attachment| attachment.result.total_cost)
            .sum();
    }

    pub fn summary_view(&self) -> JobEstimateView {
        JobEstimateView {
            job_id: self.job_id.clone(),
            opened_on: self.opened_on,
            tree_count: self.trees.len(),
            total_estimate: self.total_estimate,
            trees: self.trees.values().map(AssessmentAttachment::view).collect(),
        }
    }
}

impl AssessmentAttachment {
    pub fn view(&self) -> AttachmentView {
        AttachmentView {
            tree_id: self.tree_id.clone(),
            species: self.measurement.species.clone(),
            final_score: self.result.final_score,
            total_cost: self.result.total_cost,
            risk_flags: self.result.risk_flags.clone(),
            assessed_on: self.assessed_on,
        }
    }
}

/// Sanitized job summary exposed through the API.
#[derive(Debug, Clone, Serialize)]
pub struct JobEstimateView {
    pub job_id: JobId,
    pub opened_on: NaiveDate,
    pub tree_count: usize,
    pub total_estimate: f64,
    pub trees: Vec<AttachmentView>,
}

/// Per-tree line in the job summary.
#[derive(Debug, Clone, Serialize)]
pub struct AttachmentView {
    pub tree_id: TreeId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub species: Option<String>,
    pub final_score: f64,
    pub total_cost: f64,
    pub risk_flags: Vec<String>,
    pub assessed_on: NaiveDate,
}

/// Storage abstraction so the service module can be exercised in isolation.
///
/// `attach` must apply replace-by-key plus total recompute as a single atomic
/// update per job record: implementations hold whatever lock or transaction
/// they use across both steps, so concurrent attachments of different trees
/// to the same job cannot drop an update. Attaching to a missing job returns
/// `RepositoryError::NotFound` and writes nothing.
pub trait JobEstimateRepository: Send + Sync {
    fn create(&self, record: JobEstimateRecord) -> Result<JobEstimateRecord, RepositoryError>;
    fn attach(
        &self,
        job_id: &JobId,
        attachment: AssessmentAttachment,
    ) -> Result<JobEstimateRecord, RepositoryError>;
    fn fetch(&self, job_id: &JobId) -> Result<Option<JobEstimateRecord>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("job already exists")]
    Conflict,
    #[error("job not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Trait describing outbound crew-alert hooks (dispatch board, SMS bridge).
pub trait AlertPublisher: Send + Sync {
    fn publish(&self, alert: CrewSafetyAlert) -> Result<(), AlertError>;
}

/// Alert payload raised when an attached assessment carries risk flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrewSafetyAlert {
    pub template: String,
    pub job_id: JobId,
    pub tree_id: TreeId,
    pub details: BTreeMap<String, String>,
}

/// Alert dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("alert transport unavailable: {0}")]
    Transport(String),
}
