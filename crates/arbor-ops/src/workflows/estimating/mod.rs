//! Tree assessment, pricing, and job-level estimate aggregation.
//!
//! The pipeline runs strictly top to bottom: validated measurement and hazard
//! inputs feed the score composer, the composed score feeds the base cost,
//! the base cost seeds the ordered business-rule pass, and the assembler
//! rounds the outcome into the published result. Everything up to the job
//! repository is pure and synchronous.

pub mod domain;
mod engine;
mod intake;
pub mod repository;
pub mod router;
mod rules;
mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    CostParameters, HazardIndicator, HazardIndicatorSet, JobId, SizeCategory, TreeId,
    TreeMeasurement,
};
pub use engine::{AssessmentEngine, AssessmentResult, CostBreakdown, QuickEstimate};
pub use intake::{AssessmentSubmission, IntakeGuard, IntakeViolation, QuickEstimateSubmission};
pub use repository::{
    AlertError, AlertPublisher, AssessmentAttachment, AttachmentView, CrewSafetyAlert,
    JobEstimateRecord, JobEstimateRepository, JobEstimateView, RepositoryError,
};
pub use router::estimating_router;
pub use rules::RuleEffect;
pub use scoring::TreeScore;
pub use service::{EstimatingService, EstimatingServiceError};
