use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::workflows::estimating::domain::{
    CostParameters, HazardIndicator, HazardIndicatorSet, JobId, TreeMeasurement,
};
use crate::workflows::estimating::engine::AssessmentEngine;
use crate::workflows::estimating::intake::AssessmentSubmission;
use crate::workflows::estimating::repository::{
    AlertError, AlertPublisher, AssessmentAttachment, CrewSafetyAlert, JobEstimateRecord,
    JobEstimateRepository, RepositoryError,
};
use crate::workflows::estimating::service::EstimatingService;

pub(super) fn measurement(height_ft: f64, canopy_radius_ft: f64, dbh_in: f64) -> TreeMeasurement {
    TreeMeasurement {
        height_ft,
        canopy_radius_ft,
        dbh_in,
        species: None,
    }
}

/// The big removal from the pricing walkthrough: base score 12000.
pub(super) fn tall_oak() -> TreeMeasurement {
    TreeMeasurement {
        height_ft: 80.0,
        canopy_radius_ft: 25.0,
        dbh_in: 36.0,
        species: Some("Red Oak".to_string()),
    }
}

/// Small enough that the job floor kicks in: base score 50.
pub(super) fn sapling() -> TreeMeasurement {
    measurement(10.0, 5.0, 6.0)
}

pub(super) fn hazards(indicators: &[HazardIndicator]) -> HazardIndicatorSet {
    HazardIndicatorSet::with(indicators.iter().copied())
}

/// Permitting + utilities + overhead lines: 77% cumulative impact.
pub(super) fn permit_heavy_hazards() -> HazardIndicatorSet {
    hazards(&[
        HazardIndicator::Permitting,
        HazardIndicator::Utilities,
        HazardIndicator::OverheadLines,
    ])
}

pub(super) fn engine() -> AssessmentEngine {
    AssessmentEngine::with_defaults()
}

pub(super) fn submission_for(
    measurement: &TreeMeasurement,
    indicators: &[HazardIndicator],
) -> AssessmentSubmission {
    let mut flags = BTreeMap::new();
    for indicator in indicators {
        flags.insert(indicator.key().to_string(), true);
    }

    AssessmentSubmission {
        height_ft: measurement.height_ft,
        canopy_radius_ft: measurement.canopy_radius_ft,
        dbh_in: measurement.dbh_in,
        species: measurement.species.clone(),
        hazards: flags,
        parameters: None,
    }
}

pub(super) fn assessment_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 18).expect("valid date")
}

pub(super) fn build_service() -> (
    EstimatingService<MemoryJobRepository, MemoryAlerts>,
    Arc<MemoryJobRepository>,
    Arc<MemoryAlerts>,
) {
    let repository = Arc::new(MemoryJobRepository::default());
    let alerts = Arc::new(MemoryAlerts::default());
    let service =
        EstimatingService::new(repository.clone(), alerts.clone(), CostParameters::STANDARD);
    (service, repository, alerts)
}

#[derive(Default, Clone)]
pub(super) struct MemoryJobRepository {
    pub(super) records: Arc<Mutex<HashMap<JobId, JobEstimateRecord>>>,
}

impl JobEstimateRepository for MemoryJobRepository {
    fn create(&self, record: JobEstimateRecord) -> Result<JobEstimateRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.job_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.job_id.clone(), record.clone());
        Ok(record)
    }

    fn attach(
        &self,
        job_id: &JobId,
        attachment: AssessmentAttachment,
    ) -> Result<JobEstimateRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let record = guard.get_mut(job_id).ok_or(RepositoryError::NotFound)?;
        record.attach(attachment);
        Ok(record.clone())
    }

    fn fetch(&self, job_id: &JobId) -> Result<Option<JobEstimateRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(job_id).cloned())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryAlerts {
    events: Arc<Mutex<Vec<CrewSafetyAlert>>>,
}

impl MemoryAlerts {
    pub(super) fn events(&self) -> Vec<CrewSafetyAlert> {
        self.events.lock().expect("alert mutex poisoned").clone()
    }
}

impl AlertPublisher for MemoryAlerts {
    fn publish(&self, alert: CrewSafetyAlert) -> Result<(), AlertError> {
        self.events
            .lock()
            .expect("alert mutex poisoned")
            .push(alert);
        Ok(())
    }
}

pub(super) struct UnavailableRepository;

impl JobEstimateRepository for UnavailableRepository {
    fn create(&self, _record: JobEstimateRecord) -> Result<JobEstimateRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn attach(
        &self,
        _job_id: &JobId,
        _attachment: AssessmentAttachment,
    ) -> Result<JobEstimateRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _job_id: &JobId) -> Result<Option<JobEstimateRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
