use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use arbor_ops::config::AppConfig;
use arbor_ops::workflows::estimating::{
    AlertError, AlertPublisher, AssessmentAttachment, CostParameters, CrewSafetyAlert,
    JobEstimateRecord, JobEstimateRepository, JobId, RepositoryError,
};
use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryJobRepository {
    records: Arc<Mutex<HashMap<JobId, JobEstimateRecord>>>,
}

impl JobEstimateRepository for InMemoryJobRepository {
    fn create(&self, record: JobEstimateRecord) -> Result<JobEstimateRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.job_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.job_id.clone(), record.clone());
        Ok(record)
    }

    // Upsert and recompute happen under one lock so concurrent attachments
    // to the same job cannot drop an update.
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
pub(crate) struct InMemoryAlertPublisher {
    events: Arc<Mutex<Vec<CrewSafetyAlert>>>,
}

impl AlertPublisher for InMemoryAlertPublisher {
    fn publish(&self, alert: CrewSafetyAlert) -> Result<(), AlertError> {
        let mut guard = self.events.lock().expect("alert mutex poisoned");
        guard.push(alert);
        Ok(())
    }
}

impl InMemoryAlertPublisher {
    pub(crate) fn events(&self) -> Vec<CrewSafetyAlert> {
        self.events.lock().expect("alert mutex poisoned").clone()
    }
}

pub(crate) fn cost_parameters(config: &AppConfig) -> CostParameters {
    config.pricing.cost_parameters()
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_ops::workflows::estimating::{
        AssessmentSubmission, EstimatingService, TreeId,
    };
    use std::collections::BTreeMap;

    fn service() -> (
        EstimatingService<InMemoryJobRepository, InMemoryAlertPublisher>,
        Arc<InMemoryJobRepository>,
        Arc<InMemoryAlertPublisher>,
    ) {
        let repository = Arc::new(InMemoryJobRepository::default());
        let alerts = Arc::new(InMemoryAlertPublisher::default());
        let service = EstimatingService::new(
            repository.clone(),
            alerts.clone(),
            CostParameters::STANDARD,
        );
        (service, repository, alerts)
    }

    fn submission() -> AssessmentSubmission {
        AssessmentSubmission {
            height_ft: 45.0,
            canopy_radius_ft: 15.0,
            dbh_in: 20.0,
            species: Some("Silver Maple".to_string()),
            hazards: BTreeMap::new(),
            parameters: None,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, 2).expect("valid date")
    }

    #[test]
    fn attach_requires_existing_job() {
        let (service, repository, _) = service();
        let missing = JobId("job-missing".to_string());

        let error = service
            .attach_to_job(&missing, TreeId("T-1".to_string()), submission(), date())
            .expect_err("missing job rejected");
        assert!(error.to_string().contains("not found"));
        assert!(repository.fetch(&missing).expect("fetch").is_none());
    }

    #[test]
    fn attach_upserts_by_tree_id() {
        let (service, _, _) = service();
        let job_id = JobId("job-1".to_string());
        service
            .open_job(job_id.clone(), date())
            .expect("job opens");

        service
            .attach_to_job(&job_id, TreeId("T-1".to_string()), submission(), date())
            .expect("first attach");
        let record = service
            .attach_to_job(&job_id, TreeId("T-1".to_string()), submission(), date())
            .expect("second attach");

        assert_eq!(record.trees.len(), 1);
        let only = record.trees.values().next().expect("attachment present");
        assert_eq!(record.total_estimate, only.result.total_cost);
    }

    #[test]
    fn parse_date_accepts_iso_dates() {
        assert_eq!(parse_date(" 2026-04-02 "), Ok(date()));
        assert!(parse_date("04/02/2026").is_err());
    }
}
