//! Shared entry point for request handlers and workers.
//!
//! [`TrackingEngine`] owns the injected collaborators (oracle, store, job
//! tracker, settings) and runs every oracle-bound step on the blocking pool
//! under the configured deadline.

use std::sync::Arc;
use tracing::{info, warn};

use super::job_tracker::{JobTracker, LogLevel};
use super::propagation::{
    distribute_batch, plan_element_update, propagate, run_blocking, DistributionReport,
    PropagationLimits,
};
use super::visibility_detector::find_visibility_window;
use crate::config::ServiceConfig;
use crate::db::DistributionRepository;
use crate::error::TrackingResult;
use crate::models::{
    OrbitalElements, PropagationRequest, SampleInstant, SamplePoint, VisibilityRequest,
    VisibilityWindow,
};
use crate::oracle::OrbitalOracle;

/// Samples of a synchronous propagation plus the job distributing them.
#[derive(Debug, Clone)]
pub struct PropagationOutcome {
    pub object_id: String,
    pub job_id: String,
    pub samples: Vec<SamplePoint>,
}

#[derive(Clone)]
pub struct TrackingEngine {
    oracle: Arc<dyn OrbitalOracle>,
    store: Arc<dyn DistributionRepository>,
    jobs: JobTracker,
    config: Arc<ServiceConfig>,
}

impl TrackingEngine {
    pub fn new(
        oracle: Arc<dyn OrbitalOracle>,
        store: Arc<dyn DistributionRepository>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            oracle,
            store,
            jobs: JobTracker::with_settings(&config.jobs),
            config: Arc::new(config),
        }
    }

    pub fn store(&self) -> &Arc<dyn DistributionRepository> {
        &self.store
    }

    pub fn jobs(&self) -> &JobTracker {
        &self.jobs
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    fn limits(&self) -> PropagationLimits {
        PropagationLimits::from(&self.config.propagation)
    }

    /// Compute a request's samples without distributing them.
    pub async fn propagate(&self, request: PropagationRequest) -> TrackingResult<Vec<SamplePoint>> {
        let oracle = Arc::clone(&self.oracle);
        let limits = self.limits();
        run_blocking(limits.timeout, move || {
            propagate(oracle.as_ref(), &request, limits)
        })
        .await
    }

    /// Compute samples and hand their distribution to a background job.
    ///
    /// Returns once the samples exist. Persistence may still be in progress.
    pub async fn propagate_and_spawn(
        &self,
        request: PropagationRequest,
    ) -> TrackingResult<PropagationOutcome> {
        let object_id = request.object_id.clone();
        let samples = self.propagate(request).await?;
        let job_id = self.spawn_distribution(&object_id, samples.clone());
        Ok(PropagationOutcome {
            object_id,
            job_id,
            samples,
        })
    }

    /// Distribute `samples` in a tracked background task.
    pub fn spawn_distribution(&self, object_id: &str, samples: Vec<SamplePoint>) -> String {
        let job_id = self.jobs.create_job(object_id);
        self.jobs.log(
            &job_id,
            LogLevel::Info,
            format!("Distributing {} samples", samples.len()),
        );

        let store = Arc::clone(&self.store);
        let jobs = self.jobs.clone();
        let object_id = object_id.to_string();
        let task_job_id = job_id.clone();
        tokio::spawn(async move {
            let report = distribute_batch(store.as_ref(), &object_id, &samples).await;
            record_report(&jobs, &task_job_id, &report);
        });
        job_id
    }

    /// Handle one element update end to end: classify, sample, distribute.
    pub async fn process_element_update(
        &self,
        elements: OrbitalElements,
        start: SampleInstant,
    ) -> TrackingResult<DistributionReport> {
        let oracle = Arc::clone(&self.oracle);
        let limits = self.limits();
        let (object_id, samples) = run_blocking(limits.timeout, move || {
            let (plan, request) = plan_element_update(oracle.as_ref(), &elements, start)?;
            info!(
                object_id = %request.object_id,
                regime = %plan.regime,
                duration_minutes = plan.duration_minutes,
                interval_seconds = plan.interval_seconds(),
                "propagating element update"
            );
            let samples = propagate(oracle.as_ref(), &request, limits)?;
            Ok((request.object_id, samples))
        })
        .await?;

        Ok(distribute_batch(self.store.as_ref(), &object_id, &samples).await)
    }

    /// First completed pass for one request, or `None`.
    pub async fn find_window(
        &self,
        request: VisibilityRequest,
    ) -> TrackingResult<Option<VisibilityWindow>> {
        let oracle = Arc::clone(&self.oracle);
        let limits = self.limits();
        run_blocking(limits.timeout, move || {
            find_visibility_window(oracle.as_ref(), &request, limits)
        })
        .await
    }

    /// Scan every entry of a batch and store the completed windows under
    /// `requester_id`, replacing earlier results. Entries that fail are
    /// logged and skipped. Returns the number of windows stored.
    pub async fn process_visibility_batch(
        &self,
        requester_id: &str,
        requests: Vec<VisibilityRequest>,
    ) -> TrackingResult<usize> {
        let mut windows = Vec::new();
        for request in requests {
            let object_id = request.object_id.clone();
            match self.find_window(request).await {
                Ok(Some(window)) => windows.push(window),
                Ok(None) => {}
                Err(e) => warn!(requester_id, object_id = %object_id, error = %e, "visibility scan failed"),
            }
        }

        let stored = windows.len();
        self.store
            .store_visibility_results(requester_id, windows)
            .await?;
        info!(requester_id, windows = stored, "stored visibility results");
        Ok(stored)
    }
}

fn record_report(jobs: &JobTracker, job_id: &str, report: &DistributionReport) {
    let result = serde_json::to_value(report).ok();
    if report.persisted == 0 && report.count > 0 {
        jobs.fail_job(
            job_id,
            format!(
                "No samples stored: {}",
                report.failures.first().map(String::as_str).unwrap_or("unknown error")
            ),
        );
        return;
    }
    if report.is_complete() {
        jobs.log(
            job_id,
            LogLevel::Success,
            format!("Stored and published {} samples", report.persisted),
        );
    } else {
        jobs.log(
            job_id,
            LogLevel::Warning,
            format!("{} distribution failures", report.failures.len()),
        );
    }
    jobs.complete_job(job_id, result);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::LocalRepository;
    use crate::error::TrackingError;
    use crate::models::{ObserverLocation, Subpoint};
    use crate::services::job_tracker::JobStatus;
    use std::time::Duration;

    struct FlatOracle;

    impl OrbitalOracle for FlatOracle {
        fn subpoint_at(&self, _: &OrbitalElements, _: SampleInstant) -> TrackingResult<Subpoint> {
            Ok(Subpoint {
                latitude: 10.0,
                longitude: 20.0,
                altitude_km: 35_786.0,
            })
        }

        fn elevation_at(
            &self,
            elements: &OrbitalElements,
            _: &ObserverLocation,
            _: SampleInstant,
        ) -> TrackingResult<f64> {
            if elements.id == "broken" {
                return Err(TrackingError::oracle("broken", "bad elements"));
            }
            Ok(45.0)
        }
    }

    fn engine() -> (TrackingEngine, LocalRepository) {
        let store = LocalRepository::default();
        let engine = TrackingEngine::new(
            Arc::new(FlatOracle),
            Arc::new(store.clone()),
            ServiceConfig::default(),
        );
        (engine, store)
    }

    fn epoch() -> SampleInstant {
        SampleInstant::parse("2024-06-01T00:00:00Z").unwrap()
    }

    async fn wait_for_job(engine: &TrackingEngine, job_id: &str) -> JobStatus {
        for _ in 0..100 {
            let status = engine.jobs().get_job(job_id).unwrap().status;
            if status != JobStatus::Running {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        JobStatus::Running
    }

    #[tokio::test]
    async fn test_geo_element_update_uses_sparse_plan() {
        let (engine, store) = engine();
        let elements = OrbitalElements::new("geo-1", "1 1", "2 2").unwrap();
        let report = engine.process_element_update(elements, epoch()).await.unwrap();

        // 1440 min / 10 samples -> 8640 s cadence, 11 instants
        assert_eq!(report.count, 11);
        assert_eq!(store.sample_count("geo-1").await.unwrap(), 11);
    }

    #[tokio::test]
    async fn test_spawned_distribution_completes() {
        let (engine, store) = engine();
        let elements = OrbitalElements::new("sat", "1 1", "2 2").unwrap();
        let outcome = engine
            .propagate_and_spawn(PropagationRequest::new(elements, epoch()))
            .await
            .unwrap();
        assert_eq!(outcome.samples.len(), 361);

        assert_eq!(wait_for_job(&engine, &outcome.job_id).await, JobStatus::Completed);
        assert_eq!(store.sample_count("sat").await.unwrap(), 361);
    }

    #[tokio::test]
    async fn test_job_fails_when_nothing_is_stored() {
        let (engine, store) = engine();
        store.set_healthy(false);
        let sample = SamplePoint {
            object_id: "sat".into(),
            timestamp: epoch(),
            latitude: 0.0,
            longitude: 0.0,
            altitude_km: 400.0,
        };
        let job_id = engine.spawn_distribution("sat", vec![sample]);
        assert_eq!(wait_for_job(&engine, &job_id).await, JobStatus::Failed);
    }

    #[tokio::test]
    async fn test_visibility_batch_skips_failed_entries() {
        let (engine, store) = engine();
        let request = |id: &str| VisibilityRequest {
            object_id: id.into(),
            object_name: id.into(),
            elements: OrbitalElements::new(id, "1 1", "2 2").unwrap(),
            observer: ObserverLocation::new(0.0, 0.0, 0.0),
            start_time: epoch(),
            end_time: epoch().plus_seconds(60),
            interval_seconds: 10,
            requester_id: "alice".into(),
        };

        // always above the horizon, so the pass never completes
        let stored = engine
            .process_visibility_batch("alice", vec![request("ok"), request("broken")])
            .await
            .unwrap();
        assert_eq!(stored, 0);
        assert_eq!(
            store.fetch_visibility_results("alice").await.unwrap(),
            Some(vec![])
        );
    }
}
