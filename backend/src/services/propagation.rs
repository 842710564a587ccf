//! Ground-track sampling and batch distribution.
//!
//! [`propagate`] turns a request into an ordered sample batch by walking the
//! request's [`TimeSampler`] grid through the oracle. [`distribute_batch`]
//! writes the batch through a [`DistributionRepository`]: every sample is
//! stored and published independently, then one summary closes the batch.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::regime::{classify_altitude, SamplingPlan};
use super::sampler::TimeSampler;
use crate::config::PropagationSettings;
use crate::db::DistributionRepository;
use crate::error::{TrackingError, TrackingResult};
use crate::models::{BatchSummary, OrbitalElements, PropagationRequest, SampleInstant, SamplePoint};
use crate::oracle::OrbitalOracle;

/// Bounds applied to a single propagation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PropagationLimits {
    /// Reject requests producing more samples than this.
    pub max_samples: Option<u64>,
    /// Stop sampling once this much wall time has passed.
    pub timeout: Option<Duration>,
}

impl PropagationLimits {
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Reject a grid longer than `max_samples`.
    pub fn check_len(&self, len: u64) -> TrackingResult<()> {
        match self.max_samples {
            Some(max) if len > max => Err(TrackingError::validation(format!(
                "request yields {} samples, limit is {}",
                len, max
            ))),
            _ => Ok(()),
        }
    }

    /// Start the wall-clock budget for one run.
    pub fn deadline(&self) -> Deadline {
        Deadline {
            started: Instant::now(),
            limit: self.timeout,
        }
    }
}

/// Wall-clock budget of one oracle-bound loop, checked once per sample.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    limit: Option<Duration>,
}

impl Deadline {
    pub fn check(&self) -> TrackingResult<()> {
        match self.limit {
            Some(limit) if self.started.elapsed() > limit => {
                Err(TrackingError::Timeout(limit.as_secs()))
            }
            _ => Ok(()),
        }
    }
}

impl From<&PropagationSettings> for PropagationLimits {
    fn from(settings: &PropagationSettings) -> Self {
        Self {
            max_samples: (settings.max_samples > 0).then_some(settings.max_samples),
            timeout: settings.timeout(),
        }
    }
}

/// Outcome of writing one batch through the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionReport {
    pub object_id: String,
    pub count: usize,
    pub persisted: usize,
    pub published: usize,
    pub summary_published: bool,
    pub failures: Vec<String>,
}

impl DistributionReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Sample the request's ground track.
///
/// The whole request is validated before the oracle is first called. Any
/// oracle failure aborts the run; no partial batch is returned.
pub fn propagate(
    oracle: &dyn OrbitalOracle,
    request: &PropagationRequest,
    limits: PropagationLimits,
) -> TrackingResult<Vec<SamplePoint>> {
    request.validate()?;
    let sampler = TimeSampler::new(
        request.start_time,
        request.duration_minutes,
        request.interval_seconds,
    )?;
    limits.check_len(sampler.len())?;

    let deadline = limits.deadline();
    let mut samples = Vec::with_capacity(sampler.len() as usize);
    for instant in &sampler {
        deadline.check()?;
        let subpoint = oracle.subpoint_at(&request.elements, instant)?;
        samples.push(SamplePoint::from_subpoint(
            request.object_id.clone(),
            instant,
            subpoint,
        ));
    }

    debug!(
        object_id = %request.object_id,
        count = samples.len(),
        "propagation finished"
    );
    Ok(samples)
}

/// Build the regime-adapted request for an element update.
///
/// The altitude at `start` selects the sampling plan.
pub fn plan_element_update(
    oracle: &dyn OrbitalOracle,
    elements: &OrbitalElements,
    start: SampleInstant,
) -> TrackingResult<(SamplingPlan, PropagationRequest)> {
    elements.validate()?;
    let altitude_km = oracle.subpoint_at(elements, start)?.altitude_km;
    let plan = classify_altitude(altitude_km);
    debug!(
        object_id = %elements.id,
        altitude_km,
        regime = %plan.regime,
        "classified element update"
    );
    let request = PropagationRequest::new(elements.clone(), start)
        .with_duration_minutes(plan.duration_minutes)
        .with_interval_seconds(plan.interval_seconds());
    Ok((plan, request))
}

/// Store and publish a batch, then publish its summary.
///
/// Store and publish failures are recorded per sample and never undo one
/// another. The summary is sent once, after every sample was attempted.
pub async fn distribute_batch(
    store: &dyn DistributionRepository,
    object_id: &str,
    samples: &[SamplePoint],
) -> DistributionReport {
    let mut report = DistributionReport {
        object_id: object_id.to_string(),
        count: samples.len(),
        ..Default::default()
    };

    for sample in samples {
        match store.put_sample(object_id, sample).await {
            Ok(()) => report.persisted += 1,
            Err(e) => {
                warn!(object_id, timestamp = %sample.timestamp, error = %e, "failed to store sample");
                report.failures.push(e.to_string());
            }
        }
        match store.publish_sample(sample).await {
            Ok(_) => report.published += 1,
            Err(e) => {
                warn!(object_id, timestamp = %sample.timestamp, error = %e, "failed to publish sample");
                report.failures.push(e.to_string());
            }
        }
    }

    let summary = BatchSummary::new(
        object_id,
        samples.first().map(|s| s.timestamp),
        samples.last().map(|s| s.timestamp),
        samples.len(),
    );
    match store.publish_batch_summary(&summary).await {
        Ok(_) => report.summary_published = true,
        Err(e) => {
            warn!(object_id, error = %e, "failed to publish batch summary");
            report.failures.push(e.to_string());
        }
    }

    info!(
        object_id,
        count = report.count,
        persisted = report.persisted,
        published = report.published,
        failures = report.failures.len(),
        "batch distributed"
    );
    report
}

/// Run oracle-bound work on the blocking pool, bounded by `timeout`.
///
/// On expiry the caller gets [`TrackingError::Timeout`] right away. The
/// blocking work keeps running until it next checks its own [`Deadline`],
/// so every oracle loop passed in here must check one per sample.
pub async fn run_blocking<T, F>(timeout: Option<Duration>, work: F) -> TrackingResult<T>
where
    F: FnOnce() -> TrackingResult<T> + Send + 'static,
    T: Send + 'static,
{
    let handle = tokio::task::spawn_blocking(work);
    let joined = match timeout {
        Some(limit) => tokio::time::timeout(limit, handle)
            .await
            .map_err(|_| TrackingError::Timeout(limit.as_secs()))?,
        None => handle.await,
    };
    joined.map_err(|e| TrackingError::Internal(format!("background task failed: {}", e)))?
}
