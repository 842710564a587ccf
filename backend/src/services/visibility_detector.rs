//! Horizon-crossing detection.
//!
//! A scan walks a strictly increasing grid of instants, asks the oracle for
//! the object's elevation at each one and runs a two-state machine:
//!
//! ```text
//!   NotVisible --(elevation > horizon)--> Visible   [record AOS]
//!   Visible    --(elevation <= horizon)-> done      [record LOS]
//! ```
//!
//! Only the first pass in the range is reported and the scan stops at LOS.
//! A pass still in progress when the range ends is incomplete and yields
//! no window.

use tracing::debug;

use super::propagation::PropagationLimits;
use super::sampler::TimeSampler;
use crate::error::TrackingResult;
use crate::models::{SampleInstant, VisibilityRequest, VisibilityWindow};
use crate::oracle::OrbitalOracle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    NotVisible,
    Visible,
}

/// Result of a finished scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The object never rose above the horizon.
    NoVisibility,
    /// The object rose but the range ended before it set.
    Incomplete { aos: SampleInstant },
    /// A full pass.
    Complete { aos: SampleInstant, los: SampleInstant },
}

impl ScanOutcome {
    /// The `(aos, los)` pair of a completed pass.
    pub fn window(&self) -> Option<(SampleInstant, SampleInstant)> {
        match *self {
            Self::Complete { aos, los } => Some((aos, los)),
            _ => None,
        }
    }
}

/// Incremental single-pass detector.
#[derive(Debug, Clone)]
pub struct PassDetector {
    horizon_deg: f64,
    state: ScanState,
    aos: Option<SampleInstant>,
    los: Option<SampleInstant>,
}

impl PassDetector {
    pub fn new(horizon_deg: f64) -> Self {
        Self {
            horizon_deg,
            state: ScanState::NotVisible,
            aos: None,
            los: None,
        }
    }

    /// Whether LOS has been found; later samples are ignored.
    pub fn is_done(&self) -> bool {
        self.los.is_some()
    }

    /// Feed one sample. Returns `true` once the pass is complete.
    pub fn observe(&mut self, instant: SampleInstant, elevation_deg: f64) -> bool {
        if self.is_done() {
            return true;
        }
        match self.state {
            ScanState::NotVisible if elevation_deg > self.horizon_deg => {
                self.state = ScanState::Visible;
                self.aos = Some(instant);
                false
            }
            ScanState::Visible if elevation_deg <= self.horizon_deg => {
                self.state = ScanState::NotVisible;
                self.los = Some(instant);
                true
            }
            _ => false,
        }
    }

    pub fn finish(self) -> ScanOutcome {
        match (self.aos, self.los) {
            (Some(aos), Some(los)) => ScanOutcome::Complete { aos, los },
            (Some(aos), None) => ScanOutcome::Incomplete { aos },
            _ => ScanOutcome::NoVisibility,
        }
    }
}

/// Run the detector over precomputed `(instant, elevation)` samples.
pub fn scan_elevations<I>(samples: I, horizon_deg: f64) -> ScanOutcome
where
    I: IntoIterator<Item = (SampleInstant, f64)>,
{
    let mut detector = PassDetector::new(horizon_deg);
    for (instant, elevation) in samples {
        if detector.observe(instant, elevation) {
            break;
        }
    }
    detector.finish()
}

/// Scan the request's time range with elevations resolved by `oracle`.
///
/// The oracle is queried lazily, so nothing past LOS is ever computed. The
/// grid length is bounded by `limits.max_samples` and the loop stops with
/// [`TrackingError::Timeout`](crate::TrackingError::Timeout) once
/// `limits.timeout` has passed.
pub fn scan_request(
    oracle: &dyn OrbitalOracle,
    request: &VisibilityRequest,
    limits: PropagationLimits,
) -> TrackingResult<ScanOutcome> {
    request.validate()?;
    let sampler = TimeSampler::spanning(
        request.start_time,
        request.end_time,
        request.interval_seconds,
    )?;
    limits.check_len(sampler.len())?;

    let deadline = limits.deadline();
    let mut detector = PassDetector::new(request.observer.horizon_deg);
    for instant in &sampler {
        deadline.check()?;
        let elevation = oracle.elevation_at(&request.elements, &request.observer, instant)?;
        if detector.observe(instant, elevation) {
            break;
        }
    }
    Ok(detector.finish())
}

/// Find the first completed visibility window for a request, if any.
pub fn find_visibility_window(
    oracle: &dyn OrbitalOracle,
    request: &VisibilityRequest,
    limits: PropagationLimits,
) -> TrackingResult<Option<VisibilityWindow>> {
    let outcome = scan_request(oracle, request, limits)?;
    match outcome {
        ScanOutcome::Complete { aos, los } => Ok(Some(VisibilityWindow {
            object_id: request.object_id.clone(),
            object_name: request.object_name.clone(),
            aos,
            los,
            observer: request.observer.clone(),
            requester_id: request.requester_id.clone(),
        })),
        ScanOutcome::Incomplete { aos } => {
            debug!(
                object_id = %request.object_id,
                %aos,
                "pass still in progress at end of range, discarding"
            );
            Ok(None)
        }
        ScanOutcome::NoVisibility => Ok(None),
    }
}
