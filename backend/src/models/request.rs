use super::elements::OrbitalElements;
use super::observer::ObserverLocation;
use super::time::SampleInstant;
use crate::error::TrackingError;

/// Default propagation span for synchronous requests.
pub const DEFAULT_DURATION_MINUTES: i64 = 90;
/// Default cadence for synchronous requests.
pub const DEFAULT_INTERVAL_SECONDS: i64 = 15;
/// Default cadence of the visibility scan.
pub const DEFAULT_VISIBILITY_INTERVAL_SECONDS: i64 = 10;

/// A request to sample an object's ground track.
#[derive(Debug, Clone, PartialEq)]
pub struct PropagationRequest {
    pub object_id: String,
    pub elements: OrbitalElements,
    pub start_time: SampleInstant,
    pub duration_minutes: i64,
    pub interval_seconds: i64,
}

impl PropagationRequest {
    pub fn new(elements: OrbitalElements, start_time: SampleInstant) -> Self {
        Self {
            object_id: elements.id.clone(),
            elements,
            start_time,
            duration_minutes: DEFAULT_DURATION_MINUTES,
            interval_seconds: DEFAULT_INTERVAL_SECONDS,
        }
    }

    pub fn with_duration_minutes(mut self, minutes: i64) -> Self {
        self.duration_minutes = minutes;
        self
    }

    pub fn with_interval_seconds(mut self, seconds: i64) -> Self {
        self.interval_seconds = seconds;
        self
    }

    /// Check all invariants before any sampling happens.
    pub fn validate(&self) -> Result<(), TrackingError> {
        self.elements.validate()?;
        if self.object_id.trim().is_empty() {
            return Err(TrackingError::validation("object id is required"));
        }
        if self.interval_seconds <= 0 {
            return Err(TrackingError::InvalidInterval(self.interval_seconds));
        }
        if self.duration_minutes < 0 {
            return Err(TrackingError::validation(format!(
                "duration must be non-negative, got {} minutes",
                self.duration_minutes
            )));
        }
        let end = self
            .duration_minutes
            .checked_mul(60)
            .and_then(|span| self.start_time.checked_plus_seconds(span));
        if end.is_none() {
            return Err(TrackingError::validation(format!(
                "duration of {} minutes runs past the representable time range",
                self.duration_minutes
            )));
        }
        Ok(())
    }

    /// Number of samples the request yields once validated.
    pub fn sample_count(&self) -> u64 {
        if self.interval_seconds <= 0 || self.duration_minutes < 0 {
            return 0;
        }
        match self.duration_minutes.checked_mul(60) {
            Some(span) => span as u64 / self.interval_seconds as u64 + 1,
            None => u64::MAX,
        }
    }
}

/// A single-object visibility query over a time range.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibilityRequest {
    pub object_id: String,
    pub object_name: String,
    pub elements: OrbitalElements,
    pub observer: ObserverLocation,
    pub start_time: SampleInstant,
    pub end_time: SampleInstant,
    pub interval_seconds: i64,
    pub requester_id: String,
}

impl VisibilityRequest {
    pub fn validate(&self) -> Result<(), TrackingError> {
        self.elements.validate()?;
        self.observer.validate()?;
        if self.interval_seconds <= 0 {
            return Err(TrackingError::InvalidInterval(self.interval_seconds));
        }
        if self.end_time < self.start_time {
            return Err(TrackingError::validation(format!(
                "end time {} precedes start time {}",
                self.end_time, self.start_time
            )));
        }
        Ok(())
    }
}
