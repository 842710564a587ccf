//! Sample-instant generation.
//!
//! A [`TimeSampler`] describes the instants `start, start + interval, ...`
//! up to and including the last one that does not pass `start + duration`.
//! The sampler itself holds no iteration state, so every call to
//! [`TimeSampler::iter`] restarts from the first instant.

use crate::error::TrackingError;
use crate::models::SampleInstant;

/// Lazy, finite description of a sampling grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSampler {
    start: SampleInstant,
    interval_seconds: i64,
    count: u64,
}

impl TimeSampler {
    /// Grid covering `duration_minutes` from `start`.
    ///
    /// The interval is checked before anything else, so a non-positive
    /// interval can never produce an unbounded sequence.
    pub fn new(
        start: SampleInstant,
        duration_minutes: i64,
        interval_seconds: i64,
    ) -> Result<Self, TrackingError> {
        if interval_seconds <= 0 {
            return Err(TrackingError::InvalidInterval(interval_seconds));
        }
        if duration_minutes < 0 {
            return Err(TrackingError::validation(format!(
                "duration must be non-negative, got {} minutes",
                duration_minutes
            )));
        }
        let span_seconds = duration_minutes
            .checked_mul(60)
            .filter(|span| start.checked_plus_seconds(*span).is_some())
            .ok_or_else(|| {
                TrackingError::validation(format!(
                    "duration of {} minutes runs past the representable time range",
                    duration_minutes
                ))
            })?;
        Ok(Self {
            start,
            interval_seconds,
            count: span_seconds as u64 / interval_seconds as u64 + 1,
        })
    }

    /// Grid covering the closed range `[start, end]`.
    pub fn spanning(
        start: SampleInstant,
        end: SampleInstant,
        interval_seconds: i64,
    ) -> Result<Self, TrackingError> {
        if interval_seconds <= 0 {
            return Err(TrackingError::InvalidInterval(interval_seconds));
        }
        let span_seconds = start.seconds_until(&end);
        if span_seconds < 0 {
            return Err(TrackingError::validation(format!(
                "end time {} precedes start time {}",
                end, start
            )));
        }
        Ok(Self {
            start,
            interval_seconds,
            count: span_seconds as u64 / interval_seconds as u64 + 1,
        })
    }

    pub fn start(&self) -> SampleInstant {
        self.start
    }

    pub fn interval_seconds(&self) -> i64 {
        self.interval_seconds
    }

    /// Number of instants in the grid.
    pub fn len(&self) -> u64 {
        self.count
    }

    /// A grid always contains at least its start instant.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Last instant of the grid.
    pub fn last(&self) -> SampleInstant {
        self.start
            .plus_seconds((self.count.saturating_sub(1)) as i64 * self.interval_seconds)
    }

    /// Iterate the grid from the beginning.
    pub fn iter(&self) -> SampleInstants {
        SampleInstants {
            sampler: *self,
            next_index: 0,
        }
    }
}

impl IntoIterator for TimeSampler {
    type Item = SampleInstant;
    type IntoIter = SampleInstants;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for &TimeSampler {
    type Item = SampleInstant;
    type IntoIter = SampleInstants;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the instants of a [`TimeSampler`].
#[derive(Debug, Clone)]
pub struct SampleInstants {
    sampler: TimeSampler,
    next_index: u64,
}

impl Iterator for SampleInstants {
    type Item = SampleInstant;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_index >= self.sampler.count {
            return None;
        }
        let offset = self.next_index as i64 * self.sampler.interval_seconds;
        self.next_index += 1;
        Some(self.sampler.start.plus_seconds(offset))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.sampler.count - self.next_index) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SampleInstants {}
