use chrono::{DateTime, Duration, NaiveDateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TrackingError;

/// A UTC instant quantized to whole seconds.
///
/// All sampling in the engine happens on second boundaries, so any
/// sub-second component is dropped on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SampleInstant(DateTime<Utc>);

impl SampleInstant {
    /// Create an instant, truncating sub-second precision.
    pub fn new(dt: DateTime<Utc>) -> Self {
        Self(dt.trunc_subsecs(0))
    }

    /// Current wall-clock time on a second boundary.
    pub fn now() -> Self {
        Self::new(Utc::now())
    }

    /// Create from Unix epoch seconds.
    pub fn from_epoch_seconds(secs: i64) -> Option<Self> {
        DateTime::from_timestamp(secs, 0).map(Self)
    }

    /// Parse an ISO-8601 timestamp.
    ///
    /// Accepts a trailing `Z`, an explicit offset, or no offset at all (read as UTC).
    pub fn parse(input: &str) -> Result<Self, TrackingError> {
        let trimmed = input.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(Self::new(dt.with_timezone(&Utc)));
        }
        NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| Self::new(naive.and_utc()))
            .map_err(|e| TrackingError::TimestampParse {
                input: input.to_string(),
                reason: e.to_string(),
            })
    }

    /// Ordering score used by the distribution store.
    pub fn epoch_seconds(&self) -> i64 {
        self.0.timestamp()
    }

    pub fn datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// Shift by a signed number of seconds.
    pub fn plus_seconds(&self, secs: i64) -> Self {
        Self(self.0 + Duration::seconds(secs))
    }

    /// Shift by a signed number of seconds, or `None` past chrono's range.
    pub fn checked_plus_seconds(&self, secs: i64) -> Option<Self> {
        Duration::try_seconds(secs)
            .and_then(|d| self.0.checked_add_signed(d))
            .map(Self)
    }

    /// Signed distance `other - self` in whole seconds.
    pub fn seconds_until(&self, other: &SampleInstant) -> i64 {
        other.epoch_seconds() - self.epoch_seconds()
    }

    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

impl fmt::Display for SampleInstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

impl From<DateTime<Utc>> for SampleInstant {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::new(dt)
    }
}

impl TryFrom<String> for SampleInstant {
    type Error = TrackingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SampleInstant> for String {
    fn from(value: SampleInstant) -> Self {
        value.to_rfc3339()
    }
}
