use serde::{Deserialize, Serialize};

use super::observer::ObserverLocation;
use super::time::SampleInstant;

/// A completed pass of an object over an observer's horizon.
///
/// Only completed windows exist as values of this type: `aos` and `los`
/// are both set and `aos < los`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityWindow {
    pub object_id: String,
    pub object_name: String,
    pub aos: SampleInstant,
    pub los: SampleInstant,
    pub observer: ObserverLocation,
    pub requester_id: String,
}

impl VisibilityWindow {
    /// Pass duration in seconds.
    pub fn duration_seconds(&self) -> i64 {
        self.aos.seconds_until(&self.los)
    }
}
