use serde::{Deserialize, Serialize};

use super::time::SampleInstant;

/// Geodetic subpoint of an object at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Subpoint {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_km: f64,
}

/// One ground-track sample, produced once per (object, instant).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplePoint {
    pub object_id: String,
    pub timestamp: SampleInstant,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_km: f64,
}

impl SamplePoint {
    pub fn from_subpoint(object_id: impl Into<String>, timestamp: SampleInstant, subpoint: Subpoint) -> Self {
        Self {
            object_id: object_id.into(),
            timestamp,
            latitude: subpoint.latitude,
            longitude: subpoint.longitude,
            altitude_km: subpoint.altitude_km,
        }
    }

    /// Ordering score in the distribution store.
    pub fn score(&self) -> i64 {
        self.timestamp.epoch_seconds()
    }
}

/// Aggregate event emitted once per completed propagation batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub event: String,
    pub object_id: String,
    pub start_time: Option<SampleInstant>,
    pub end_time: Option<SampleInstant>,
    pub count: usize,
}

impl BatchSummary {
    pub const EVENT: &'static str = "event_satellite_positions_updated";

    pub fn new(
        object_id: impl Into<String>,
        start_time: Option<SampleInstant>,
        end_time: Option<SampleInstant>,
        count: usize,
    ) -> Self {
        Self {
            event: Self::EVENT.to_string(),
            object_id: object_id.into(),
            start_time,
            end_time,
            count,
        }
    }
}
