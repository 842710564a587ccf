use serde::{Deserialize, Serialize};

use crate::error::TrackingError;

/// Horizon used when an observer does not specify one.
pub const DEFAULT_HORIZON_DEG: f64 = 30.0;

/// A ground observer and its visibility threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObserverLocation {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, alias = "altitude")]
    pub altitude_m: f64,
    #[serde(default = "default_horizon", alias = "horizon")]
    pub horizon_deg: f64,
}

fn default_horizon() -> f64 {
    DEFAULT_HORIZON_DEG
}

impl ObserverLocation {
    pub fn new(latitude: f64, longitude: f64, altitude_m: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude_m,
            horizon_deg: DEFAULT_HORIZON_DEG,
        }
    }

    pub fn with_horizon(mut self, horizon_deg: f64) -> Self {
        self.horizon_deg = horizon_deg;
        self
    }

    pub fn validate(&self) -> Result<(), TrackingError> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(TrackingError::validation(format!(
                "latitude out of bounds: {}",
                self.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(TrackingError::validation(format!(
                "longitude out of bounds: {}",
                self.longitude
            )));
        }
        if !(-90.0..=90.0).contains(&self.horizon_deg) {
            return Err(TrackingError::validation(format!(
                "horizon out of bounds: {}",
                self.horizon_deg
            )));
        }
        Ok(())
    }
}
