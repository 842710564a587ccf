//! Wire formats of the inbound bus channels.

use serde::{Deserialize, Serialize};

use crate::error::{TrackingError, TrackingResult};
use crate::models::{ObserverLocation, OrbitalElements, SampleInstant, VisibilityRequest};

/// Payload of `element-updates`: `{id, line_1, line_2, epoch?}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementUpdateMessage {
    pub id: String,
    #[serde(alias = "line1", alias = "tle_line1")]
    pub line_1: String,
    #[serde(alias = "line2", alias = "tle_line2")]
    pub line_2: String,
    #[serde(default)]
    pub epoch: Option<String>,
}

impl ElementUpdateMessage {
    /// Validated element set plus the instant sampling starts from:
    /// the message epoch if present, otherwise `now`.
    pub fn into_elements(self, now: SampleInstant) -> TrackingResult<(OrbitalElements, SampleInstant)> {
        if self.id.trim().is_empty() {
            return Err(TrackingError::validation("object id is required"));
        }
        if self.line_1.trim().is_empty() || self.line_2.trim().is_empty() {
            return Err(TrackingError::validation("TLE data is required"));
        }
        let id = self.id.trim().to_string();
        let epoch = self.epoch.as_deref().map(SampleInstant::parse).transpose()?;

        let mut elements = OrbitalElements::new(id, self.line_1.trim(), self.line_2.trim())?;
        if let Some(epoch) = epoch {
            elements = elements.with_epoch(epoch);
        }
        Ok((elements, epoch.unwrap_or(now)))
    }
}

/// Observer block of a visibility request entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserLocation {
    pub latitude: f64,
    pub longitude: f64,
    /// Metres above the ellipsoid.
    #[serde(default)]
    pub altitude: Option<f64>,
    /// Minimum elevation in degrees.
    #[serde(default)]
    pub horizon: Option<f64>,
    #[serde(default)]
    pub radius: Option<f64>,
    #[serde(default)]
    pub uid: Option<String>,
}

/// One entry of a `visibility-requests:{requesterId}` batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityRequestEntry {
    #[serde(rename = "satelliteID", alias = "satelliteId")]
    pub satellite_id: String,
    #[serde(default)]
    pub satellite_name: String,
    pub start_time: String,
    pub end_time: String,
    pub tle_line1: String,
    pub tle_line2: String,
    pub user_location: UserLocation,
    #[serde(rename = "userUID", alias = "userUid", default)]
    pub user_uid: Option<String>,
}

/// Defaults applied to fields a visibility entry leaves out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityDefaults {
    pub horizon_deg: f64,
    pub interval_seconds: i64,
}

impl VisibilityRequestEntry {
    pub fn into_request(
        self,
        requester_id: &str,
        defaults: VisibilityDefaults,
    ) -> TrackingResult<VisibilityRequest> {
        let start_time = SampleInstant::parse(&self.start_time)?;
        let end_time = SampleInstant::parse(&self.end_time)?;
        let elements = OrbitalElements::new(&self.satellite_id, self.tle_line1, self.tle_line2)?;

        let location = self.user_location;
        let observer = ObserverLocation::new(
            location.latitude,
            location.longitude,
            location.altitude.unwrap_or_default(),
        )
        .with_horizon(location.horizon.unwrap_or(defaults.horizon_deg));

        let object_name = if self.satellite_name.is_empty() {
            self.satellite_id.clone()
        } else {
            self.satellite_name
        };

        let request = VisibilityRequest {
            object_id: self.satellite_id,
            object_name,
            elements,
            observer,
            start_time,
            end_time,
            interval_seconds: defaults.interval_seconds,
            requester_id: requester_id.to_string(),
        };
        request.validate()?;
        Ok(request)
    }
}
