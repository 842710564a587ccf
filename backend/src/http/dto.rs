//! Request and response bodies of the REST API.
//!
//! Bodies use camelCase field names. Request DTOs convert into the engine's
//! request types, filling omitted fields from the service configuration.

use serde::{Deserialize, Serialize};

use crate::config::{PropagationSettings, VisibilitySettings};
use crate::db::derive_object_id;
use crate::error::{TrackingError, TrackingResult};
use crate::models::{
    ObserverLocation, OrbitalElements, PropagationRequest, SampleInstant, SamplePoint,
    VisibilityRequest, VisibilityWindow,
};

/// Reason given when a propagate body lacks its required fields.
pub const MISSING_PROPAGATE_FIELDS: &str = "TLE data and start time are required";

/// Body of `POST /v1/propagate`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropagateBody {
    #[serde(default)]
    pub object_id: Option<String>,
    #[serde(default, alias = "line_1", alias = "tleLine1")]
    pub line1: Option<String>,
    #[serde(default, alias = "line_2", alias = "tleLine2")]
    pub line2: Option<String>,
    #[serde(default, alias = "start_time")]
    pub start_time: Option<String>,
    #[serde(default, alias = "duration_minutes")]
    pub duration_minutes: Option<i64>,
    #[serde(default, alias = "interval_seconds")]
    pub interval_seconds: Option<i64>,
}

fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl PropagateBody {
    pub fn into_request(self, defaults: &PropagationSettings) -> TrackingResult<PropagationRequest> {
        let (line1, line2, start_time) = match (
            required(self.line1),
            required(self.line2),
            required(self.start_time),
        ) {
            (Some(l1), Some(l2), Some(start)) => (l1, l2, start),
            _ => return Err(TrackingError::validation(MISSING_PROPAGATE_FIELDS)),
        };
        let start = SampleInstant::parse(&start_time)?;
        let object_id = required(self.object_id).unwrap_or_else(|| derive_object_id(&line1, &line2));
        let elements = OrbitalElements::new(object_id, line1.trim(), line2.trim())?;

        let request = PropagationRequest::new(elements, start)
            .with_duration_minutes(
                self.duration_minutes
                    .unwrap_or(defaults.default_duration_minutes),
            )
            .with_interval_seconds(
                self.interval_seconds
                    .unwrap_or(defaults.default_interval_seconds),
            );
        request.validate()?;
        Ok(request)
    }
}

/// Response of `POST /v1/propagate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropagateResponse {
    pub object_id: String,
    /// Background job distributing the samples.
    pub job_id: String,
    pub positions: Vec<SamplePoint>,
}

/// Query of `GET /v1/objects/{objectId}/positions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionsQuery {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionsResponse {
    pub object_id: String,
    pub count: usize,
    pub positions: Vec<SamplePoint>,
}

/// Observer as sent over HTTP; a missing horizon takes the configured default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObserverBody {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, alias = "altitude")]
    pub altitude_m: f64,
    #[serde(default, alias = "horizon")]
    pub horizon_deg: Option<f64>,
}

/// Body of `POST /v1/visibility`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityBody {
    #[serde(default)]
    pub object_id: Option<String>,
    #[serde(default)]
    pub object_name: Option<String>,
    #[serde(alias = "tleLine1")]
    pub line1: String,
    #[serde(alias = "tleLine2")]
    pub line2: String,
    pub observer: ObserverBody,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub interval_seconds: Option<i64>,
    #[serde(default)]
    pub requester_id: Option<String>,
}

impl VisibilityBody {
    pub fn into_request(self, defaults: &VisibilitySettings) -> TrackingResult<VisibilityRequest> {
        let start_time = SampleInstant::parse(&self.start_time)?;
        let end_time = SampleInstant::parse(&self.end_time)?;
        let object_id = required(self.object_id)
            .unwrap_or_else(|| derive_object_id(&self.line1, &self.line2));
        let elements = OrbitalElements::new(object_id.clone(), self.line1.trim(), self.line2.trim())?;
        let observer = ObserverLocation::new(
            self.observer.latitude,
            self.observer.longitude,
            self.observer.altitude_m,
        )
        .with_horizon(self.observer.horizon_deg.unwrap_or(defaults.default_horizon_deg));

        let request = VisibilityRequest {
            object_name: self.object_name.unwrap_or_else(|| object_id.clone()),
            object_id,
            elements,
            observer,
            start_time,
            end_time,
            interval_seconds: self
                .interval_seconds
                .unwrap_or(defaults.default_interval_seconds),
            requester_id: self.requester_id.unwrap_or_default(),
        };
        request.validate()?;
        Ok(request)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisibilityResponse {
    /// `null` when no completed pass was found.
    pub window: Option<VisibilityWindow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityResultsResponse {
    pub requester_id: String,
    pub windows: Vec<VisibilityWindow>,
}

/// Response of the bus ingress endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishResponse {
    pub channel: String,
    /// Subscribers the message reached; zero means no worker is listening.
    pub receivers: usize,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Distribution backend status
    pub backend: String,
}
