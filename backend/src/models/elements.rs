use serde::{Deserialize, Serialize};

use super::time::SampleInstant;
use crate::error::TrackingError;

/// Two-line orbital element set identifying one orbiting object.
///
/// Immutable once received; the lines are passed verbatim to the oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrbitalElements {
    pub id: String,
    #[serde(alias = "line_1", alias = "tle_line1", alias = "tleLine1")]
    pub line1: String,
    #[serde(alias = "line_2", alias = "tle_line2", alias = "tleLine2")]
    pub line2: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epoch: Option<SampleInstant>,
}

impl OrbitalElements {
    /// Build an element set, rejecting blank identifiers or lines.
    pub fn new(
        id: impl Into<String>,
        line1: impl Into<String>,
        line2: impl Into<String>,
    ) -> Result<Self, TrackingError> {
        let elements = Self {
            id: id.into(),
            line1: line1.into(),
            line2: line2.into(),
            epoch: None,
        };
        elements.validate()?;
        Ok(elements)
    }

    pub fn with_epoch(mut self, epoch: SampleInstant) -> Self {
        self.epoch = Some(epoch);
        self
    }

    pub fn validate(&self) -> Result<(), TrackingError> {
        if self.id.trim().is_empty() {
            return Err(TrackingError::validation("object id is required"));
        }
        if self.line1.trim().is_empty() || self.line2.trim().is_empty() {
            return Err(TrackingError::validation("TLE data is required"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_lines_rejected() {
        assert!(OrbitalElements::new("25544", "", "2 25544").is_err());
        assert!(OrbitalElements::new("", "1 25544", "2 25544").is_err());
        assert!(OrbitalElements::new("25544", "1 25544", "2 25544").is_ok());
    }

    #[test]
    fn test_deserialize_bus_field_names() {
        let json = r#"{"id":"25544","line_1":"1 25544U","line_2":"2 25544","epoch":"2024-01-01T00:00:00Z"}"#;
        let elements: OrbitalElements = serde_json::from_str(json).unwrap();
        assert_eq!(elements.line1, "1 25544U");
        assert_eq!(elements.line2, "2 25544");
        assert_eq!(elements.epoch.unwrap().to_rfc3339(), "2024-01-01T00:00:00Z");
    }
}
