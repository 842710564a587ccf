//! Altitude-based orbit regime classification.
//!
//! The regime picks how long and how densely an element update is sampled:
//! low orbits need near-minute cadence to resolve passes, geostationary
//! objects barely move over the ground and only need a handful of points.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lower bound (inclusive) of medium Earth orbit, in km.
pub const MEO_FLOOR_KM: f64 = 2000.0;
/// Lower bound (inclusive) of geostationary altitude, in km.
pub const GEO_FLOOR_KM: f64 = 35786.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrbitRegime {
    Leo,
    Meo,
    Geo,
}

impl OrbitRegime {
    /// Classify an altitude reading. Boundaries are half-open:
    /// exactly 2000 km is MEO and exactly 35786 km is GEO.
    pub fn classify(altitude_km: f64) -> Self {
        if altitude_km < MEO_FLOOR_KM {
            Self::Leo
        } else if altitude_km < GEO_FLOOR_KM {
            Self::Meo
        } else {
            Self::Geo
        }
    }

    pub fn plan(self) -> SamplingPlan {
        match self {
            Self::Leo => SamplingPlan::new(self, 1440, 1440),
            Self::Meo => SamplingPlan::new(self, 180, 50),
            Self::Geo => SamplingPlan::new(self, 1440, 10),
        }
    }
}

impl fmt::Display for OrbitRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Leo => "LEO",
            Self::Meo => "MEO",
            Self::Geo => "GEO",
        };
        f.write_str(name)
    }
}

/// Sampling duration and cadence chosen for a regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplingPlan {
    pub regime: OrbitRegime,
    pub duration_minutes: i64,
    pub sample_count: i64,
}

impl SamplingPlan {
    fn new(regime: OrbitRegime, duration_minutes: i64, sample_count: i64) -> Self {
        Self {
            regime,
            duration_minutes,
            sample_count,
        }
    }

    /// `floor(duration * 60 / sample_count)`.
    pub fn interval_seconds(&self) -> i64 {
        self.duration_minutes * 60 / self.sample_count
    }
}

/// Pick the sampling plan for an altitude reading taken at epoch.
pub fn classify_altitude(altitude_km: f64) -> SamplingPlan {
    OrbitRegime::classify(altitude_km).plan()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries_are_half_open() {
        assert_eq!(OrbitRegime::classify(1999.999), OrbitRegime::Leo);
        assert_eq!(OrbitRegime::classify(2000.0), OrbitRegime::Meo);
        assert_eq!(OrbitRegime::classify(35785.999), OrbitRegime::Meo);
        assert_eq!(OrbitRegime::classify(35786.0), OrbitRegime::Geo);
    }

    #[test]
    fn test_plan_table() {
        let leo = classify_altitude(408.0);
        assert_eq!((leo.duration_minutes, leo.sample_count), (1440, 1440));
        assert_eq!(leo.interval_seconds(), 60);

        let meo = classify_altitude(20_200.0);
        assert_eq!((meo.duration_minutes, meo.sample_count), (180, 50));
        assert_eq!(meo.interval_seconds(), 216);

        let geo = classify_altitude(35_786.0);
        assert_eq!((geo.duration_minutes, geo.sample_count), (1440, 10));
        assert_eq!(geo.interval_seconds(), 8640);
    }

    #[test]
    fn test_display() {
        assert_eq!(OrbitRegime::Meo.to_string(), "MEO");
        assert_eq!(serde_json::to_string(&OrbitRegime::Geo).unwrap(), "\"GEO\"");
    }
}
