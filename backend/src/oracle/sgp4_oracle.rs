//! SGP4-backed oracle.
//!
//! Positions come out of SGP4 in the TEME frame. They are rotated into an
//! Earth-fixed frame by Greenwich mean sidereal time (polar motion ignored)
//! and converted to WGS-84 geodetic coordinates.

use sgp4::{Constants, Elements};

use super::OrbitalOracle;
use crate::error::{TrackingError, TrackingResult};
use crate::models::{ObserverLocation, OrbitalElements, SampleInstant, Subpoint};

/// WGS-84 equatorial radius in km.
const WGS84_A_KM: f64 = 6378.137;
/// WGS-84 flattening.
const WGS84_F: f64 = 1.0 / 298.257_223_563;
const MAX_GEODETIC_ITERATIONS: usize = 10;

/// Oracle propagating two-line element sets with SGP4.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sgp4Oracle;

impl Sgp4Oracle {
    pub fn new() -> Self {
        Self
    }

    /// Earth-fixed position of the object in km.
    fn ecef_position(
        &self,
        elements: &OrbitalElements,
        instant: SampleInstant,
    ) -> TrackingResult<[f64; 3]> {
        let parsed = Elements::from_tle(
            Some(elements.id.clone()),
            elements.line1.as_bytes(),
            elements.line2.as_bytes(),
        )
        .map_err(|e| TrackingError::oracle(&elements.id, format!("invalid TLE: {:?}", e)))?;
        let constants = Constants::from_elements(&parsed)
            .map_err(|e| TrackingError::oracle(&elements.id, format!("invalid elements: {:?}", e)))?;

        let naive = instant.datetime().naive_utc();
        let minutes = parsed
            .datetime_to_minutes_since_epoch(&naive)
            .map_err(|e| TrackingError::oracle(&elements.id, format!("bad instant {}: {:?}", instant, e)))?;
        let prediction = constants
            .propagate(minutes)
            .map_err(|e| TrackingError::oracle(&elements.id, format!("propagation failed at {}: {:?}", instant, e)))?;

        let gmst = sgp4::iau_epoch_to_sidereal_time(sgp4::julian_years_since_j2000(&naive));
        Ok(teme_to_ecef(prediction.position, gmst))
    }
}

impl OrbitalOracle for Sgp4Oracle {
    fn subpoint_at(
        &self,
        elements: &OrbitalElements,
        instant: SampleInstant,
    ) -> TrackingResult<Subpoint> {
        let position = self.ecef_position(elements, instant)?;
        Ok(ecef_to_geodetic(position))
    }

    fn elevation_at(
        &self,
        elements: &OrbitalElements,
        observer: &ObserverLocation,
        instant: SampleInstant,
    ) -> TrackingResult<f64> {
        let target = self.ecef_position(elements, instant)?;
        Ok(topocentric_elevation(observer, target))
    }
}

fn teme_to_ecef(teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let (sin_g, cos_g) = gmst.sin_cos();
    [
        cos_g * teme[0] + sin_g * teme[1],
        -sin_g * teme[0] + cos_g * teme[1],
        teme[2],
    ]
}

fn eccentricity_squared() -> f64 {
    WGS84_F * (2.0 - WGS84_F)
}

fn ecef_to_geodetic(position: [f64; 3]) -> Subpoint {
    let [x, y, z] = position;
    let e2 = eccentricity_squared();
    let r = (x * x + y * y).sqrt();
    let longitude = y.atan2(x);

    let mut latitude = z.atan2(r);
    let mut c = 1.0;
    for _ in 0..MAX_GEODETIC_ITERATIONS {
        let previous = latitude;
        let sin_lat = previous.sin();
        c = 1.0 / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        latitude = (z + WGS84_A_KM * c * e2 * sin_lat).atan2(r);
        if (latitude - previous).abs() < 1e-10 {
            break;
        }
    }

    Subpoint {
        latitude: latitude.to_degrees(),
        longitude: longitude.to_degrees(),
        altitude_km: r / latitude.cos() - WGS84_A_KM * c,
    }
}

fn observer_ecef(observer: &ObserverLocation) -> [f64; 3] {
    let lat = observer.latitude.to_radians();
    let lon = observer.longitude.to_radians();
    let height_km = observer.altitude_m / 1000.0;
    let e2 = eccentricity_squared();
    let n = WGS84_A_KM / (1.0 - e2 * lat.sin().powi(2)).sqrt();
    [
        (n + height_km) * lat.cos() * lon.cos(),
        (n + height_km) * lat.cos() * lon.sin(),
        (n * (1.0 - e2) + height_km) * lat.sin(),
    ]
}

fn topocentric_elevation(observer: &ObserverLocation, target: [f64; 3]) -> f64 {
    let origin = observer_ecef(observer);
    let range = [
        target[0] - origin[0],
        target[1] - origin[1],
        target[2] - origin[2],
    ];
    let distance = (range[0].powi(2) + range[1].powi(2) + range[2].powi(2)).sqrt();
    if distance == 0.0 {
        return 90.0;
    }

    let lat = observer.latitude.to_radians();
    let lon = observer.longitude.to_radians();
    let up = [lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()];
    let projection = range[0] * up[0] + range[1] * up[1] + range[2] * up[2];
    (projection / distance).clamp(-1.0, 1.0).asin().to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ISS_LINE1: &str = "1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927";
    const ISS_LINE2: &str = "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537";

    fn iss() -> OrbitalElements {
        OrbitalElements::new("25544", ISS_LINE1, ISS_LINE2).unwrap()
    }

    fn epoch() -> SampleInstant {
        SampleInstant::parse("2008-09-20T12:25:40Z").unwrap()
    }

    #[test]
    fn test_geodetic_round_trip_on_surface() {
        let observer = ObserverLocation::new(45.0, 7.5, 0.0);
        let subpoint = ecef_to_geodetic(observer_ecef(&observer));
        assert!((subpoint.latitude - 45.0).abs() < 1e-6);
        assert!((subpoint.longitude - 7.5).abs() < 1e-6);
        assert!(subpoint.altitude_km.abs() < 1e-6);
    }

    #[test]
    fn test_iss_subpoint_is_low_orbit() {
        let subpoint = Sgp4Oracle::new().subpoint_at(&iss(), epoch()).unwrap();
        assert!(subpoint.altitude_km > 250.0 && subpoint.altitude_km < 450.0);
        assert!(subpoint.latitude.abs() <= 51.7);
        assert!((-180.0..=180.0).contains(&subpoint.longitude));
    }

    #[test]
    fn test_elevation_overhead_and_antipode() {
        let oracle = Sgp4Oracle::new();
        let subpoint = oracle.subpoint_at(&iss(), epoch()).unwrap();

        let below = ObserverLocation::new(subpoint.latitude, subpoint.longitude, 0.0);
        let overhead = oracle.elevation_at(&iss(), &below, epoch()).unwrap();
        assert!(overhead > 85.0, "elevation was {overhead}");

        let antipode_lon = if subpoint.longitude > 0.0 {
            subpoint.longitude - 180.0
        } else {
            subpoint.longitude + 180.0
        };
        let far = ObserverLocation::new(-subpoint.latitude, antipode_lon, 0.0);
        assert!(oracle.elevation_at(&iss(), &far, epoch()).unwrap() < 0.0);
    }

    #[test]
    fn test_garbage_tle_is_oracle_error() {
        let corrupted = ISS_LINE2.replacen("51.6416", "xx.xxxx", 1);
        let elements = OrbitalElements::new("bogus", ISS_LINE1, corrupted).unwrap();
        let err = Sgp4Oracle::new().subpoint_at(&elements, epoch()).unwrap_err();
        assert!(matches!(err, TrackingError::Oracle { .. }));
    }
}
