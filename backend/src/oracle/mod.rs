//! Orbital-mechanics oracle.
//!
//! The engine never propagates orbits itself. It asks an [`OrbitalOracle`]
//! for the geodetic subpoint of an element set at an instant, and for the
//! topocentric elevation of the object seen from an observer. Implementations
//! must be deterministic and free of side effects; calls may block, so async
//! callers run them on the blocking pool.

pub mod sgp4_oracle;

use crate::error::TrackingResult;
use crate::models::{ObserverLocation, OrbitalElements, SampleInstant, Subpoint};

pub use sgp4_oracle::Sgp4Oracle;

pub trait OrbitalOracle: Send + Sync {
    /// Geodetic position directly beneath the object at `instant`.
    fn subpoint_at(
        &self,
        elements: &OrbitalElements,
        instant: SampleInstant,
    ) -> TrackingResult<Subpoint>;

    /// Elevation in degrees above the observer's local horizontal plane.
    /// Negative values mean the object is below the horizon.
    fn elevation_at(
        &self,
        elements: &OrbitalElements,
        observer: &ObserverLocation,
        instant: SampleInstant,
    ) -> TrackingResult<f64>;
}
