//! Domain types shared by the sampling, visibility and distribution layers.

pub mod elements;
pub mod observer;
pub mod request;
pub mod sample;
pub mod time;
pub mod visibility;

pub use elements::OrbitalElements;
pub use observer::{ObserverLocation, DEFAULT_HORIZON_DEG};
pub use request::{
    PropagationRequest, VisibilityRequest, DEFAULT_DURATION_MINUTES, DEFAULT_INTERVAL_SECONDS,
    DEFAULT_VISIBILITY_INTERVAL_SECONDS,
};
pub use sample::{BatchSummary, SamplePoint, Subpoint};
pub use time::SampleInstant;
pub use visibility::VisibilityWindow;
