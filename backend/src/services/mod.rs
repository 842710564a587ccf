//! Sampling, classification, visibility and distribution logic.
//!
//! The pure pieces (`sampler`, `regime`, `visibility_detector`) know nothing
//! about storage. `propagation` connects them to the oracle and the store,
//! and `engine` wraps everything for async callers.

pub mod engine;
pub mod job_tracker;
pub mod propagation;
pub mod regime;
pub mod sampler;
pub mod visibility_detector;

pub use engine::{PropagationOutcome, TrackingEngine};
pub use job_tracker::{Job, JobStatus, JobTracker, LogEntry, LogLevel};
pub use propagation::{
    distribute_batch, plan_element_update, propagate, run_blocking, DistributionReport,
    PropagationLimits,
};
pub use regime::{classify_altitude, OrbitRegime, SamplingPlan};
pub use sampler::TimeSampler;
pub use visibility_detector::{find_visibility_window, scan_elevations, ScanOutcome, ScanState};
