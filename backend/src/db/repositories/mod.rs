//! Distribution store implementations.
//!
//! - `local`: in-memory store for the service and for tests
pub mod local;

pub use local::LocalRepository;
