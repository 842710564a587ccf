//! # orbitcast
//!
//! Ground-track sampling, visibility detection and result distribution for
//! orbiting objects.
//!
//! ## Architecture
//!
//! - [`models`]: element sets, sample points, observers and visibility windows
//! - [`oracle`]: the orbital-mechanics seam plus an SGP4 implementation
//! - [`services`]: time sampling, regime classification, pass detection,
//!   propagation and batch distribution
//! - [`db`]: the distribution store trait and its in-memory backend
//! - [`bus`]: in-process publish/subscribe channels
//! - [`workers`]: listeners for element updates and visibility requests
//! - [`config`]: TOML and environment configuration
//! - [`http`]: axum REST API (feature `http-server`)
//!
//! Collaborators are created once by the caller and injected; nothing in the
//! crate holds process-wide state.

// RepositoryError carries rich context for debugging
#![allow(clippy::result_large_err)]

pub mod bus;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod oracle;
pub mod services;
pub mod workers;

#[cfg(feature = "http-server")]
pub mod http;

pub use error::{TrackingError, TrackingResult};
