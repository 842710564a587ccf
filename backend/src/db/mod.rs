//! Distribution layer: sample storage, visibility results and fan-out.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Engine / workers / HTTP handlers                       │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │  Arc<dyn DistributionRepository>
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository trait (repository/mod.rs)                   │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  LocalRepository (in-memory)  ──publish──▶  MessageBus  │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The store is created once at startup and handed to every component that
//! needs it. There is no process-wide singleton.

pub mod checksum;
pub mod repositories;
pub mod repository;

pub use checksum::{calculate_checksum, derive_object_id};
pub use repositories::LocalRepository;
pub use repository::{DistributionRepository, ErrorContext, RepositoryError, RepositoryResult};
