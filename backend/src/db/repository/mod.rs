//! Distribution store abstraction.
//!
//! A [`DistributionRepository`] persists time-indexed samples per object,
//! answers inclusive range queries, keeps the latest visibility results per
//! requester and fans samples and batch summaries out to subscribers.
//!
//! Persisting and publishing are separate calls:
//! a failed publish never undoes a stored sample, and the reverse.

pub mod error;

use async_trait::async_trait;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

use crate::models::{BatchSummary, SampleInstant, SamplePoint, VisibilityWindow};

/// Storage and fan-out operations used by the engine and the workers.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to be shared across tasks.
#[async_trait]
pub trait DistributionRepository: Send + Sync {
    /// Check if the store is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Store one sample under `object_id`, keyed by its epoch second.
    /// A sample at an already-stored second replaces the previous one.
    async fn put_sample(&self, object_id: &str, sample: &SamplePoint) -> RepositoryResult<()>;

    /// Samples of `object_id` with `t0 <= timestamp <= t1`, oldest first.
    /// An unknown object or `t0 > t1` yields an empty list.
    async fn range_query(
        &self,
        object_id: &str,
        t0: SampleInstant,
        t1: SampleInstant,
    ) -> RepositoryResult<Vec<SamplePoint>>;

    /// Broadcast one sample. Returns the number of receivers.
    async fn publish_sample(&self, sample: &SamplePoint) -> RepositoryResult<usize>;

    /// Broadcast a batch summary. Returns the number of receivers.
    async fn publish_batch_summary(&self, summary: &BatchSummary) -> RepositoryResult<usize>;

    /// Replace the visibility results held for `requester_id`.
    async fn store_visibility_results(
        &self,
        requester_id: &str,
        windows: Vec<VisibilityWindow>,
    ) -> RepositoryResult<()>;

    /// Latest visibility results for `requester_id`, if any were stored.
    async fn fetch_visibility_results(
        &self,
        requester_id: &str,
    ) -> RepositoryResult<Option<Vec<VisibilityWindow>>>;

    /// Number of samples held for `object_id`.
    async fn sample_count(&self, object_id: &str) -> RepositoryResult<usize>;
}
