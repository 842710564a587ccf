//! In-memory distribution store.
//!
//! Samples live in one ordered map per object keyed by epoch second, which
//! gives last-write-wins on duplicate timestamps and cheap inclusive range
//! scans. Outbound events go through the shared [`MessageBus`].

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::bus::{MessageBus, BATCH_SUMMARY, POSITIONS};
use crate::db::repository::{
    DistributionRepository, ErrorContext, RepositoryError, RepositoryResult,
};
use crate::models::{BatchSummary, SampleInstant, SamplePoint, VisibilityWindow};

#[derive(Default)]
struct LocalData {
    samples: HashMap<String, BTreeMap<i64, SamplePoint>>,
    visibility: HashMap<String, Vec<VisibilityWindow>>,
}

/// Store backed by process memory. Cloning shares the underlying data.
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
    bus: MessageBus,
    healthy: Arc<RwLock<bool>>,
}

impl LocalRepository {
    pub fn new(bus: MessageBus) -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
            bus,
            healthy: Arc::new(RwLock::new(true)),
        }
    }

    /// Simulate an unreachable store. Publishing is unaffected; close the
    /// bus to make publishes fail.
    pub fn set_healthy(&self, healthy: bool) {
        *self.healthy.write() = healthy;
    }

    pub fn bus(&self) -> &MessageBus {
        &self.bus
    }

    /// Ids of every object with at least one stored sample.
    pub fn object_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.data.read().samples.keys().cloned().collect();
        ids.sort();
        ids
    }

    fn check_health(&self, operation: &str) -> RepositoryResult<()> {
        if *self.healthy.read() {
            Ok(())
        } else {
            Err(RepositoryError::connection_with_context(
                "local store unavailable",
                ErrorContext::new(operation),
            ))
        }
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new(MessageBus::default())
    }
}

#[async_trait]
impl DistributionRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(*self.healthy.read())
    }

    async fn put_sample(&self, object_id: &str, sample: &SamplePoint) -> RepositoryResult<()> {
        self.check_health("put_sample")?;
        if object_id.trim().is_empty() {
            return Err(RepositoryError::validation_with_context(
                "object id is required",
                ErrorContext::new("put_sample").with_entity("sample"),
            ));
        }

        let score = sample.score();
        let replaced = self
            .data
            .write()
            .samples
            .entry(object_id.to_string())
            .or_default()
            .insert(score, sample.clone());
        if replaced.is_some() {
            trace!(object_id, score, "replaced sample at existing timestamp");
        }
        Ok(())
    }

    async fn range_query(
        &self,
        object_id: &str,
        t0: SampleInstant,
        t1: SampleInstant,
    ) -> RepositoryResult<Vec<SamplePoint>> {
        self.check_health("range_query")?;
        let (lo, hi) = (t0.epoch_seconds(), t1.epoch_seconds());
        if lo > hi {
            return Ok(Vec::new());
        }
        let data = self.data.read();
        Ok(data
            .samples
            .get(object_id)
            .map(|series| series.range(lo..=hi).map(|(_, s)| s.clone()).collect())
            .unwrap_or_default())
    }

    async fn publish_sample(&self, sample: &SamplePoint) -> RepositoryResult<usize> {
        self.bus
            .publish_json(POSITIONS, sample)
            .map_err(|e| e.with_operation("publish_sample"))
    }

    async fn publish_batch_summary(&self, summary: &BatchSummary) -> RepositoryResult<usize> {
        let receivers = self
            .bus
            .publish_json(BATCH_SUMMARY, summary)
            .map_err(|e| e.with_operation("publish_batch_summary"))?;
        debug!(
            object_id = %summary.object_id,
            count = summary.count,
            receivers,
            "published batch summary"
        );
        Ok(receivers)
    }

    async fn store_visibility_results(
        &self,
        requester_id: &str,
        windows: Vec<VisibilityWindow>,
    ) -> RepositoryResult<()> {
        self.check_health("store_visibility_results")?;
        self.data
            .write()
            .visibility
            .insert(requester_id.to_string(), windows);
        Ok(())
    }

    async fn fetch_visibility_results(
        &self,
        requester_id: &str,
    ) -> RepositoryResult<Option<Vec<VisibilityWindow>>> {
        self.check_health("fetch_visibility_results")?;
        Ok(self.data.read().visibility.get(requester_id).cloned())
    }

    async fn sample_count(&self, object_id: &str) -> RepositoryResult<usize> {
        self.check_health("sample_count")?;
        Ok(self
            .data
            .read()
            .samples
            .get(object_id)
            .map_or(0, BTreeMap::len))
    }
}
