//! Tracking for background distribution jobs.
//!
//! A synchronous propagate call returns as soon as its samples are computed;
//! persisting and publishing them happens in a spawned task registered here,
//! so callers can poll the outcome by job id.
//!
//! Finished jobs are pruned by age and by count whenever a new job is
//! registered, per [`JobSettings`].

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::JobSettings;

/// A single log entry with timestamp and message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
}

/// One distribution job for one object's sample batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub job_id: String,
    pub object_id: String,
    pub status: JobStatus,
    pub logs: Vec<LogEntry>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// The distribution report once finished.
    pub result: Option<serde_json::Value>,
}

/// In-memory job registry, shared by cloning.
#[derive(Clone)]
pub struct JobTracker {
    jobs: Arc<RwLock<HashMap<String, Job>>>,
    retention: Option<chrono::Duration>,
    max_finished: usize,
}

impl Default for JobTracker {
    fn default() -> Self {
        Self::with_settings(&JobSettings::default())
    }
}

impl JobTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: &JobSettings) -> Self {
        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            retention: settings
                .retention()
                .and_then(|age| chrono::Duration::from_std(age).ok()),
            max_finished: settings.max_finished,
        }
    }

    /// Register a running job for `object_id` and return its id.
    pub fn create_job(&self, object_id: &str) -> String {
        self.prune();
        let job_id = Uuid::new_v4().to_string();
        let job = Job {
            job_id: job_id.clone(),
            object_id: object_id.to_string(),
            status: JobStatus::Running,
            logs: vec![],
            created_at: Utc::now(),
            completed_at: None,
            result: None,
        };
        self.jobs.write().insert(job_id.clone(), job);
        job_id
    }

    pub fn log(&self, job_id: &str, level: LogLevel, message: impl Into<String>) {
        if let Some(job) = self.jobs.write().get_mut(job_id) {
            job.logs.push(LogEntry {
                timestamp: Utc::now(),
                level,
                message: message.into(),
            });
        }
    }

    pub fn complete_job(&self, job_id: &str, result: Option<serde_json::Value>) {
        self.finish(job_id, JobStatus::Completed, |job| job.result = result);
    }

    /// Mark a job as failed, recording `error_message` as its last log line.
    pub fn fail_job(&self, job_id: &str, error_message: impl Into<String>) {
        let message = error_message.into();
        self.finish(job_id, JobStatus::Failed, |job| {
            job.logs.push(LogEntry {
                timestamp: Utc::now(),
                level: LogLevel::Error,
                message,
            })
        });
    }

    fn finish(&self, job_id: &str, status: JobStatus, update: impl FnOnce(&mut Job)) {
        if let Some(job) = self.jobs.write().get_mut(job_id) {
            job.status = status;
            job.completed_at = Some(Utc::now());
            update(job);
        }
    }

    pub fn get_job(&self, job_id: &str) -> Option<Job> {
        self.jobs.read().get(job_id).cloned()
    }

    /// Forget finished jobs past the retention age, then the oldest finished
    /// jobs beyond `max_finished`. Running jobs are never removed. Returns
    /// the number of jobs dropped.
    pub fn prune(&self) -> usize {
        let now = Utc::now();
        let mut jobs = self.jobs.write();
        let before = jobs.len();

        if let Some(retention) = self.retention {
            jobs.retain(|_, job| {
                job.completed_at
                    .map_or(true, |done| now.signed_duration_since(done) < retention)
            });
        }

        if self.max_finished > 0 {
            let mut finished: Vec<(DateTime<Utc>, String)> = jobs
                .values()
                .filter_map(|job| job.completed_at.map(|done| (done, job.job_id.clone())))
                .collect();
            if finished.len() > self.max_finished {
                finished.sort();
                let excess = finished.len() - self.max_finished;
                for (_, job_id) in finished.into_iter().take(excess) {
                    jobs.remove(&job_id);
                }
            }
        }

        before - jobs.len()
    }

    /// Number of jobs held, running or finished.
    pub fn len(&self) -> usize {
        self.jobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.read().is_empty()
    }

    /// Number of jobs still running.
    pub fn running_count(&self) -> usize {
        self.jobs
            .read()
            .values()
            .filter(|job| job.status == JobStatus::Running)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_lifecycle() {
        let tracker = JobTracker::new();
        let id = tracker.create_job("satellite-1");
        assert_eq!(tracker.running_count(), 1);

        tracker.log(&id, LogLevel::Info, "distributing 361 samples");
        tracker.complete_job(&id, Some(serde_json::json!({"persisted": 361})));

        let job = tracker.get_job(&id).unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.object_id, "satellite-1");
        assert_eq!(job.logs.len(), 1);
        assert!(job.completed_at.is_some());
        assert_eq!(job.result.unwrap()["persisted"], 361);
        assert_eq!(tracker.running_count(), 0);
    }

    #[test]
    fn test_failed_job_keeps_error_log() {
        let tracker = JobTracker::new();
        let id = tracker.create_job("satellite-1");
        tracker.fail_job(&id, "store unavailable");

        let job = tracker.get_job(&id).unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.logs.last().unwrap().level, LogLevel::Error);
        assert!(job.result.is_none());
    }

    #[test]
    fn test_unknown_job_is_ignored() {
        let tracker = JobTracker::new();
        tracker.log("missing", LogLevel::Info, "x");
        tracker.complete_job("missing", None);
        assert!(tracker.get_job("missing").is_none());
    }

    #[test]
    fn test_job_serializes_camel_case() {
        let tracker = JobTracker::new();
        let id = tracker.create_job("sat");
        let value = serde_json::to_value(tracker.get_job(&id).unwrap()).unwrap();
        assert_eq!(value["status"], "running");
        assert!(value.get("jobId").is_some());
        assert!(value.get("completedAt").is_some());
    }

    fn finish_at(tracker: &JobTracker, job_id: &str, done: DateTime<Utc>) {
        tracker.complete_job(job_id, None);
        tracker.jobs.write().get_mut(job_id).unwrap().completed_at = Some(done);
    }

    #[test]
    fn test_finished_jobs_expire_after_retention() {
        let tracker = JobTracker::with_settings(&JobSettings {
            retention_secs: 60,
            max_finished: 0,
        });
        let stale = tracker.create_job("a");
        let fresh = tracker.create_job("b");
        let running = tracker.create_job("c");
        finish_at(&tracker, &stale, Utc::now() - chrono::Duration::seconds(120));
        finish_at(&tracker, &fresh, Utc::now());

        assert_eq!(tracker.prune(), 1);
        assert!(tracker.get_job(&stale).is_none());
        assert!(tracker.get_job(&fresh).is_some());
        assert_eq!(tracker.get_job(&running).unwrap().status, JobStatus::Running);
    }

    #[test]
    fn test_oldest_finished_jobs_evicted_beyond_cap() {
        let tracker = JobTracker::with_settings(&JobSettings {
            retention_secs: 0,
            max_finished: 2,
        });
        let base = Utc::now();
        let ids: Vec<String> = (0..3).map(|i| tracker.create_job(&format!("sat-{}", i))).collect();
        for (i, id) in ids.iter().enumerate() {
            finish_at(&tracker, id, base + chrono::Duration::seconds(i as i64));
        }
        let running = tracker.create_job("sat-3");

        assert_eq!(tracker.len(), 3);
        assert!(tracker.get_job(&ids[0]).is_none());
        assert!(tracker.get_job(&ids[1]).is_some());
        assert!(tracker.get_job(&ids[2]).is_some());
        assert!(tracker.get_job(&running).is_some());
    }

    #[test]
    fn test_zero_settings_keep_everything() {
        let tracker = JobTracker::with_settings(&JobSettings {
            retention_secs: 0,
            max_finished: 0,
        });
        for i in 0..5 {
            let id = tracker.create_job(&format!("sat-{}", i));
            finish_at(&tracker, &id, Utc::now() - chrono::Duration::days(30));
        }
        assert_eq!(tracker.prune(), 0);
        assert_eq!(tracker.len(), 5);
    }
}
