//! In-memory job registry.
//!
//! Each job has exactly one [`JobWriter`], handed out at registration and
//! owned by the pipeline task driving that job. Readers get immutable
//! snapshots; a write replaces the whole record, so a reader never sees a
//! half-applied mutation.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use reel_models::{Job, JobId, ModelResult, VideoRequest};

use crate::error::WorkerResult;

/// Shared job registry.
#[derive(Debug, Default)]
pub struct JobStore {
    jobs: RwLock<HashMap<JobId, Arc<Job>>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a `QUEUED` record and return its exclusive writer.
    pub async fn register(self: &Arc<Self>, request: VideoRequest) -> JobWriter {
        let job = Arc::new(Job::new(request));
        let id = job.id.clone();
        self.jobs.write().await.insert(id.clone(), Arc::clone(&job));
        debug!(job_id = %id, "Registered job");

        JobWriter {
            id,
            store: Arc::clone(self),
            current: job,
        }
    }

    /// Snapshot of a job, if it exists.
    pub async fn get(&self, id: &JobId) -> Option<Arc<Job>> {
        self.jobs.read().await.get(id).cloned()
    }

    /// Number of registered jobs.
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    async fn publish(&self, job: Arc<Job>) {
        self.jobs.write().await.insert(job.id.clone(), job);
    }
}

/// Exclusive write access to one job record.
///
/// Not `Clone`: the pipeline that owns it is the only writer of the job.
#[derive(Debug)]
pub struct JobWriter {
    id: JobId,
    store: Arc<JobStore>,
    current: Arc<Job>,
}

impl JobWriter {
    pub fn id(&self) -> &JobId {
        &self.id
    }

    /// The record as last published by this writer.
    pub fn job(&self) -> &Job {
        &self.current
    }

    /// Shared snapshot of the record as last published.
    pub fn snapshot(&self) -> Arc<Job> {
        Arc::clone(&self.current)
    }

    /// Apply `mutation` to a copy of the record and publish it.
    ///
    /// If the mutation fails nothing is published and the stored record is
    /// left untouched.
    pub async fn update<F>(&mut self, mutation: F) -> WorkerResult<()>
    where
        F: FnOnce(&mut Job) -> ModelResult<()>,
    {
        let mut next = Job::clone(&self.current);
        mutation(&mut next)?;
        let next = Arc::new(next);
        self.store.publish(Arc::clone(&next)).await;
        self.current = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_models::{JobStatus, QUEUED_PROGRESS};

    fn request() -> VideoRequest {
        VideoRequest::new("A cat sat. A dog ran.", "anime")
    }

    #[tokio::test]
    async fn test_register_creates_queued_record() {
        let store = Arc::new(JobStore::new());
        let writer = store.register(request()).await;

        let job = store.get(writer.id()).await.unwrap();
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.progress, QUEUED_PROGRESS);
        assert!(job.video_url.is_none());
        assert_eq!(job.request, request());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_id_is_absent() {
        let store = Arc::new(JobStore::new());
        assert!(store.get(&JobId::from_string("nope")).await.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_snapshots_are_not_affected_by_later_writes() {
        let store = Arc::new(JobStore::new());
        let mut writer = store.register(request()).await;
        let before = store.get(writer.id()).await.unwrap();

        writer
            .update(|job| job.advance(JobStatus::AnalyzingScript, "Parsing script and splitting into scenes."))
            .await
            .unwrap();

        assert_eq!(before.status, JobStatus::Queued);
        let after = store.get(writer.id()).await.unwrap();
        assert_eq!(after.status, JobStatus::AnalyzingScript);
        assert_eq!(after.progress, "Parsing script and splitting into scenes.");
    }

    #[tokio::test]
    async fn test_failed_mutation_publishes_nothing() {
        let store = Arc::new(JobStore::new());
        let mut writer = store.register(request()).await;
        writer
            .update(|job| job.advance(JobStatus::PollingClips, "polling"))
            .await
            .unwrap();

        let result = writer
            .update(|job| {
                job.set_progress("half-applied")?;
                job.advance(JobStatus::AnalyzingScript, "regressed")
            })
            .await;

        assert!(result.is_err());
        let job = store.get(writer.id()).await.unwrap();
        assert_eq!(job.status, JobStatus::PollingClips);
        assert_eq!(job.progress, "polling");
        assert_eq!(writer.job().progress, "polling");
    }

    #[tokio::test]
    async fn test_jobs_are_independent() {
        let store = Arc::new(JobStore::new());
        let mut first = store.register(request()).await;
        let second = store.register(request()).await;

        first.update(|job| job.fail("boom")).await.unwrap();

        assert_eq!(store.get(first.id()).await.unwrap().status, JobStatus::Failed);
        assert_eq!(store.get(second.id()).await.unwrap().status, JobStatus::Queued);
    }
}
