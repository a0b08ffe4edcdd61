//! Read-only job status queries.

use std::sync::Arc;

use reel_models::{Job, JobId};

use crate::error::{WorkerError, WorkerResult};
use crate::store::JobStore;

/// Snapshot reads over the job registry.
#[derive(Debug, Clone)]
pub struct StatusQuery {
    store: Arc<JobStore>,
}

impl StatusQuery {
    pub fn new(store: Arc<JobStore>) -> Self {
        Self { store }
    }

    /// Current snapshot of a job.
    pub async fn get(&self, id: &JobId) -> WorkerResult<Arc<Job>> {
        self.store
            .get(id)
            .await
            .ok_or_else(|| WorkerError::not_found(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_models::{JobStatus, VideoRequest};

    #[tokio::test]
    async fn test_unknown_job_is_not_found() {
        let query = StatusQuery::new(Arc::new(JobStore::new()));
        let err = query.get(&JobId::from_string("missing")).await.unwrap_err();
        assert!(matches!(err, WorkerError::NotFound(ref id) if id == "missing"));
    }

    #[tokio::test]
    async fn test_terminal_reads_are_stable() {
        let store = Arc::new(JobStore::new());
        let query = StatusQuery::new(Arc::clone(&store));
        let mut writer = store.register(VideoRequest::new("Hi.", "noir")).await;
        writer.update(|job| job.fail("nothing rendered")).await.unwrap();

        let first = query.get(writer.id()).await.unwrap();
        let second = query.get(writer.id()).await.unwrap();
        assert_eq!(first.status, JobStatus::Failed);
        assert_eq!(*first, *second);
    }
}
