//! Job executor.
//!
//! Accepts submissions, registers them, and runs each job's pipeline in
//! its own task. A semaphore bounds how many pipelines run at once; jobs
//! beyond the limit stay `QUEUED` until a permit frees up.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{info, warn, Instrument};

use reel_models::{Job, JobId, VideoRequest};

use crate::collaborators::Collaborators;
use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::metrics;
use crate::pipeline::Pipeline;
use crate::status::StatusQuery;
use crate::store::JobStore;

/// Decrements the in-flight counter when a job task ends.
struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Runs submitted jobs in the background.
pub struct JobExecutor {
    config: WorkerConfig,
    store: Arc<JobStore>,
    pipeline: Option<Arc<Pipeline>>,
    missing: Vec<&'static str>,
    job_semaphore: Arc<Semaphore>,
    in_flight: Arc<AtomicUsize>,
    accepting: AtomicBool,
}

impl JobExecutor {
    /// Create a new job executor.
    ///
    /// If a required collaborator is missing the executor still answers
    /// status queries but rejects every submission.
    pub fn new(config: WorkerConfig, store: Arc<JobStore>, collaborators: Collaborators) -> Self {
        let missing = collaborators.missing();
        let pipeline = match Pipeline::new(collaborators, config.clone()) {
            Ok(pipeline) => Some(Arc::new(pipeline)),
            Err(e) => {
                warn!("Job submission disabled: {}", e);
                None
            }
        };
        let job_semaphore = Arc::new(Semaphore::new(config.max_concurrent_jobs.max(1)));

        info!(
            "Job executor ready with {} max concurrent jobs",
            config.max_concurrent_jobs
        );

        Self {
            config,
            store,
            pipeline,
            missing,
            job_semaphore,
            in_flight: Arc::new(AtomicUsize::new(0)),
            accepting: AtomicBool::new(true),
        }
    }

    /// Whether submissions can be accepted.
    pub fn is_ready(&self) -> bool {
        self.pipeline.is_some() && self.accepting.load(Ordering::SeqCst)
    }

    /// Required collaborators that are not configured.
    pub fn missing_collaborators(&self) -> &[&'static str] {
        &self.missing
    }

    /// Whether scenes come from the local splitter rather than a service.
    pub fn uses_fallback_segmentation(&self) -> bool {
        self.pipeline
            .as_ref()
            .map_or(true, |p| p.splitter().is_fallback())
    }

    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    pub fn status_query(&self) -> StatusQuery {
        StatusQuery::new(Arc::clone(&self.store))
    }

    /// Number of jobs queued or running.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Register a job and start its pipeline in the background.
    ///
    /// Returns the `QUEUED` snapshot. Nothing is registered when the
    /// executor cannot run jobs.
    pub async fn submit(&self, request: VideoRequest) -> WorkerResult<Arc<Job>> {
        if !self.accepting.load(Ordering::SeqCst) {
            return Err(WorkerError::ShuttingDown);
        }
        let Some(pipeline) = &self.pipeline else {
            return Err(WorkerError::config_error(format!(
                "video generation is not configured (missing: {})",
                self.missing.join(", ")
            )));
        };

        let writer = self.store.register(request).await;
        let snapshot = writer.snapshot();
        metrics::record_job_submitted();

        let span = JobLogger::new(writer.id(), "video_generation").create_span();
        let pipeline = Arc::clone(pipeline);
        let semaphore = Arc::clone(&self.job_semaphore);
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let guard = InFlight(Arc::clone(&self.in_flight));

        tokio::spawn(
            async move {
                let _guard = guard;
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        let mut writer = writer;
                        if let Err(e) = writer
                            .update(|job| job.fail("Executor stopped before the job started."))
                            .await
                        {
                            warn!("Failed to record executor stop: {}", e);
                        }
                        return;
                    }
                };
                pipeline.run(writer).await;
            }
            .instrument(span),
        );

        info!(job_id = %snapshot.id, "Accepted job: {}...", snapshot.request.script_preview());
        Ok(snapshot)
    }

    /// Current snapshot of a job.
    pub async fn status(&self, id: &JobId) -> WorkerResult<Arc<Job>> {
        self.status_query().get(id).await
    }

    /// Wait until no job is queued or running.
    pub async fn wait_for_jobs(&self) {
        while self.in_flight() > 0 {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    /// Stop accepting jobs and wait for in-flight ones, up to the shutdown timeout.
    pub async fn shutdown(&self) {
        self.accepting.store(false, Ordering::SeqCst);
        info!("Waiting for {} in-flight jobs to complete...", self.in_flight());
        if tokio::time::timeout(self.config.shutdown_timeout, self.wait_for_jobs())
            .await
            .is_err()
        {
            warn!(
                "Shutdown timeout reached with {} jobs still in flight",
                self.in_flight()
            );
        }
        info!("Job executor stopped");
    }
}
