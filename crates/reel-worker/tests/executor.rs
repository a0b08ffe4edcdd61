//! Executor behavior: admission, background runs, status reads.

use std::sync::Arc;
use std::time::Duration;

use reel_models::{JobId, JobStatus, VideoRequest};
use reel_worker::stub::{mock_collaborators, StubClip, StubRenderGateway, MOCK_VIDEO_URL};
use reel_worker::{Collaborators, JobExecutor, JobStore, WorkerConfig, WorkerError};

fn request() -> VideoRequest {
    VideoRequest::new("A cat sat. A dog ran.", "anime")
}

fn executor(config: WorkerConfig, collaborators: Collaborators) -> JobExecutor {
    JobExecutor::new(config, Arc::new(JobStore::new()), collaborators)
}

#[tokio::test]
async fn test_unconfigured_executor_rejects_without_registering() {
    let executor = executor(WorkerConfig::default(), Collaborators::default());

    assert!(!executor.is_ready());
    assert_eq!(
        executor.missing_collaborators(),
        &["prompt_author", "render_gateway", "signer"]
    );
    let err = executor.submit(request()).await.unwrap_err();
    assert!(err.is_unavailable());
    assert!(executor.store().is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn test_submission_returns_queued_and_completes_in_background() {
    let executor = executor(WorkerConfig::default(), mock_collaborators());

    let accepted = executor.submit(request()).await.unwrap();
    assert_eq!(accepted.status, JobStatus::Queued);
    assert_eq!(accepted.progress, "Awaiting generation...");

    executor.wait_for_jobs().await;

    let job = executor.status(&accepted.id).await.unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.video_url.as_deref(), Some(MOCK_VIDEO_URL));
    assert!(executor.uses_fallback_segmentation());
}

#[tokio::test(start_paused = true)]
async fn test_observed_statuses_never_regress() {
    let gateway = Arc::new(StubRenderGateway::default().with_default(StubClip::CompleteAfter(3)));
    let mut collaborators = mock_collaborators();
    collaborators.render_gateway = Some(gateway);
    let executor = executor(WorkerConfig::default(), collaborators);

    let id = executor.submit(request()).await.unwrap().id.clone();

    let mut observed = Vec::new();
    loop {
        let job = executor.status(&id).await.unwrap();
        assert_eq!(job.video_url.is_some(), job.status == JobStatus::Completed);
        observed.push(job.status);
        if job.is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    assert!(observed.windows(2).all(|w| w[0].rank() <= w[1].rank()));
    assert!(observed.contains(&JobStatus::PollingClips));
    assert_eq!(observed.last(), Some(&JobStatus::Completed));

    let again = executor.status(&id).await.unwrap();
    assert_eq!(again.status, JobStatus::Completed);
}

#[tokio::test(start_paused = true)]
async fn test_concurrency_limit_keeps_extra_jobs_queued() {
    let config = WorkerConfig {
        max_concurrent_jobs: 1,
        ..Default::default()
    };
    let executor = executor(config, mock_collaborators());

    let first = executor.submit(request()).await.unwrap().id.clone();
    let second = executor.submit(request()).await.unwrap().id.clone();
    tokio::time::sleep(Duration::from_millis(10)).await;

    let statuses = [
        executor.status(&first).await.unwrap().status,
        executor.status(&second).await.unwrap().status,
    ];
    assert_eq!(
        statuses.iter().filter(|s| **s == JobStatus::Queued).count(),
        1,
        "statuses: {:?}",
        statuses
    );
    assert_eq!(executor.in_flight(), 2);

    executor.wait_for_jobs().await;
    for id in [&first, &second] {
        assert_eq!(executor.status(id).await.unwrap().status, JobStatus::Completed);
    }
}

#[tokio::test]
async fn test_unknown_job_is_not_found() {
    let executor = executor(WorkerConfig::default(), mock_collaborators());
    let err = executor
        .status(&JobId::from_string("does-not-exist"))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkerError::NotFound(_)));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_admission() {
    let executor = executor(WorkerConfig::default(), mock_collaborators());
    let accepted = executor.submit(request()).await.unwrap();

    executor.shutdown().await;

    assert!(!executor.is_ready());
    assert!(matches!(
        executor.submit(request()).await,
        Err(WorkerError::ShuttingDown)
    ));
    let job = executor.status(&accepted.id).await.unwrap();
    assert!(job.is_terminal());
}
