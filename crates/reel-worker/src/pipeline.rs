//! Per-job generation pipeline.
//!
//! A job moves through four phases, each publishing its status and
//! progress through the job's [`JobWriter`]:
//!
//! 1. `ANALYZING_SCRIPT`: split the script into scenes
//! 2. `GENERATING_PROMPTS`: one prompt per scene, template fallback on error
//! 3. `INVOKING_RENDER`: submit one clip per prompt, sequentially
//! 4. `POLLING_CLIPS`: poll every unsettled clip until all settle or the
//!    deadline passes
//!
//! Each clip owns a result slot indexed by submission order. Slots settle
//! independently, so a slow clip never hides a finished one behind it. The
//! final video is the first successful slot in submission order.

use std::sync::Arc;

use rand::Rng;
use tokio::time::{sleep, sleep_until, timeout_at, Instant};

use reel_models::{
    ClipHandle, ClipOutcome, Job, JobStatus, RenderConfig, RenderStatus, MAX_RENDER_SEED,
};

use crate::collaborators::{Collaborators, LocatorSigner, PromptAuthoringService, RenderGateway};
use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::metrics;
use crate::prompts::{fallback_prompt, normalize_prompt, truncate_chars};
use crate::retry::{retry_async, RetryConfig};
use crate::segmentation::SceneSplitter;
use crate::store::JobWriter;

pub const ANALYZING_PROGRESS: &str = "Parsing script and splitting into scenes.";
pub const NO_PROMPTS_PROGRESS: &str = "Failed to generate any prompts from script.";
pub const ALL_CLIPS_FAILED_PROGRESS: &str = "Video generation failed for all clips.";
pub const NOT_SUBMITTED_REASON: &str = "Clip was never submitted.";
pub const DEADLINE_REASON: &str = "Render did not finish before the deadline.";

/// Runs jobs against one set of collaborators.
pub struct Pipeline {
    splitter: SceneSplitter,
    prompt_author: Arc<dyn PromptAuthoringService>,
    render_gateway: Arc<dyn RenderGateway>,
    signer: Arc<dyn LocatorSigner>,
    config: WorkerConfig,
}

impl Pipeline {
    /// Build a pipeline. Fails if a required collaborator is missing.
    pub fn new(collaborators: Collaborators, config: WorkerConfig) -> WorkerResult<Self> {
        let missing = collaborators.missing();
        let (Some(prompt_author), Some(render_gateway), Some(signer)) = (
            collaborators.prompt_author,
            collaborators.render_gateway,
            collaborators.signer,
        ) else {
            return Err(WorkerError::config_error(format!(
                "missing collaborators: {}",
                missing.join(", ")
            )));
        };

        Ok(Self {
            splitter: SceneSplitter::new(collaborators.segmenter),
            prompt_author,
            render_gateway,
            signer,
            config,
        })
    }

    pub fn splitter(&self) -> &SceneSplitter {
        &self.splitter
    }

    /// Drive a job to a terminal state and return the final record.
    ///
    /// Unexpected errors fail the job instead of leaving it stuck in a
    /// non-terminal phase.
    pub async fn run(&self, mut writer: JobWriter) -> Arc<Job> {
        let logger = JobLogger::new(writer.id(), "video_generation");
        logger.log_start(&format!(
            "script '{}...' in style '{}'",
            writer.job().request.script_preview(),
            writer.job().request.style
        ));

        if let Err(e) = self.drive(&mut writer, &logger).await {
            logger.log_error(&e.to_string());
            let progress = format!("Internal error: {}", e);
            if let Err(e) = writer.update(|job| job.fail(progress)).await {
                logger.log_error(&format!("Could not record failure: {}", e));
            }
        }

        let job = writer.snapshot();
        metrics::record_job_finished(job.status);
        match job.status {
            JobStatus::Completed => logger.log_completion(&job.progress),
            _ => logger.log_warning(&format!("finished as {}: {}", job.status, job.progress)),
        }
        job
    }

    async fn drive(&self, writer: &mut JobWriter, logger: &JobLogger) -> WorkerResult<()> {
        let request = writer.job().request.clone();

        // Phase 1: scenes
        writer
            .update(|job| job.advance(JobStatus::AnalyzingScript, ANALYZING_PROGRESS))
            .await?;
        let scenes = self.splitter.split(&request.script).await;
        logger.log_progress(&format!("Split script into {} scenes", scenes.len()));
        writer.update(|job| job.set_scenes(scenes.clone())).await?;
        sleep(self.config.analysis_delay).await;

        // Phase 2: prompts
        writer
            .update(|job| {
                job.advance(
                    JobStatus::GeneratingPrompts,
                    format!("Generating prompts for {} scenes.", scenes.len()),
                )
            })
            .await?;
        let prompts = self
            .author_prompts(writer, logger, &scenes, &request.style)
            .await?;
        writer.update(|job| job.set_prompts(prompts.clone())).await?;
        if prompts.is_empty() {
            writer.update(|job| job.fail(NO_PROMPTS_PROGRESS)).await?;
            return Ok(());
        }

        // Phase 3: submissions
        writer
            .update(|job| {
                job.advance(
                    JobStatus::InvokingRender,
                    format!("Submitting {} clips to the render service.", prompts.len()),
                )
            })
            .await?;
        self.submit_clips(writer, logger, &prompts).await?;

        // Phase 4: polling
        writer
            .update(|job| job.advance(JobStatus::PollingClips, "Waiting for clips to render."))
            .await?;
        self.poll_clips(writer, logger).await?;

        self.assemble(writer).await
    }

    async fn author_prompts(
        &self,
        writer: &mut JobWriter,
        logger: &JobLogger,
        scenes: &[String],
        style: &str,
    ) -> WorkerResult<Vec<String>> {
        let total = scenes.len();
        let max_chars = self.config.max_prompt_chars;
        let mut prompts = Vec::with_capacity(total);

        for (i, scene) in scenes.iter().enumerate() {
            writer
                .update(|job| job.set_progress(format!("Generating prompt {}/{}...", i + 1, total)))
                .await?;

            let authored = match self.prompt_author.author_prompt(scene, style).await {
                Ok(raw) => normalize_prompt(&raw, max_chars),
                Err(e) => {
                    logger.log_warning(&format!("Prompt authoring failed for scene {}: {}", i + 1, e));
                    None
                }
            };
            let prompt = authored.unwrap_or_else(|| {
                truncate_chars(&fallback_prompt(scene, style), max_chars).to_string()
            });
            prompts.push(prompt);

            sleep(self.config.prompt_delay).await;
        }

        Ok(prompts)
    }

    async fn submit_clips(
        &self,
        writer: &mut JobWriter,
        logger: &JobLogger,
        prompts: &[String],
    ) -> WorkerResult<()> {
        let total = prompts.len();

        for (i, prompt) in prompts.iter().enumerate() {
            let position = i + 1;
            writer
                .update(|job| job.set_progress(format!("Submitting clip {}/{}...", position, total)))
                .await?;

            let seed = rand::rng().random_range(0..=MAX_RENDER_SEED);
            let render_config = RenderConfig::with_seed(seed);

            let (handle, progress) = match self.render_gateway.submit(prompt, &render_config).await {
                Ok(handle) => {
                    logger.log_progress(&format!("Clip {}/{} submitted as {}", position, total, handle));
                    (Some(handle), format!("Clip {}/{} submitted.", position, total))
                }
                Err(e) => {
                    logger.log_warning(&format!("Clip {}/{} submission failed: {}", position, total, e));
                    (None, format!("Clip {}/{} submission failed: {}", position, total, e))
                }
            };
            writer
                .update(|job| {
                    job.push_handle(handle)?;
                    job.set_progress(progress)
                })
                .await?;

            if position < total {
                sleep(self.config.submit_delay).await;
            }
        }

        Ok(())
    }

    async fn poll_clips(&self, writer: &mut JobWriter, logger: &JobLogger) -> WorkerResult<()> {
        let deadline = Instant::now() + self.config.poll_deadline;
        let total = writer.job().handles.len();

        'rounds: loop {
            let pending = writer.job().unresolved_slots();
            if pending.is_empty() || Instant::now() >= deadline {
                break;
            }

            for index in pending {
                let position = index + 1;
                let Some(handle) = writer.job().handles[index].clone() else {
                    self.settle_failure(writer, logger, index, total, NOT_SUBMITTED_REASON.to_string())
                        .await?;
                    continue;
                };

                let polled = match timeout_at(deadline, self.poll_once(&handle)).await {
                    Ok(polled) => polled,
                    Err(_) => {
                        logger.log_warning(&format!(
                            "Deadline reached while polling clip {}/{}",
                            position, total
                        ));
                        break 'rounds;
                    }
                };

                match polled {
                    Ok(RenderStatus::InProgress { detail }) => {
                        writer
                            .update(|job| {
                                job.set_progress(format!(
                                    "Waiting on clip {}/{}. Current status: {}.",
                                    position, total, detail
                                ))
                            })
                            .await?;
                    }
                    Ok(RenderStatus::Completed { output }) => {
                        let Ok(signed) = timeout_at(deadline, self.signer.sign(&output)).await else {
                            logger.log_warning(&format!(
                                "Deadline reached while signing clip {}/{}",
                                position, total
                            ));
                            break 'rounds;
                        };
                        match signed {
                            Ok(url) => {
                                writer
                                    .update(|job| {
                                        job.resolve_slot(index, ClipOutcome::success(url))?;
                                        job.set_progress(format!("Clip {}/{} completed.", position, total))
                                    })
                                    .await?;
                                metrics::record_clip_resolved("success");
                            }
                            Err(e) => {
                                self.settle_failure(writer, logger, index, total, format!("Signing failed: {}", e))
                                    .await?;
                            }
                        }
                    }
                    Ok(RenderStatus::Failed { reason }) => {
                        self.settle_failure(writer, logger, index, total, reason).await?;
                    }
                    Err(e) => {
                        self.settle_failure(writer, logger, index, total, format!("Polling error: {}", e))
                            .await?;
                    }
                }
            }

            if writer.job().unresolved_slots().is_empty() {
                break;
            }
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            sleep_until((now + self.config.poll_interval).min(deadline)).await;
        }

        let unresolved = writer.job().unresolved_slots();
        if !unresolved.is_empty() {
            logger.log_warning(&format!(
                "{} of {} clips unresolved at deadline",
                unresolved.len(),
                total
            ));
            writer
                .update(|job| {
                    for &index in &unresolved {
                        let reason = match job.handles[index] {
                            Some(_) => DEADLINE_REASON,
                            None => NOT_SUBMITTED_REASON,
                        };
                        job.resolve_slot(index, ClipOutcome::failure(reason))?;
                    }
                    Ok(())
                })
                .await?;
            for &index in &unresolved {
                let outcome = match writer.job().handles[index] {
                    Some(_) => "timeout",
                    None => "failure",
                };
                metrics::record_clip_resolved(outcome);
            }
        }

        Ok(())
    }

    /// One status check, retrying transient errors.
    async fn poll_once(&self, handle: &ClipHandle) -> WorkerResult<RenderStatus> {
        let retry = RetryConfig::new("render_poll")
            .with_max_retries(self.config.poll_retries)
            .with_base_delay(self.config.poll_retry_base_delay);

        retry_async(&retry, || self.render_gateway.poll(handle), WorkerError::is_retryable)
            .await
            .into_result()
    }

    async fn settle_failure(
        &self,
        writer: &mut JobWriter,
        logger: &JobLogger,
        index: usize,
        total: usize,
        reason: String,
    ) -> WorkerResult<()> {
        let progress = format!("Clip {}/{} FAILED: {}", index + 1, total, reason);
        logger.log_warning(&progress);
        writer
            .update(|job| {
                job.resolve_slot(index, ClipOutcome::failure(reason))?;
                job.set_progress(progress)
            })
            .await?;
        metrics::record_clip_resolved("failure");
        Ok(())
    }

    async fn assemble(&self, writer: &mut JobWriter) -> WorkerResult<()> {
        let (first_url, successes, total) = {
            let job = writer.job();
            let urls = job.successful_urls();
            (
                urls.first().map(|u| u.to_string()),
                urls.len(),
                job.outcomes.len(),
            )
        };

        match first_url {
            Some(url) => {
                let progress = format!("Assembly complete. {}/{} clips successful.", successes, total);
                writer.update(|job| job.complete(url, progress)).await
            }
            None => writer.update(|job| job.fail(ALL_CLIPS_FAILED_PROGRESS)).await,
        }
    }
}
