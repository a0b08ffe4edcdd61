//! Application state.

use std::sync::Arc;

use tracing::{info, warn};

use reel_worker::stub::mock_collaborators;
use reel_worker::{Collaborators, JobExecutor, JobStore, WorkerConfig};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub executor: Arc<JobExecutor>,
}

impl AppState {
    pub fn new(config: ApiConfig, executor: Arc<JobExecutor>) -> Self {
        Self { config, executor }
    }

    /// Build the executor and its collaborators from configuration.
    ///
    /// Mock mode wires stub collaborators with short timings; otherwise the
    /// real adapters are read from the environment.
    pub fn from_config(config: ApiConfig, worker_config: WorkerConfig) -> Self {
        let (worker_config, collaborators) = if config.mock_mode {
            warn!("API_MOCK_MODE enabled: using stub collaborators");
            (worker_config.mock_mode(), mock_collaborators())
        } else {
            let collaborators = Collaborators::from_env(&worker_config);
            (worker_config, collaborators)
        };

        let executor = JobExecutor::new(worker_config, Arc::new(JobStore::new()), collaborators);
        if executor.is_ready() {
            info!("Video generation ready");
        } else {
            warn!(
                "Video generation not configured, missing: {}",
                executor.missing_collaborators().join(", ")
            );
        }

        Self::new(config, Arc::new(executor))
    }
}
