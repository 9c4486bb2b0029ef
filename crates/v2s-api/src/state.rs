//! Application state.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;
use v2s_jobs::{JobStore, Pipeline};
use v2s_media::{FfmpegRunner, ProcessRunner};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: Arc<JobStore>,
    pub pipeline: Pipeline,
}

impl AppState {
    /// Create application state around an explicit processor.
    pub fn new(config: ApiConfig, runner: Arc<dyn ProcessRunner>) -> Self {
        let store = Arc::new(JobStore::new(&config.jobs.outputs_dir));
        let pipeline = Pipeline::new(Arc::clone(&store), runner);

        Self {
            config,
            store,
            pipeline,
        }
    }

    /// Create application state that runs the configured FFmpeg binary.
    pub fn from_config(config: ApiConfig) -> Self {
        let mut runner = FfmpegRunner::new().with_binary(&config.jobs.ffmpeg_path);
        if let Some(timeout) = config.jobs.processor_timeout {
            runner = runner.with_timeout(timeout.as_secs().max(1));
        }
        if let Err(e) = runner.resolve() {
            warn!("{}; processing requests will fail until it is installed", e);
        }

        Self::new(config, Arc::new(runner))
    }

    pub fn status_push_interval(&self) -> Duration {
        self.config.status_push_interval
    }
}
