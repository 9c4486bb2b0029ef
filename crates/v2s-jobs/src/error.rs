//! Job error types.

use thiserror::Error;
use v2s_media::MediaError;
use v2s_models::{JobId, ParamsError};

use crate::pipeline::Stage;

pub type JobResult<T> = Result<T, JobError>;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("Job not found: {0}")]
    NotFound(JobId),

    #[error("Job {0} is already being processed")]
    AlreadyRunning(JobId),

    #[error("Invalid parameters: {0}")]
    InvalidParams(#[from] ParamsError),

    /// A pipeline stage failed; the message names the stage and carries the
    /// processor's diagnostics.
    #[error("{}: {source}", .stage.failure_message())]
    Stage {
        stage: Stage,
        #[source]
        source: MediaError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl JobError {
    pub fn stage(stage: Stage, source: impl Into<MediaError>) -> Self {
        Self::Stage {
            stage,
            source: source.into(),
        }
    }
}
