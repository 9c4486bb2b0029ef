//! Structured logging for pipeline runs.
//!
//! Every event carries the job id so one run can be followed through
//! interleaved output; stage events also carry the stage name.

use std::time::Duration;

use tracing::{error, info, warn, Span};
use v2s_models::JobId;

use crate::error::JobError;
use crate::job::Job;
use crate::pipeline::Stage;

/// Logger bound to one pipeline run.
#[derive(Debug, Clone)]
pub struct RunLogger {
    job_id: JobId,
}

impl RunLogger {
    pub fn new(job_id: &JobId) -> Self {
        Self {
            job_id: job_id.clone(),
        }
    }

    /// Span wrapping the stages of the run.
    pub fn span(&self) -> Span {
        tracing::info_span!("pipeline_run", job_id = %self.job_id)
    }

    pub fn started(&self, job: &Job) {
        info!(
            job_id = %self.job_id,
            input = %job.input_name(),
            fps = job.params.frame_rate(),
            size = job.params.size,
            tile = %job.params.tile,
            "Pipeline run started"
        );
    }

    pub fn stage_done(&self, stage: Stage, elapsed: Duration) {
        info!(
            job_id = %self.job_id,
            stage = %stage,
            elapsed_ms = elapsed.as_millis() as u64,
            "Stage done"
        );
    }

    pub fn failed(&self, err: &JobError) {
        error!(job_id = %self.job_id, "Pipeline run failed: {}", err);
    }

    /// The `error` state of a failed stage could not be stored.
    pub fn unrecorded_failure(&self, stage: Stage, err: &JobError) {
        warn!(
            job_id = %self.job_id,
            stage = %stage,
            "Could not record stage failure: {}", err
        );
    }

    pub fn finished(&self, elapsed: Duration) {
        info!(
            job_id = %self.job_id,
            elapsed_ms = elapsed.as_millis() as u64,
            "Pipeline run finished"
        );
    }
}
