//! Processing pipeline.
//!
//! Five stages run strictly in order against one job's working directory:
//!
//! 1. extract frames from the uploaded video into `frames/` (an empty result
//!    fails here)
//! 2. chroma key every frame in place
//! 3. erode every keyed frame into `clean/` (reported as part of `chroma`)
//! 4. assemble `clean/` into `final.gif`
//! 5. tile `frames/` into `spritesheet.png`
//!
//! The spritesheet is built from the keyed but un-eroded frames while the
//! GIF uses the eroded ones. The first failing stage marks its step `error`
//! and ends the run; completed stages are not rolled back.

use std::fmt;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tokio::fs;
use tracing::Instrument;
use v2s_media::{
    chroma_key, erode, extract_frames, make_gif, make_spritesheet, require_frames, reset_dir,
    MediaError, MediaResult, ProcessRunner,
};
use v2s_models::{JobId, JobStatus, OutputKind, ProcessParams, StepName, StepState};

use crate::error::{JobError, JobResult};
use crate::job::Job;
use crate::logging::RunLogger;
use crate::metrics;
use crate::store::JobStore;

/// A unit of pipeline work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ExtractFrames,
    Chroma,
    Erosion,
    Gif,
    Spritesheet,
}

impl Stage {
    /// The tracked step this stage reports under.
    pub fn step(&self) -> StepName {
        match self {
            Stage::ExtractFrames => StepName::ExtractFrames,
            Stage::Chroma | Stage::Erosion => StepName::Chroma,
            Stage::Gif => StepName::Gif,
            Stage::Spritesheet => StepName::Spritesheet,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::ExtractFrames => "extract_frames",
            Stage::Chroma => "chroma",
            Stage::Erosion => "erosion",
            Stage::Gif => "gif",
            Stage::Spritesheet => "spritesheet",
        }
    }

    /// User-facing summary of a failure in this stage.
    pub fn failure_message(&self) -> &'static str {
        match self {
            Stage::ExtractFrames => "Failed to extract frames",
            Stage::Chroma => "Failed to process chroma",
            Stage::Erosion => "Failed to process erosion",
            Stage::Gif => "Failed to create GIF",
            Stage::Spritesheet => "Failed to create spritesheet",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runs the processing stages for jobs held in a [`JobStore`].
#[derive(Clone)]
pub struct Pipeline {
    store: Arc<JobStore>,
    runner: Arc<dyn ProcessRunner>,
}

impl Pipeline {
    pub fn new(store: Arc<JobStore>, runner: Arc<dyn ProcessRunner>) -> Self {
        Self { store, runner }
    }

    /// Process a job from the first stage to the last.
    ///
    /// Every run starts over: previous outputs are cleared and the status is
    /// reset to all-pending. Parameters are validated before the job is
    /// touched. Returns the final status, or the first stage failure.
    pub async fn run(&self, id: &JobId, params: ProcessParams) -> JobResult<JobStatus> {
        params.validate()?;

        let job = self.store.begin_run(id, params).await?;
        let log = RunLogger::new(id);
        log.started(&job);

        let started = Instant::now();
        let result = self.run_stages(&job, &log).instrument(log.span()).await;
        self.store.finish_run(id).await;

        match &result {
            Ok(()) => {
                metrics::record_job_completed();
                log.finished(started.elapsed());
            }
            Err(JobError::Stage { stage, .. }) => {
                metrics::record_job_failed(stage.as_str());
            }
            Err(e) => log.failed(e),
        }
        result?;

        self.store
            .status(id)
            .await
            .ok_or_else(|| JobError::NotFound(id.clone()))
    }

    async fn run_stages(&self, job: &Job, log: &RunLogger) -> JobResult<()> {
        let runner = self.runner.as_ref();
        let key = job.params.chroma_key()?;
        let layout = job.params.tile_layout()?;
        let fps = job.params.frame_rate();
        let frames_dir = job.frames_dir();
        let clean_dir = job.clean_dir();
        let gif_path = job.output_path(OutputKind::Gif);
        let sheet_path = job.output_path(OutputKind::Spritesheet);

        // Leftovers from an earlier run would be picked up by the frame globs.
        if let Err(source) = clear_outputs(job).await {
            return Err(self.fail(job, log, Stage::ExtractFrames, source).await);
        }

        self.begin(job, log, Stage::ExtractFrames).await?;
        self.stage(job, log, Stage::ExtractFrames, async {
            extract_frames(runner, &job.input_path, &frames_dir, fps, job.params.target_width())
                .await?;
            require_frames(&frames_dir).await?;
            Ok::<_, MediaError>(())
        })
        .await?;
        self.complete(job, log, Stage::ExtractFrames).await?;

        self.begin(job, log, Stage::Chroma).await?;
        self.stage(job, log, Stage::Chroma, chroma_key(runner, &frames_dir, &key))
            .await?;
        self.stage(job, log, Stage::Erosion, erode(runner, &frames_dir, &clean_dir))
            .await?;
        self.complete(job, log, Stage::Chroma).await?;

        self.begin(job, log, Stage::Gif).await?;
        self.stage(
            job,
            log,
            Stage::Gif,
            make_gif(runner, &clean_dir, &gif_path, fps, &key),
        )
        .await?;
        self.publish(job, log, Stage::Gif, OutputKind::Gif).await?;
        self.complete(job, log, Stage::Gif).await?;

        self.begin(job, log, Stage::Spritesheet).await?;
        self.stage(
            job,
            log,
            Stage::Spritesheet,
            make_spritesheet(runner, &frames_dir, &sheet_path, &layout),
        )
        .await?;
        self.publish(job, log, Stage::Spritesheet, OutputKind::Spritesheet)
            .await?;
        self.complete(job, log, Stage::Spritesheet).await?;

        Ok(())
    }

    async fn begin(&self, job: &Job, log: &RunLogger, stage: Stage) -> JobResult<()> {
        let write = self.store.set_step(&job.id, stage.step(), StepState::Running);
        self.record(job, log, stage, write).await
    }

    async fn complete(&self, job: &Job, log: &RunLogger, stage: Stage) -> JobResult<()> {
        let write = self.store.set_step(&job.id, stage.step(), StepState::Done);
        self.record(job, log, stage, write).await
    }

    /// Record the locator of the artifact `stage` produced.
    async fn publish(
        &self,
        job: &Job,
        log: &RunLogger,
        stage: Stage,
        kind: OutputKind,
    ) -> JobResult<()> {
        let write = self
            .store
            .set_output(&job.id, kind, job.locator(kind.file_name()));
        self.record(job, log, stage, write).await
    }

    /// Await a status write made on behalf of `stage`.
    ///
    /// A write that cannot reach disk fails the stage like any other I/O
    /// error.
    async fn record(
        &self,
        job: &Job,
        log: &RunLogger,
        stage: Stage,
        write: impl Future<Output = JobResult<()>>,
    ) -> JobResult<()> {
        match write.await {
            Ok(()) => Ok(()),
            Err(JobError::Io(source)) => Err(self.fail(job, log, stage, source.into()).await),
            Err(err) => {
                self.mark_error(job, log, stage).await;
                Err(err)
            }
        }
    }

    /// Await one stage, marking its step `error` if it fails.
    async fn stage<T>(
        &self,
        job: &Job,
        log: &RunLogger,
        stage: Stage,
        work: impl Future<Output = MediaResult<T>>,
    ) -> JobResult<T> {
        let started = Instant::now();
        match work.await {
            Ok(value) => {
                let elapsed = started.elapsed();
                metrics::record_stage_duration(stage.as_str(), elapsed.as_secs_f64());
                log.stage_done(stage, elapsed);
                Ok(value)
            }
            Err(source) => Err(self.fail(job, log, stage, source).await),
        }
    }

    /// Mark the stage's step `error` and build the error to return.
    async fn fail(&self, job: &Job, log: &RunLogger, stage: Stage, source: MediaError) -> JobError {
        let err = JobError::stage(stage, source);
        log.failed(&err);
        self.mark_error(job, log, stage).await;
        err
    }

    async fn mark_error(&self, job: &Job, log: &RunLogger, stage: Stage) {
        if let Err(e) = self
            .store
            .set_step(&job.id, stage.step(), StepState::Error)
            .await
        {
            log.unrecorded_failure(stage, &e);
        }
    }
}

/// Remove every stage output so a run starts from an empty layout.
async fn clear_outputs(job: &Job) -> MediaResult<()> {
    reset_dir(job.frames_dir()).await?;
    reset_dir(job.clean_dir()).await?;
    remove_if_exists(&job.output_path(OutputKind::Gif)).await?;
    remove_if_exists(&job.output_path(OutputKind::Spritesheet)).await?;
    Ok(())
}

async fn remove_if_exists(path: &Path) -> MediaResult<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
