//! Job registry.
//!
//! One mutex guards the whole map for reads and writes alike. Every status
//! change is written to the job's `status.json` while the lock is still
//! held, so the file on disk always reflects the latest mutation. The single
//! lock is also the contention point once many jobs update concurrently.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use v2s_models::{JobId, JobStatus, OutputKind, ProcessParams, StepName, StepState};

use crate::error::{JobError, JobResult};
use crate::job::Job;
use crate::metrics;

/// Name used when an upload carries no usable file name.
const FALLBACK_INPUT_NAME: &str = "input.mp4";

/// Owns every known job for the lifetime of the process.
#[derive(Debug)]
pub struct JobStore {
    root: PathBuf,
    jobs: Mutex<HashMap<JobId, Job>>,
}

impl JobStore {
    /// Create a store whose job directories live under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            jobs: Mutex::new(HashMap::new()),
        }
    }

    /// Directory holding one working directory per job.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Register a new job for an uploaded video.
    ///
    /// The working directory, the payload and the initial status document are
    /// written before the job is registered, so a failure leaves the registry
    /// unchanged.
    pub async fn create(
        &self,
        file_name: &str,
        payload: &[u8],
        params: ProcessParams,
    ) -> JobResult<Job> {
        let input_name = Path::new(file_name)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .unwrap_or(FALLBACK_INPUT_NAME);

        let mut job = Job::new(JobId::new(), &self.root, input_name);
        job.params = params;

        if let Err(e) = write_job_files(&job, payload).await {
            let _ = fs::remove_dir_all(&job.dir).await;
            return Err(e);
        }

        self.jobs.lock().await.insert(job.id.clone(), job.clone());
        metrics::record_job_created();
        info!(job_id = %job.id, input = %job.input_path.display(), "Created job");
        Ok(job)
    }

    /// Snapshot of a job, `None` when unknown or expired.
    pub async fn get(&self, id: &JobId) -> Option<Job> {
        self.jobs.lock().await.get(id).cloned()
    }

    /// Current status of a job.
    pub async fn status(&self, id: &JobId) -> Option<JobStatus> {
        self.jobs.lock().await.get(id).map(|job| job.status.clone())
    }

    /// Set a step's state by name and persist.
    ///
    /// Names outside the four tracked steps (e.g. `erosion`) are ignored.
    pub async fn update_step(&self, id: &JobId, name: &str, state: StepState) -> JobResult<()> {
        match name.parse::<StepName>() {
            Ok(step) => self.set_step(id, step, state).await,
            Err(e) => {
                debug!(job_id = %id, "Ignoring update: {}", e);
                Ok(())
            }
        }
    }

    /// Set a tracked step's state and persist.
    ///
    /// Transitions that would move a step backwards are dropped with a
    /// warning; the status keeps its previous value. The in-memory status
    /// only changes once the new document is on disk.
    pub async fn set_step(&self, id: &JobId, step: StepName, state: StepState) -> JobResult<()> {
        let mut jobs = self.jobs.lock().await;
        let job = jobs.get_mut(id).ok_or_else(|| JobError::NotFound(id.clone()))?;

        let mut status = job.status.clone();
        if !status.set_step(step, state) {
            warn!(
                job_id = %id,
                step = %step,
                "Rejected step transition {} -> {}", job.status.step(step), state
            );
            return Ok(());
        }

        persist(&job.status_path(), &status).await?;
        job.status = status;
        Ok(())
    }

    /// Record the locator of a produced artifact and persist.
    pub async fn set_output(&self, id: &JobId, kind: OutputKind, locator: String) -> JobResult<()> {
        let mut jobs = self.jobs.lock().await;
        let job = jobs.get_mut(id).ok_or_else(|| JobError::NotFound(id.clone()))?;

        let mut status = job.status.clone();
        status.set_output(kind, locator);
        persist(&job.status_path(), &status).await?;
        job.status = status;
        Ok(())
    }

    /// Claim a job for a pipeline run.
    ///
    /// Stores the run's parameters and resets the status to all-pending.
    pub async fn begin_run(&self, id: &JobId, params: ProcessParams) -> JobResult<Job> {
        let mut jobs = self.jobs.lock().await;
        let job = jobs.get_mut(id).ok_or_else(|| JobError::NotFound(id.clone()))?;
        if job.running {
            return Err(JobError::AlreadyRunning(id.clone()));
        }

        let status = JobStatus::new(id.clone());
        persist(&job.status_path(), &status).await?;

        job.running = true;
        job.params = params;
        job.status = status;
        Ok(job.clone())
    }

    /// Release a job claimed by [`JobStore::begin_run`].
    pub async fn finish_run(&self, id: &JobId) {
        if let Some(job) = self.jobs.lock().await.get_mut(id) {
            job.running = false;
        }
    }

    /// Forget a job unless a pipeline run holds it.
    ///
    /// Returns `false` while the job is running. An id the store does not
    /// know counts as evicted. Files are left to the caller.
    pub async fn evict_if_idle(&self, id: &JobId) -> bool {
        let mut jobs = self.jobs.lock().await;
        match jobs.get(id) {
            Some(job) if job.running => false,
            Some(_) => {
                jobs.remove(id);
                true
            }
            None => true,
        }
    }

    pub async fn len(&self) -> usize {
        self.jobs.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.lock().await.is_empty()
    }
}

async fn write_job_files(job: &Job, payload: &[u8]) -> JobResult<()> {
    fs::create_dir_all(&job.dir).await?;
    fs::write(&job.input_path, payload).await?;
    persist(&job.status_path(), &job.status).await
}

/// Overwrite `status.json` with `status`.
///
/// Written to a sibling temp file and renamed, so a reader never sees a
/// partial document.
async fn persist(path: &Path, status: &JobStatus) -> JobResult<()> {
    let json = serde_json::to_vec_pretty(status)?;
    let tmp = path.with_extension("json.tmp");

    fs::write(&tmp, json).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}
