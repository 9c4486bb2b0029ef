//! Background removal of expired job directories.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::fs;
use tokio::time::interval;
use tracing::{debug, error, info, warn};
use v2s_models::JobId;

use crate::config::JobsConfig;
use crate::metrics;
use crate::store::JobStore;

/// Periodically deletes job directories older than the retention age.
pub struct RetentionSweeper {
    store: Arc<JobStore>,
    max_age: Duration,
    interval: Duration,
}

impl RetentionSweeper {
    pub fn new(store: Arc<JobStore>, config: &JobsConfig) -> Self {
        Self::with_settings(store, config.retention_max_age, config.retention_interval)
    }

    pub fn with_settings(store: Arc<JobStore>, max_age: Duration, interval: Duration) -> Self {
        Self {
            store,
            max_age,
            interval,
        }
    }

    /// Start the sweep loop.
    ///
    /// This function runs indefinitely and should be spawned as a background task.
    pub async fn run(&self) {
        info!(
            "Starting retention sweeper (max age: {:?}, interval: {:?})",
            self.max_age, self.interval
        );

        let mut ticker = interval(self.interval);

        loop {
            ticker.tick().await;

            if let Err(e) = self.sweep_once().await {
                error!("Retention sweep error: {}", e);
            }
        }
    }

    /// Run a single sweep, returning the number of directories removed.
    ///
    /// Entries that disappear mid-sweep are skipped. Jobs with a pipeline run
    /// in progress are left alone until a later sweep.
    pub async fn sweep_once(&self) -> anyhow::Result<usize> {
        let root = self.store.root();
        let mut entries = match fs::read_dir(root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let now = SystemTime::now();
        let mut removed = 0usize;

        while let Some(entry) = entries.next_entry().await? {
            let metadata = match entry.metadata().await {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    warn!(path = %entry.path().display(), "Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !metadata.is_dir() {
                continue;
            }

            let age = metadata
                .modified()
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .unwrap_or_default();
            if age <= self.max_age {
                continue;
            }

            // Evicting under the store lock first means no run can claim the
            // job while its directory is being deleted.
            let name = entry.file_name();
            if let Some(id) = name.to_str().and_then(JobId::parse) {
                if !self.store.evict_if_idle(&id).await {
                    debug!(job_id = %id, "Skipping expired job with a run in progress");
                    continue;
                }
            }

            match fs::remove_dir_all(entry.path()).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %entry.path().display(), "Failed to remove expired job: {}", e);
                    continue;
                }
            }

            info!(path = %entry.path().display(), age_secs = age.as_secs(), "Removed expired job");
        }

        if removed > 0 {
            metrics::record_jobs_expired(removed as u64);
            info!("Retention sweep complete: {} removed", removed);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use v2s_models::ProcessParams;

    use crate::error::JobError;
    use crate::job::STATUS_FILE;

    async fn store_with_job(dir: &TempDir) -> (Arc<JobStore>, JobId) {
        let store = Arc::new(JobStore::new(dir.path()));
        let job = store
            .create("clip.mp4", b"video", ProcessParams::default())
            .await
            .unwrap();
        (store, job.id)
    }

    #[tokio::test]
    async fn test_keeps_young_jobs() {
        let dir = TempDir::new().unwrap();
        let (store, id) = store_with_job(&dir).await;
        let sweeper =
            RetentionSweeper::with_settings(store.clone(), Duration::from_secs(3600), Duration::from_secs(60));

        assert_eq!(sweeper.sweep_once().await.unwrap(), 0);
        assert!(store.get(&id).await.is_some());
        assert!(dir.path().join(id.as_str()).exists());
    }

    #[tokio::test]
    async fn test_removes_expired_jobs() {
        let dir = TempDir::new().unwrap();
        let (store, id) = store_with_job(&dir).await;
        fs::create_dir(dir.path().join("stray")).await.unwrap();
        fs::write(dir.path().join("notes.txt"), b"kept").await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let sweeper =
            RetentionSweeper::with_settings(store.clone(), Duration::ZERO, Duration::from_secs(60));

        assert_eq!(sweeper.sweep_once().await.unwrap(), 2);
        assert!(store.get(&id).await.is_none());
        assert!(!dir.path().join(id.as_str()).exists());
        assert!(!dir.path().join("stray").exists());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[tokio::test]
    async fn test_skips_running_jobs() {
        let dir = TempDir::new().unwrap();
        let (store, id) = store_with_job(&dir).await;
        store.begin_run(&id, ProcessParams::default()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let sweeper =
            RetentionSweeper::with_settings(store.clone(), Duration::ZERO, Duration::from_secs(60));

        assert_eq!(sweeper.sweep_once().await.unwrap(), 0);
        assert!(store.get(&id).await.is_some());
    }

    #[tokio::test]
    async fn test_missing_root_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(JobStore::new(dir.path().join("missing")));
        let sweeper = RetentionSweeper::with_settings(store, Duration::ZERO, Duration::from_secs(60));

        assert_eq!(sweeper.sweep_once().await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_sweep_racing_a_run_claim() {
        for _ in 0..10 {
            let dir = TempDir::new().unwrap();
            let (store, id) = store_with_job(&dir).await;
            tokio::time::sleep(Duration::from_millis(20)).await;
            let sweeper =
                RetentionSweeper::with_settings(store.clone(), Duration::ZERO, Duration::from_secs(60));

            let claim = {
                let store = store.clone();
                let id = id.clone();
                tokio::spawn(async move { store.begin_run(&id, ProcessParams::default()).await })
            };
            let swept = sweeper.sweep_once().await.unwrap();

            match claim.await.unwrap() {
                Ok(job) => {
                    // The run won: its record and working directory survive.
                    assert_eq!(swept, 0);
                    assert!(store.get(&id).await.is_some_and(|job| job.running));
                    assert!(job.dir.join(STATUS_FILE).exists());
                }
                Err(JobError::NotFound(_)) => {
                    assert_eq!(swept, 1);
                    assert!(store.get(&id).await.is_none());
                    assert!(!dir.path().join(id.as_str()).exists());
                }
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
    }
}
