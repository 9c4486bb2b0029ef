//! Job processing configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Job processing configuration.
#[derive(Debug, Clone)]
pub struct JobsConfig {
    /// Root directory holding one working directory per job
    pub outputs_dir: PathBuf,
    /// FFmpeg executable name or path
    pub ffmpeg_path: String,
    /// Per-invocation FFmpeg timeout, unlimited when `None`
    pub processor_timeout: Option<Duration>,
    /// Age after which a job directory is deleted
    pub retention_max_age: Duration,
    /// How often the retention sweep runs
    pub retention_interval: Duration,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            outputs_dir: PathBuf::from("outputs"),
            ffmpeg_path: "ffmpeg".to_string(),
            processor_timeout: None,
            retention_max_age: Duration::from_secs(72 * 3600), // 72 hours
            retention_interval: Duration::from_secs(3600),    // 1 hour
        }
    }
}

impl JobsConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            outputs_dir: std::env::var("OUTPUTS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.outputs_dir),
            ffmpeg_path: std::env::var("FFMPEG_PATH").unwrap_or(defaults.ffmpeg_path),
            processor_timeout: std::env::var("PROCESSOR_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            retention_max_age: std::env::var("RETENTION_MAX_AGE_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.retention_max_age),
            retention_interval: std::env::var("RETENTION_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.retention_interval),
        }
    }
}
