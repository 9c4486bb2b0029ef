//! Pipeline metrics.
//!
//! Recorded through the `metrics` facade; they are only exported when the
//! binary installs a recorder.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const JOBS_CREATED_TOTAL: &str = "v2s_jobs_created_total";
    pub const JOBS_COMPLETED_TOTAL: &str = "v2s_jobs_completed_total";
    pub const JOBS_FAILED_TOTAL: &str = "v2s_jobs_failed_total";
    pub const STAGE_DURATION_SECONDS: &str = "v2s_stage_duration_seconds";
    pub const JOBS_EXPIRED_TOTAL: &str = "v2s_jobs_expired_total";
}

/// Record a new upload.
pub fn record_job_created() {
    counter!(names::JOBS_CREATED_TOTAL).increment(1);
}

/// Record a run where every stage succeeded.
pub fn record_job_completed() {
    counter!(names::JOBS_COMPLETED_TOTAL).increment(1);
}

/// Record a run that stopped at `stage`.
pub fn record_job_failed(stage: &str) {
    let labels = [("stage", stage.to_string())];
    counter!(names::JOBS_FAILED_TOTAL, &labels).increment(1);
}

/// Record how long one stage took.
pub fn record_stage_duration(stage: &str, duration_secs: f64) {
    let labels = [("stage", stage.to_string())];
    histogram!(names::STAGE_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record job directories removed by retention.
pub fn record_jobs_expired(count: u64) {
    counter!(names::JOBS_EXPIRED_TOTAL).increment(count);
}
