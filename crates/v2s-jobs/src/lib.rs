//! Job bookkeeping and processing for the video-to-spritesheet backend.
//!
//! - [`JobStore`]: the job registry and its on-disk `status.json` projection
//! - [`Pipeline`]: runs the five processing stages for one job
//! - [`RetentionSweeper`]: removes expired job directories

pub mod config;
pub mod error;
pub mod job;
mod logging;
pub mod metrics;
pub mod pipeline;
pub mod retention;
pub mod store;

pub use config::JobsConfig;
pub use error::{JobError, JobResult};
pub use job::{locator, Job, CLEAN_DIR, FRAMES_DIR, OUTPUTS_ROUTE, STATUS_FILE};
pub use pipeline::{Pipeline, Stage};
pub use retention::RetentionSweeper;
pub use store::JobStore;
