//! Shared data models for the video-to-spritesheet backend.
//!
//! This crate provides Serde-serializable types for:
//! - Job identifiers
//! - Pipeline status documents (`status.json` and the status push channel)
//! - Process parameters and their defaults

pub mod job;
pub mod params;
pub mod status;

// Re-export common types
pub use job::JobId;
pub use params::{
    ChromaKey, ParamsError, ProcessParams, TileLayout, DEFAULT_BLEND, DEFAULT_CHROMA_COLOR,
    DEFAULT_FPS, DEFAULT_SIMILARITY, DEFAULT_TILE, GIF_DISPLAY_WIDTH,
};
pub use status::{JobStatus, OutputKind, Step, StepName, StepState, UnknownStep};
