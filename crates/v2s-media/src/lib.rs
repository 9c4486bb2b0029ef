//! FFmpeg CLI wrapper for video processing.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - A single invocation primitive ([`ProcessRunner`]) with stderr capture
//! - Stage builders: frame extraction, chroma keying, erosion, GIF and
//!   spritesheet rendering
//! - MP4 content sniffing for uploads

pub mod chroma;
pub mod command;
pub mod error;
pub mod filters;
pub mod frames;
pub mod render;
pub mod sniff;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use chroma::{chroma_key, erode};
pub use command::{FfmpegCommand, FfmpegRunner, ProcessRunner};
pub use error::{MediaError, MediaResult};
pub use frames::{extract_frames, list_frames, require_frames, reset_dir, FRAME_PATTERN};
pub use render::{make_gif, make_spritesheet};
pub use sniff::is_mp4;
