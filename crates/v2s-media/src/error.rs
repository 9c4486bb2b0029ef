//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during media processing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found: {0}")]
    FfmpegNotFound(String),

    /// The external process ran and exited non-zero. `stderr` is the
    /// verbatim diagnostic output.
    #[error("FFmpeg command failed: {message}: {}", .stderr.trim())]
    FfmpegFailed {
        message: String,
        stderr: String,
        exit_code: Option<i32>,
    },

    #[error("No frames found in {}", .0.display())]
    NoFrames(PathBuf),

    #[error("Failed to process {file}: {source}")]
    Frame {
        file: String,
        #[source]
        source: Box<MediaError>,
    },

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: impl Into<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr: stderr.into(),
            exit_code,
        }
    }

    /// Attach the frame file name an error happened on.
    pub fn for_frame(self, file: impl Into<String>) -> Self {
        Self::Frame {
            file: file.into(),
            source: Box::new(self),
        }
    }

    /// Captured diagnostic text of the failing invocation, if any.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            Self::FfmpegFailed { stderr, .. } => Some(stderr),
            Self::Frame { source, .. } => source.diagnostics(),
            _ => None,
        }
    }
}
