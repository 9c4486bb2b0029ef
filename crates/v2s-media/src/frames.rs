//! Frame extraction and frame directory helpers.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::command::{FfmpegCommand, ProcessRunner};
use crate::error::{MediaError, MediaResult};
use crate::filters::fps_filter;

/// Output pattern for extracted frames.
pub const FRAME_PATTERN: &str = "frame_%04d.png";

const FRAME_PREFIX: &str = "frame_";
const FRAME_EXT: &str = ".png";

/// Decode `input` into `frame_0001.png`, `frame_0002.png`, ... inside
/// `frames_dir`.
pub async fn extract_frames(
    runner: &dyn ProcessRunner,
    input: impl AsRef<Path>,
    frames_dir: impl AsRef<Path>,
    fps: u32,
    width: Option<u32>,
) -> MediaResult<()> {
    let frames_dir = frames_dir.as_ref();
    fs::create_dir_all(frames_dir).await?;

    let cmd = FfmpegCommand::new(input, frames_dir.join(FRAME_PATTERN))
        .video_filter(fps_filter(fps, width));

    runner.run(&cmd).await
}

/// Sorted list of extracted frames in `dir`.
///
/// Only `frame_*.png` files count; in-flight `temp_` files and anything else
/// are skipped.
pub async fn list_frames(dir: impl AsRef<Path>) -> MediaResult<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let mut entries = fs::read_dir(dir).await?;
    let mut frames = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if name.starts_with(FRAME_PREFIX) && name.ends_with(FRAME_EXT) {
            frames.push(entry.path());
        }
    }

    frames.sort();
    Ok(frames)
}

/// Like [`list_frames`] but fails when the directory has no frames.
pub async fn require_frames(dir: impl AsRef<Path>) -> MediaResult<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let frames = list_frames(dir).await?;
    if frames.is_empty() {
        return Err(MediaError::NoFrames(dir.to_path_buf()));
    }
    Ok(frames)
}

/// Remove `dir` and everything in it, then recreate it empty.
pub async fn reset_dir(dir: impl AsRef<Path>) -> MediaResult<()> {
    let dir = dir.as_ref();
    match fs::remove_dir_all(dir).await {
        Ok(()) => debug!("Cleared {}", dir.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    fs::create_dir_all(dir).await?;
    Ok(())
}

/// File name of a frame path, for error context.
pub(crate) fn frame_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
