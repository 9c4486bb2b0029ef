//! Background removal and alpha cleanup.

use std::path::Path;

use tokio::fs;
use tracing::debug;
use v2s_models::ChromaKey;

use crate::command::{FfmpegCommand, ProcessRunner};
use crate::error::MediaResult;
use crate::filters::{chroma_filter, EROSION_FILTER};
use crate::frames::{frame_name, list_frames};

const TEMP_PREFIX: &str = "temp_";

/// Key out the background of every frame in `frames_dir`, in place.
///
/// Each frame is rendered to a `temp_` sibling and renamed over the
/// original, so a failure never leaves a half-written frame behind.
pub async fn chroma_key(
    runner: &dyn ProcessRunner,
    frames_dir: impl AsRef<Path>,
    key: &ChromaKey,
) -> MediaResult<usize> {
    let frames_dir = frames_dir.as_ref();
    let filter = chroma_filter(key);
    let frames = list_frames(frames_dir).await?;

    for frame in &frames {
        let name = frame_name(frame);
        let temp = frames_dir.join(format!("{}{}", TEMP_PREFIX, name));

        let cmd = FfmpegCommand::new(frame, &temp).video_filter(&filter);
        if let Err(e) = runner.run(&cmd).await {
            let _ = fs::remove_file(&temp).await;
            return Err(e.for_frame(name));
        }

        fs::rename(&temp, frame)
            .await
            .map_err(|e| crate::MediaError::from(e).for_frame(name))?;
    }

    debug!("Chroma keyed {} frames in {}", frames.len(), frames_dir.display());
    Ok(frames.len())
}

/// Write an eroded copy of every frame in `frames_dir` into `clean_dir`.
pub async fn erode(
    runner: &dyn ProcessRunner,
    frames_dir: impl AsRef<Path>,
    clean_dir: impl AsRef<Path>,
) -> MediaResult<usize> {
    let frames_dir = frames_dir.as_ref();
    let clean_dir = clean_dir.as_ref();
    fs::create_dir_all(clean_dir).await?;

    let frames = list_frames(frames_dir).await?;
    for frame in &frames {
        let name = frame_name(frame);
        let cmd = FfmpegCommand::new(frame, clean_dir.join(&name)).video_filter(EROSION_FILTER);
        runner.run(&cmd).await.map_err(|e| e.for_frame(name))?;
    }

    debug!("Eroded {} frames into {}", frames.len(), clean_dir.display());
    Ok(frames.len())
}
