//! Final artifact rendering: animated GIF and spritesheet.

use std::path::Path;

use v2s_models::{ChromaKey, TileLayout, GIF_DISPLAY_WIDTH};

use crate::command::{FfmpegCommand, ProcessRunner};
use crate::error::MediaResult;
use crate::filters::{gif_filter, tile_filter};
use crate::frames::{require_frames, FRAME_PATTERN};

/// Assemble the frames in `frames_dir` into a looping, transparent GIF.
pub async fn make_gif(
    runner: &dyn ProcessRunner,
    frames_dir: impl AsRef<Path>,
    output: impl AsRef<Path>,
    fps: u32,
    key: &ChromaKey,
) -> MediaResult<()> {
    let frames_dir = frames_dir.as_ref();
    require_frames(frames_dir).await?;

    let cmd = FfmpegCommand::new(frames_dir.join(FRAME_PATTERN), output)
        .input_framerate(fps)
        .filter_complex(gif_filter(key, GIF_DISPLAY_WIDTH))
        .output_arg("-loop")
        .output_arg("0");

    runner.run(&cmd).await
}

/// Tile the frames in `frames_dir` into a single image.
///
/// Frames beyond the grid's capacity are not drawn; FFmpeg only emits the
/// first sheet.
pub async fn make_spritesheet(
    runner: &dyn ProcessRunner,
    frames_dir: impl AsRef<Path>,
    output: impl AsRef<Path>,
    layout: &TileLayout,
) -> MediaResult<()> {
    let frames_dir = frames_dir.as_ref();
    require_frames(frames_dir).await?;

    let cmd = FfmpegCommand::new(frames_dir.join("frame_*.png"), output)
        .glob_input()
        .filter_complex(tile_filter(layout))
        .single_frame();

    runner.run(&cmd).await
}
