//! Upload validation.

use std::path::Path;

use v2s_media::is_mp4;

use crate::error::{ApiError, ApiResult};

/// Accepted upload extension.
const VIDEO_EXTENSION: &str = "mp4";

/// Check an uploaded video before a job is created for it.
///
/// Both the file name and the content must say MP4.
pub fn validate_upload(file_name: &str, data: &[u8]) -> ApiResult<()> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    if ext != VIDEO_EXTENSION {
        return Err(ApiError::unsupported_media_type(format!(
            "Only .mp4 files are accepted, got '{}'",
            file_name
        )));
    }

    if !is_mp4(data) {
        return Err(ApiError::unsupported_media_type(
            "File content is not an MP4 video",
        ));
    }

    Ok(())
}
