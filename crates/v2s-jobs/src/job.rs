//! Job record and working-directory layout.

use std::path::{Path, PathBuf};

use v2s_models::{JobId, JobStatus, OutputKind, ProcessParams};

/// URL prefix under which job directories are served.
pub const OUTPUTS_ROUTE: &str = "/outputs";
/// Status document written after every mutation.
pub const STATUS_FILE: &str = "status.json";
/// Extracted (then chroma-keyed in place) frames.
pub const FRAMES_DIR: &str = "frames";
/// Eroded frames.
pub const CLEAN_DIR: &str = "clean";

/// Locator of a file inside a job directory.
pub fn locator(id: &JobId, file: &str) -> String {
    format!("{}/{}/{}", OUTPUTS_ROUTE, id, file)
}

/// One uploaded video and its processing state.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    /// Working directory, named after the id
    pub dir: PathBuf,
    /// Uploaded video inside `dir`
    pub input_path: PathBuf,
    /// Parameters of the latest run
    pub params: ProcessParams,
    pub status: JobStatus,
    /// A pipeline run is in progress
    pub running: bool,
}

impl Job {
    pub fn new(id: JobId, root: &Path, input_name: &str) -> Self {
        let dir = root.join(id.as_str());
        Self {
            input_path: dir.join(input_name),
            status: JobStatus::new(id.clone()),
            id,
            dir,
            params: ProcessParams::default(),
            running: false,
        }
    }

    pub fn frames_dir(&self) -> PathBuf {
        self.dir.join(FRAMES_DIR)
    }

    pub fn clean_dir(&self) -> PathBuf {
        self.dir.join(CLEAN_DIR)
    }

    pub fn output_path(&self, kind: OutputKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    pub fn status_path(&self) -> PathBuf {
        self.dir.join(STATUS_FILE)
    }

    /// File name of the uploaded video.
    pub fn input_name(&self) -> String {
        self.input_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn locator(&self, file: &str) -> String {
        locator(&self.id, file)
    }

    /// Locator of the uploaded video.
    pub fn preview_locator(&self) -> String {
        self.locator(&self.input_name())
    }
}
