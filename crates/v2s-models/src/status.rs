//! Pipeline status document.
//!
//! [`JobStatus`] is what gets written to `status.json` after every mutation
//! and what the status push channel sends on every tick. Field names are
//! camelCase to stay compatible with the existing web client.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::JobId;

/// Tracked pipeline step, in fixed pipeline order.
///
/// Erosion is not a step of its own: it runs as the tail of `chroma`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepName {
    ExtractFrames,
    Chroma,
    Gif,
    Spritesheet,
}

impl StepName {
    /// All tracked steps in pipeline order.
    pub const ALL: [StepName; 4] = [
        StepName::ExtractFrames,
        StepName::Chroma,
        StepName::Gif,
        StepName::Spritesheet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StepName::ExtractFrames => "extract_frames",
            StepName::Chroma => "chroma",
            StepName::Gif => "gif",
            StepName::Spritesheet => "spritesheet",
        }
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Returned when a step name is not one of the tracked steps.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown step: {0}")]
pub struct UnknownStep(pub String);

impl FromStr for StepName {
    type Err = UnknownStep;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StepName::ALL
            .into_iter()
            .find(|step| step.as_str() == s)
            .ok_or_else(|| UnknownStep(s.to_string()))
    }
}

/// State of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StepState {
    /// Not started in this run
    #[default]
    Pending,
    /// Currently executing
    Running,
    /// Finished successfully
    Done,
    /// Failed; the run was aborted here
    Error,
}

impl StepState {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepState::Pending => "pending",
            StepState::Running => "running",
            StepState::Done => "done",
            StepState::Error => "error",
        }
    }

    /// Whether a step may move from `self` to `next` within one run.
    ///
    /// `Pending -> Error` covers setup failures reported against a stage
    /// that never got to start.
    pub fn can_transition_to(&self, next: StepState) -> bool {
        matches!(
            (self, next),
            (StepState::Pending, StepState::Running)
                | (StepState::Pending, StepState::Error)
                | (StepState::Running, StepState::Done)
                | (StepState::Running, StepState::Error)
        )
    }
}

impl fmt::Display for StepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One tracked step and its state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub name: StepName,
    pub status: StepState,
}

/// Kind of artifact a finished run exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    Gif,
    Spritesheet,
}

impl OutputKind {
    /// Key used in [`JobStatus::outputs`].
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputKind::Gif => "gif",
            OutputKind::Spritesheet => "spritesheet",
        }
    }

    /// File name inside the job's working directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            OutputKind::Gif => "final.gif",
            OutputKind::Spritesheet => "spritesheet.png",
        }
    }
}

/// Observable state of a job's pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    pub job_id: JobId,
    /// Name of the most recently updated step, empty before the first update.
    pub current_step: String,
    pub steps: Vec<Step>,
    /// Output kind -> retrievable locator.
    pub outputs: BTreeMap<String, String>,
}

impl JobStatus {
    /// Fresh status: every step pending, nothing produced yet.
    pub fn new(job_id: JobId) -> Self {
        Self {
            job_id,
            current_step: String::new(),
            steps: StepName::ALL
                .into_iter()
                .map(|name| Step {
                    name,
                    status: StepState::Pending,
                })
                .collect(),
            outputs: BTreeMap::new(),
        }
    }

    /// State of a step.
    pub fn step(&self, name: StepName) -> StepState {
        self.steps
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.status)
            .unwrap_or_default()
    }

    /// Apply a step transition.
    ///
    /// Returns `false` and leaves the status untouched when the transition
    /// is not allowed (including same-state writes).
    pub fn set_step(&mut self, name: StepName, state: StepState) -> bool {
        let Some(step) = self.steps.iter_mut().find(|s| s.name == name) else {
            return false;
        };
        if !step.status.can_transition_to(state) {
            return false;
        }
        step.status = state;
        self.current_step = name.as_str().to_string();
        true
    }

    /// Record the locator of a produced artifact.
    pub fn set_output(&mut self, kind: OutputKind, locator: impl Into<String>) {
        self.outputs.insert(kind.as_str().to_string(), locator.into());
    }

    /// Every step is done.
    pub fn is_complete(&self) -> bool {
        self.steps.iter().all(|s| s.status == StepState::Done)
    }

    /// The step that failed in this run, if any.
    pub fn failed_step(&self) -> Option<StepName> {
        self.steps
            .iter()
            .find(|s| s.status == StepState::Error)
            .map(|s| s.name)
    }

    /// Nothing is running any more: either complete or failed.
    pub fn is_finished(&self) -> bool {
        self.is_complete() || self.failed_step().is_some()
    }
}
