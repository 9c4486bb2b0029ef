//! In-process stand-in for FFmpeg.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::command::ProcessRunner;
use crate::error::{MediaError, MediaResult};

/// Number of frames produced for an image-sequence output.
const SEQUENCE_LEN: usize = 3;

/// Runner that records every invocation and fakes its output.
///
/// The last argument is treated as the output path. A `%04d` sequence
/// pattern yields `frame_0001.png` .. `frame_0003.png`; anything else is
/// written with [`ScriptedRunner::OUTPUT_BYTES`]. When the joined arguments
/// contain the configured substring the call fails with exit code 1.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    fail_on: Option<String>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl ScriptedRunner {
    /// Contents of every single-file output.
    pub const OUTPUT_BYTES: &'static [u8] = b"scripted-output";

    /// Stderr reported by a scripted failure.
    pub const FAILURE_STDERR: &'static str = "simulated failure";

    pub fn new() -> Self {
        Self::default()
    }

    /// Fail any invocation whose arguments contain `needle`.
    pub fn failing_on(needle: impl Into<String>) -> Self {
        Self {
            fail_on: Some(needle.into()),
            ..Self::default()
        }
    }

    /// Argument lists of every invocation so far, in order.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, args: &[String]) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(args.to_vec());
        }
    }
}

#[async_trait]
impl ProcessRunner for ScriptedRunner {
    async fn invoke(&self, args: Vec<String>) -> MediaResult<()> {
        self.record(&args);

        if let Some(needle) = &self.fail_on {
            if args.join(" ").contains(needle.as_str()) {
                return Err(MediaError::ffmpeg_failed(
                    "exit status: 1",
                    Self::FAILURE_STDERR,
                    Some(1),
                ));
            }
        }

        let Some(output) = args.last() else {
            return Ok(());
        };
        let output = Path::new(output);
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let file_name = output
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if file_name.contains("%04d") {
            let dir = output.parent().unwrap_or_else(|| Path::new("."));
            for i in 1..=SEQUENCE_LEN {
                tokio::fs::write(dir.join(file_name.replace("%04d", &format!("{:04}", i))), b"frame")
                    .await?;
            }
        } else {
            tokio::fs::write(output, Self::OUTPUT_BYTES).await?;
        }

        Ok(())
    }
}
