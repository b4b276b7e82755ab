//! Audio transcoding through an external `ffmpeg` process.
//!
//! Any input ffmpeg can read is converted to 16 kHz mono WAV. A
//! run that exceeds its timeout has its child process killed.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

pub const DEFAULT_PROGRAM: &str = "ffmpeg";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Number of trailing stderr lines kept in [`TranscodeError::Failed`].
const STDERR_TAIL_LINES: usize = 12;

#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("failed to start `{program}`: {source}. Is FFmpeg installed and in PATH?")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("ffmpeg exited with status {code}: {stderr}")]
    Failed { code: i32, stderr: String },

    #[error("ffmpeg did not finish within {0:?}")]
    Timeout(Duration),

    #[error("path is not valid UTF-8: {0}")]
    InvalidPath(String),
}

/// File-in, file-out audio transcoding.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Convert `input` into a 16 kHz mono WAV file at `output`.
    async fn transcode(&self, input: &Path, output: &Path) -> Result<(), TranscodeError>;
}

/// [`Transcoder`] running the `ffmpeg` binary as a subprocess.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    program: String,
    timeout: Duration,
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegTranscoder {
    pub fn new() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_owned(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Use a specific ffmpeg executable instead of the one on `PATH`.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Kill the subprocess if it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn args<'a>(input: &'a str, output: &'a str) -> [&'a str; 9] {
        [
            "-hide_banner",
            "-y",
            "-i",
            input,
            "-ar",
            "16000",
            "-ac",
            "1",
            output,
        ]
    }
}

fn path_str(path: &Path) -> Result<&str, TranscodeError> {
    path.to_str()
        .ok_or_else(|| TranscodeError::InvalidPath(path.display().to_string()))
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(&self, input: &Path, output: &Path) -> Result<(), TranscodeError> {
        let args = Self::args(path_str(input)?, path_str(output)?);
        debug!(program = %self.program, ?args, "starting ffmpeg");

        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|source| TranscodeError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        // Dropping the wait future on timeout kills the child (kill_on_drop).
        let out = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| TranscodeError::Timeout(self.timeout))?
            .map_err(|source| TranscodeError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !out.status.success() {
            return Err(TranscodeError::Failed {
                code: out.status.code().unwrap_or(-1),
                stderr: stderr_tail(&out.stderr),
            });
        }

        info!(
            input = %input.display(),
            output = %output.display(),
            "converted audio to WAV"
        );
        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
