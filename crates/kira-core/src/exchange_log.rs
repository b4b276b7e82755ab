//! Append-only, newline-delimited JSON log of chat exchanges.
//!
//! Each line is `{"time": ..., "user_input": ..., "kira_output": ...}` written
//! with `", "` / `": "` separators and non-ASCII text left unescaped, which
//! keeps existing log consumers working byte-for-byte.

use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;
use serde_json::ser::Formatter;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::info;

use crate::types::KiraReply;

pub const DEFAULT_PATH: &str = "kira_logs.txt";

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Output half of an exchange: the reply, or the error that replaced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExchangeOutput {
    Reply(KiraReply),
    Error { error: String },
}

/// One line of the exchange log.
#[derive(Debug, Clone, Serialize)]
pub struct ChatExchange {
    pub time: String,
    pub user_input: String,
    pub kira_output: ExchangeOutput,
}

impl ChatExchange {
    /// Stamp an exchange with the current local time.
    pub fn now(user_input: impl Into<String>, kira_output: ExchangeOutput) -> Self {
        Self {
            time: Local::now().format(TIME_FORMAT).to_string(),
            user_input: user_input.into(),
            kira_output,
        }
    }

    /// Serialize to a single log line, newline included.
    pub fn to_line(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut buf = Vec::with_capacity(128);
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
        self.serialize(&mut ser)?;
        buf.push(b'\n');
        Ok(buf)
    }
}

/// Compact JSON with a space after `,` and `:`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

/// Handle to the exchange log file.
///
/// The file is opened in append mode and closed again for every entry;
/// writers in the same process are serialized so lines never interleave.
#[derive(Debug)]
pub struct ExchangeLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl ExchangeLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one exchange and mirror it to the tracing output.
    pub async fn append(&self, exchange: &ChatExchange) -> io::Result<()> {
        let line = exchange.to_line().map_err(io::Error::other)?;

        {
            let _guard = self.write_lock.lock().await;
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await?;
            file.write_all(&line).await?;
            file.flush().await?;
        }

        let output = serde_json::to_string(&exchange.kira_output).unwrap_or_default();
        info!(
            time = %exchange.time,
            user_input = %exchange.user_input,
            kira_output = %output,
            "kira exchange"
        );
        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
