//! In-process collaborator fakes for handler and pipeline tests.
//!
//! Enabled by the `testing` feature; every fake records what it was asked to
//! do so tests can assert on call order and arguments.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;

use crate::services::chat::{ChatMessage, ChatModel};
use crate::services::ffmpeg::{TranscodeError, Transcoder};
use crate::services::lingo::Translator;
use crate::services::tts::Synthesizer;
use crate::services::whisper::Transcriber;
use crate::services::ServiceError;
use crate::types::Transcription;

fn fake_failure(service: &'static str, message: &str) -> ServiceError {
    ServiceError::Api {
        service,
        status: 503,
        body: message.to_owned(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslatorCall {
    Detect(String),
    Localize {
        text: String,
        source: String,
        target: String,
    },
}

/// Detects a fixed locale and "translates" by prefixing `[source->target] `.
#[derive(Debug)]
pub struct FakeTranslator {
    detected: Result<String, String>,
    calls: Mutex<Vec<TranslatorCall>>,
}

impl FakeTranslator {
    pub fn detecting(locale: &str) -> Self {
        Self {
            detected: Ok(locale.to_owned()),
            calls: Mutex::default(),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            detected: Err(message.to_owned()),
            calls: Mutex::default(),
        }
    }

    pub fn calls(&self) -> Vec<TranslatorCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: TranslatorCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

#[async_trait]
impl Translator for FakeTranslator {
    async fn detect_locale(&self, text: &str) -> Result<String, ServiceError> {
        self.record(TranslatorCall::Detect(text.to_owned()));
        self.detected
            .clone()
            .map_err(|m| fake_failure("translator", &m))
    }

    async fn localize(&self, text: &str, source: &str, target: &str) -> Result<String, ServiceError> {
        self.record(TranslatorCall::Localize {
            text: text.to_owned(),
            source: source.to_owned(),
            target: target.to_owned(),
        });
        Ok(format!("[{source}->{target}] {text}"))
    }
}

/// Chat model returning one scripted output for every call.
#[derive(Debug)]
pub struct ScriptedChat {
    output: Result<String, String>,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedChat {
    pub fn replying(output: &str) -> Self {
        Self {
            output: Ok(output.to_owned()),
            calls: Mutex::default(),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            output: Err(message.to_owned()),
            calls: Mutex::default(),
        }
    }

    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ChatModel for ScriptedChat {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ServiceError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(messages.to_vec());
        }
        self.output
            .clone()
            .map_err(|m| fake_failure("chat model", &m))
    }
}

/// Transcoder that copies the input bytes to the output path, or fails with a
/// fixed exit code. Records every input path it saw and whether it existed.
#[derive(Debug, Default)]
pub struct FakeTranscoder {
    fail_with: Option<i32>,
    seen: Mutex<Vec<(PathBuf, bool)>>,
}

impl FakeTranscoder {
    pub fn failing(code: i32) -> Self {
        Self {
            fail_with: Some(code),
            seen: Mutex::default(),
        }
    }

    pub fn seen(&self) -> Vec<(PathBuf, bool)> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Transcoder for FakeTranscoder {
    async fn transcode(&self, input: &Path, output: &Path) -> Result<(), TranscodeError> {
        let exists = tokio::fs::try_exists(input).await.unwrap_or(false);
        if let Ok(mut seen) = self.seen.lock() {
            seen.push((input.to_path_buf(), exists));
        }
        if let Some(code) = self.fail_with {
            return Err(TranscodeError::Failed {
                code,
                stderr: "Invalid data found when processing input".into(),
            });
        }
        tokio::fs::copy(input, output)
            .await
            .map_err(|source| TranscodeError::Spawn {
                program: "fake".into(),
                source,
            })?;
        Ok(())
    }
}

/// Transcriber returning a fixed result. Records the audio bytes it read.
#[derive(Debug)]
pub struct FakeTranscriber {
    result: Result<Transcription, String>,
    heard: Mutex<Vec<(PathBuf, Vec<u8>)>>,
}

impl FakeTranscriber {
    pub fn returning(text: &str, language: &str) -> Self {
        Self {
            result: Ok(Transcription {
                text: text.to_owned(),
                language: language.to_owned(),
            }),
            heard: Mutex::default(),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_owned()),
            heard: Mutex::default(),
        }
    }

    pub fn heard(&self) -> Vec<(PathBuf, Vec<u8>)> {
        self.heard.lock().map(|h| h.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(&self, audio: &Path) -> Result<Transcription, ServiceError> {
        let bytes = tokio::fs::read(audio).await?;
        if let Ok(mut heard) = self.heard.lock() {
            heard.push((audio.to_path_buf(), bytes));
        }
        self.result
            .clone()
            .map_err(|m| fake_failure("transcriber", &m))
    }
}

/// Synthesizer that echoes `lang:text` as the audio payload.
#[derive(Debug, Default)]
pub struct EchoSynthesizer;

#[async_trait]
impl Synthesizer for EchoSynthesizer {
    async fn synthesize(&self, text: &str, lang: &str) -> Result<Bytes, ServiceError> {
        if text.is_empty() {
            return Err(ServiceError::Synthesis("No text to speak".into()));
        }
        Ok(Bytes::from(format!("{lang}:{text}")))
    }
}
