//! External collaborators: translation, chat completion, speech recognition,
//! speech synthesis, audio transcoding and image diffusion.
//!
//! Each collaborator is a trait with one production client. All clients
//! report failures as [`ServiceError`].

pub mod chat;
pub mod diffusion;
pub mod ffmpeg;
pub mod lingo;
pub mod tts;
pub mod whisper;

use thiserror::Error;

pub use chat::{ChatModel, OpenAiChat};
pub use diffusion::{HttpDiffusion, ImageGenerator};
pub use ffmpeg::{FfmpegTranscoder, TranscodeError, Transcoder};
pub use lingo::{LingoTranslator, Translator};
pub use tts::{GoogleTts, Synthesizer};
pub use whisper::{HttpTranscriber, Transcriber};

#[derive(Debug, Error)]
/// All errors a collaborator call can produce.
pub enum ServiceError {
    /// Transport-level failure talking to a remote collaborator.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O Error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to serialize or deserialize JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The collaborator answered with a non-2xx status.
    #[error("{service} returned HTTP {status}: {body}")]
    Api {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// The collaborator answered 2xx but the body lacked an expected field.
    #[error("invalid {service} response: {message}")]
    InvalidResponse {
        service: &'static str,
        message: String,
    },

    #[error("transcoding failed: {0}")]
    Transcode(#[from] TranscodeError),

    /// The synthesis engine rejected the input before any request was made.
    #[error("{0}")]
    Synthesis(String),

    #[error("failed to decode generated image: {0}")]
    Decode(String),
}

/// Turn a non-2xx response into [`ServiceError::Api`], keeping the body text
/// for the error message.
pub(crate) async fn check_status(
    service: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ServiceError::Api {
        service,
        status: status.as_u16(),
        body,
    })
}

/// Join a base URL and a path without doubling or dropping the slash.
pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn endpoint_joins_with_single_slash() {
        assert_eq!(
            endpoint("https://api.openai.com/v1/", "/chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            endpoint("http://localhost:8000", "recognize"),
            "http://localhost:8000/recognize"
        );
    }

    #[test]
    fn api_error_message_carries_status_and_body() {
        let err = ServiceError::Api {
            service: "lingo.dev",
            status: 401,
            body: "invalid api key".into(),
        };
        assert_eq!(err.to_string(), "lingo.dev returned HTTP 401: invalid api key");
    }
}
