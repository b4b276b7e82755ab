//! `POST /transcribe`: speech-to-text on an uploaded audio file.
//!
//! The multipart body is read into memory first, so a request without an
//! `audio` field never touches the filesystem. Accepted uploads get their own
//! directory under the scratch dir holding `upload<ext>` and
//! `transcoded.wav`; the directory is removed on every exit path.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::post;
use axum::{Json, Router};
use bytes::Bytes;
use kira_core::{ServiceError, Transcription};
use kira_web::ServerError;
use tracing::{debug, info, warn};
use utoipa::{OpenApi, ToSchema};

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(transcribe), components(schemas(TranscribeUpload, Transcription)))]
pub struct TranscribeApi;

/// Multipart form accepted by `POST /transcribe`.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct TranscribeUpload {
    /// Audio or video file in any format ffmpeg can read.
    #[schema(value_type = String, format = Binary)]
    audio: Vec<u8>,
}

const AUDIO_FIELD: &str = "audio";
const DEFAULT_EXTENSION: &str = ".mp3";
const TRANSCODED_NAME: &str = "transcoded.wav";

pub fn router(max_upload_bytes: usize) -> Router<Arc<AppState>> {
    Router::new().route(
        "/transcribe",
        post(transcribe).layer(DefaultBodyLimit::max(max_upload_bytes)),
    )
}

/// An `audio` field read fully into memory.
#[derive(Debug)]
struct Upload {
    extension: String,
    bytes: Bytes,
}

/// Transcribe an uploaded audio file.
#[utoipa::path(
    post,
    path = "/transcribe",
    tag = "speech",
    request_body(content = TranscribeUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Transcribed text and detected language", body = Transcription),
        (status = 400, description = "No audio file provided, or upload too large"),
        (status = 500, description = "Transcoding or transcription failed"),
    )
)]
pub async fn transcribe(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Transcription>, ServerError> {
    let upload = read_audio_field(multipart?)
        .await?
        .ok_or_else(|| ServerError::BadRequest("No audio file provided".into()))?;
    debug!(
        size = upload.bytes.len(),
        extension = %upload.extension,
        "received audio upload"
    );

    let dir = tempfile::Builder::new()
        .prefix("kira-transcribe-")
        .tempdir_in(&state.config.scratch_dir)
        .map_err(|e| ServerError::Internal(format!("failed to create scratch directory: {e}")))?;

    let result = run(&state, dir.path(), &upload).await;

    let dir_path = dir.path().to_path_buf();
    if let Err(e) = dir.close() {
        warn!(path = %dir_path.display(), error = %e, "failed to remove scratch directory");
    }

    let transcription = result?;
    info!(
        language = %transcription.language,
        chars = transcription.text.chars().count(),
        "transcription finished"
    );
    Ok(Json(transcription))
}

async fn run(state: &AppState, dir: &Path, upload: &Upload) -> Result<Transcription, ServiceError> {
    let (input, output) = artifact_paths(dir, &upload.extension);
    tokio::fs::write(&input, &upload.bytes).await?;
    state.transcoder.transcode(&input, &output).await?;
    state.transcriber.transcribe(&output).await
}

/// Read the whole multipart body, keeping the first `audio` file part.
///
/// A plain form value named `audio` (no filename) is not a file and is skipped.
async fn read_audio_field(mut multipart: Multipart) -> Result<Option<Upload>, ServerError> {
    let mut audio = None;
    while let Some(field) = multipart.next_field().await? {
        if audio.is_some() || field.name() != Some(AUDIO_FIELD) || field.file_name().is_none() {
            continue;
        }
        let extension = upload_extension(field.file_name());
        let bytes = field.bytes().await?;
        audio = Some(Upload { extension, bytes });
    }
    Ok(audio)
}

/// `upload<ext>` and `transcoded.wav` inside `dir`.
fn artifact_paths(dir: &Path, extension: &str) -> (PathBuf, PathBuf) {
    (
        dir.join(format!("upload{extension}")),
        dir.join(TRANSCODED_NAME),
    )
}

/// Extension of the client's file name including the dot, lowercased.
///
/// Only short ASCII-alphanumeric extensions are kept; anything else falls
/// back to `.mp3`.
fn upload_extension(file_name: Option<&str>) -> String {
    file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| (1..=10).contains(&ext.len()) && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_owned())
}

// ── Tests ──────────────────────────────────────────────────────────────────────
