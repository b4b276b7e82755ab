//! `POST /tts`: text-to-speech.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use kira_web::ServerError;
use serde::Deserialize;
use tracing::info;
use utoipa::{OpenApi, ToSchema};

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(tts), components(schemas(TtsRequest)))]
pub struct TtsApi;

const DEFAULT_LANG: &str = "en";

#[derive(Debug, Deserialize, ToSchema)]
pub struct TtsRequest {
    /// Text to speak.
    #[serde(default)]
    pub text: Option<String>,
    /// Language code of the text (default `en`).
    #[serde(default)]
    pub lang: Option<String>,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/tts", post(tts))
}

/// Synthesize speech and return it as MP3.
///
/// The audio is produced in memory; nothing is written to disk.
#[utoipa::path(
    post,
    path = "/tts",
    tag = "speech",
    request_body = TtsRequest,
    responses(
        (status = 200, description = "MP3 audio", content_type = "audio/mpeg", body = Vec<u8>),
        (status = 500, description = "Missing text, unsupported language or upstream failure"),
    )
)]
pub async fn tts(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TtsRequest>, JsonRejection>,
) -> Result<Response, ServerError> {
    let Json(request) = payload?;
    let text = request.text.unwrap_or_default();
    let lang = request.lang.unwrap_or_else(|| DEFAULT_LANG.to_owned());

    let audio = state.synthesizer.synthesize(&text, &lang).await?;
    info!(%lang, bytes = audio.len(), "speech synthesized");

    Ok((
        [(header::CONTENT_TYPE, state.synthesizer.media_type())],
        audio,
    )
        .into_response())
}

// ── Tests ──────────────────────────────────────────────────────────────────────
