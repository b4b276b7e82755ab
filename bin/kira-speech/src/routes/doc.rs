use kira_web::health::HealthApi;
use utoipa::OpenApi;

use crate::routes::{transcribe::TranscribeApi, tts::TtsApi};

#[derive(OpenApi)]
#[openapi(info(
    title = "kira-speech",
    description = "Kira speech-to-text and text-to-speech API",
    contact(name = "kira", url = "https://github.com/kira-ai/kira.rs")
))]
pub struct ApiDoc;

pub fn get_docs() -> utoipa::openapi::OpenApi {
    let mut root = ApiDoc::openapi();
    root.merge(HealthApi::openapi());
    root.merge(TranscribeApi::openapi());
    root.merge(TtsApi::openapi());
    root
}
