//! Speech-to-text through an OpenAI-compatible transcription endpoint
//! (OpenAI, faster-whisper-server, whisper.cpp server, …).

use std::path::Path;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use super::{check_status, endpoint, ServiceError};
use crate::types::Transcription;

const SERVICE: &str = "transcription model";

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/v1";
pub const DEFAULT_MODEL: &str = "base";

/// Audio-in, text-and-language-out speech recognition.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe the audio file at `audio` (16 kHz mono WAV).
    async fn transcribe(&self, audio: &Path) -> Result<Transcription, ServiceError>;
}

#[derive(Debug, Deserialize)]
struct VerboseTranscription {
    text: String,
    #[serde(default)]
    language: Option<String>,
}

/// Whisper's language names, as reported in `verbose_json`, keyed to ISO codes.
#[rustfmt::skip]
const LANGUAGE_CODES: &[(&str, &str)] = &[
    ("english", "en"), ("chinese", "zh"), ("german", "de"), ("spanish", "es"),
    ("russian", "ru"), ("korean", "ko"), ("french", "fr"), ("japanese", "ja"),
    ("portuguese", "pt"), ("turkish", "tr"), ("polish", "pl"), ("catalan", "ca"),
    ("dutch", "nl"), ("arabic", "ar"), ("swedish", "sv"), ("italian", "it"),
    ("indonesian", "id"), ("hindi", "hi"), ("finnish", "fi"), ("vietnamese", "vi"),
    ("hebrew", "he"), ("ukrainian", "uk"), ("greek", "el"), ("malay", "ms"),
    ("czech", "cs"), ("romanian", "ro"), ("danish", "da"), ("hungarian", "hu"),
    ("tamil", "ta"), ("norwegian", "no"), ("thai", "th"), ("urdu", "ur"),
    ("croatian", "hr"), ("bulgarian", "bg"), ("lithuanian", "lt"), ("latin", "la"),
    ("maori", "mi"), ("malayalam", "ml"), ("welsh", "cy"), ("slovak", "sk"),
    ("telugu", "te"), ("persian", "fa"), ("latvian", "lv"), ("bengali", "bn"),
    ("serbian", "sr"), ("azerbaijani", "az"), ("slovenian", "sl"), ("kannada", "kn"),
    ("estonian", "et"), ("macedonian", "mk"), ("breton", "br"), ("basque", "eu"),
    ("icelandic", "is"), ("armenian", "hy"), ("nepali", "ne"), ("mongolian", "mn"),
    ("bosnian", "bs"), ("kazakh", "kk"), ("albanian", "sq"), ("swahili", "sw"),
    ("galician", "gl"), ("marathi", "mr"), ("punjabi", "pa"), ("sinhala", "si"),
    ("khmer", "km"), ("shona", "sn"), ("yoruba", "yo"), ("somali", "so"),
    ("afrikaans", "af"), ("occitan", "oc"), ("georgian", "ka"), ("belarusian", "be"),
    ("tajik", "tg"), ("sindhi", "sd"), ("gujarati", "gu"), ("amharic", "am"),
    ("yiddish", "yi"), ("lao", "lo"), ("uzbek", "uz"), ("faroese", "fo"),
    ("haitian creole", "ht"), ("pashto", "ps"), ("turkmen", "tk"), ("nynorsk", "nn"),
    ("maltese", "mt"), ("sanskrit", "sa"), ("luxembourgish", "lb"), ("myanmar", "my"),
    ("tibetan", "bo"), ("tagalog", "tl"), ("malagasy", "mg"), ("assamese", "as"),
    ("tatar", "tt"), ("hawaiian", "haw"), ("lingala", "ln"), ("hausa", "ha"),
    ("bashkir", "ba"), ("javanese", "jw"), ("sundanese", "su"), ("cantonese", "yue"),
    // aliases
    ("burmese", "my"), ("valencian", "ca"), ("flemish", "nl"), ("haitian", "ht"),
    ("letzeburgesch", "lb"), ("pushto", "ps"), ("panjabi", "pa"), ("moldavian", "ro"),
    ("moldovan", "ro"), ("sinhalese", "si"), ("castilian", "es"), ("mandarin", "zh"),
];

/// Map a reported language to its ISO code.
///
/// Some servers report the full Whisper name (`"english"`) rather than the
/// code. Names are matched case-insensitively; anything else is returned
/// trimmed as-is.
pub fn normalize_language(raw: &str) -> String {
    let trimmed = raw.trim();
    LANGUAGE_CODES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(trimmed))
        .map(|(_, code)| (*code).to_owned())
        .unwrap_or_else(|| trimmed.to_owned())
}

/// [`Transcriber`] posting the audio file as multipart/form-data.
#[derive(Debug, Clone)]
pub struct HttpTranscriber {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl Default for HttpTranscriber {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTranscriber {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            api_key: None,
            model: DEFAULT_MODEL.to_owned(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.is_empty());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl Transcriber for HttpTranscriber {
    async fn transcribe(&self, audio: &Path) -> Result<Transcription, ServiceError> {
        let bytes = tokio::fs::read(audio).await?;
        let file_name = audio
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio.wav".to_owned());
        debug!(path = %audio.display(), size_bytes = bytes.len(), "uploading audio for transcription");

        let part = Part::bytes(bytes).file_name(file_name).mime_str("audio/wav")?;
        let form = Form::new()
            .text("model", self.model.clone())
            .text("response_format", "verbose_json")
            .part("file", part);

        let mut request = self
            .client
            .post(endpoint(&self.base_url, "/audio/transcriptions"))
            .multipart(form);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = check_status(SERVICE, request.send().await?).await?;
        let parsed: VerboseTranscription = response.json().await?;
        let language = parsed
            .language
            .as_deref()
            .map(normalize_language)
            .ok_or_else(|| ServiceError::InvalidResponse {
                service: SERVICE,
                message: "response did not report a detected language".into(),
            })?;

        info!(text = %parsed.text, %language, "transcription complete");
        Ok(Transcription {
            text: parsed.text,
            language,
        })
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn transcribe_posts_file_and_reads_language() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/audio/transcriptions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "task": "transcribe",
                "language": "en",
                "duration": 1.5,
                "text": " And so my fellow Americans",
                "segments": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let wav = dir.path().join("transcoded.wav");
        std::fs::write(&wav, b"RIFF....WAVE").unwrap();

        let result = HttpTranscriber::new()
            .with_base_url(server.uri())
            .transcribe(&wav)
            .await
            .unwrap();
        assert_eq!(result.text, " And so my fellow Americans");
        assert_eq!(result.language, "en");

        let received = server.received_requests().await.unwrap();
        let body = String::from_utf8_lossy(&received[0].body);
        assert!(body.contains("name=\"model\""));
        assert!(body.contains("verbose_json"));
        assert!(body.contains("filename=\"transcoded.wav\""));
    }

    #[test]
    fn language_names_map_to_codes() {
        assert_eq!(normalize_language("english"), "en");
        assert_eq!(normalize_language("English"), "en");
        assert_eq!(normalize_language("haitian creole"), "ht");
        assert_eq!(normalize_language("burmese"), "my");
        assert_eq!(normalize_language("cantonese"), "yue");
    }

    #[test]
    fn codes_and_unknown_values_pass_through() {
        assert_eq!(normalize_language("en"), "en");
        assert_eq!(normalize_language(" ta "), "ta");
        assert_eq!(normalize_language("klingon"), "klingon");
    }

    #[tokio::test]
    async fn full_language_name_is_reported_as_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/audio/transcriptions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "text": "வணக்கம்", "language": "tamil" })),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let wav = dir.path().join("a.wav");
        std::fs::write(&wav, b"RIFF").unwrap();

        let result = HttpTranscriber::new()
            .with_base_url(server.uri())
            .transcribe(&wav)
            .await
            .unwrap();
        assert_eq!(result.text, "வணக்கம்");
        assert_eq!(result.language, "ta");
    }

    #[tokio::test]
    async fn missing_language_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/audio/transcriptions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "text": "hi" })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let wav = dir.path().join("a.wav");
        std::fs::write(&wav, b"RIFF").unwrap();

        let err = HttpTranscriber::new()
            .with_base_url(server.uri())
            .transcribe(&wav)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidResponse { .. }));
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let err = HttpTranscriber::new()
            .transcribe(Path::new("/nonexistent/kira/audio.wav"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Io(_)));
    }
}
