//! Text-to-speech through the Google Translate speech endpoint.
//!
//! The endpoint only accepts short inputs, so text is split into chunks of at
//! most [`MAX_CHUNK_CHARS`] characters, each chunk is fetched as MP3, and the
//! MP3 frames are concatenated in order.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::future::try_join_all;
use reqwest::{Client, Url};
use tracing::{debug, info};

use super::{check_status, endpoint, ServiceError};

const SERVICE: &str = "speech synthesis";

pub const DEFAULT_BASE_URL: &str = "https://translate.google.com";

/// Upper bound, in characters, of a single synthesis request.
pub const MAX_CHUNK_CHARS: usize = 100;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Characters after which a chunk may end.
const BREAK_CHARS: &[char] = &[
    '.', ',', '!', '?', ';', ':', '\n', '¡', '¿', '…', '。', '，', '！', '？', '；', '：', '、',
];

/// Language codes accepted by the speech endpoint.
const SUPPORTED_LANGS: &[&str] = &[
    "af", "am", "ar", "bg", "bn", "bs", "ca", "cs", "cy", "da", "de", "el", "en", "es", "et",
    "eu", "fi", "fil", "fr", "fr-ca", "gl", "gu", "ha", "hi", "hr", "hu", "id", "is", "it", "iw",
    "ja", "jw", "km", "kn", "ko", "la", "lt", "lv", "ml", "mr", "ms", "my", "ne", "nl", "no",
    "pa", "pl", "pt", "pt-pt", "ro", "ru", "si", "sk", "sq", "sr", "su", "sv", "sw", "ta", "te",
    "th", "tl", "tr", "uk", "ur", "vi", "yue", "zh", "zh-cn", "zh-tw",
];

/// Text-plus-language in, audio out.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesize `text` spoken in `lang` and return the encoded audio.
    async fn synthesize(&self, text: &str, lang: &str) -> Result<Bytes, ServiceError>;

    /// Media type of the bytes returned by [`Synthesizer::synthesize`].
    fn media_type(&self) -> &'static str {
        "audio/mpeg"
    }
}

/// [`Synthesizer`] for the Google Translate `translate_tts` endpoint.
#[derive(Debug, Clone)]
pub struct GoogleTts {
    client: Client,
    base_url: String,
}

impl Default for GoogleTts {
    fn default() -> Self {
        Self::new()
    }
}

impl GoogleTts {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_owned(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    fn chunk_url(
        &self,
        chunk: &str,
        lang: &str,
        idx: usize,
        total: usize,
    ) -> Result<Url, ServiceError> {
        let base = endpoint(&self.base_url, "/translate_tts");
        let total = total.to_string();
        let idx = idx.to_string();
        let textlen = chunk.chars().count().to_string();
        Url::parse_with_params(
            &base,
            [
                ("ie", "UTF-8"),
                ("q", chunk),
                ("tl", lang),
                ("total", total.as_str()),
                ("idx", idx.as_str()),
                ("textlen", textlen.as_str()),
                ("client", "tw-ob"),
                ("ttsspeed", "1"),
            ],
        )
        .map_err(|e| ServiceError::InvalidResponse {
            service: SERVICE,
            message: format!("invalid base URL `{base}`: {e}"),
        })
    }

    async fn fetch_chunk(&self, url: Url) -> Result<Bytes, ServiceError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::REFERER, "http://translate.google.com/")
            .send()
            .await?;
        Ok(check_status(SERVICE, response).await?.bytes().await?)
    }
}

/// Whether `lang` is a code the speech endpoint accepts (case-insensitive).
pub fn is_supported_lang(lang: &str) -> bool {
    let lang = lang.to_ascii_lowercase();
    SUPPORTED_LANGS.contains(&lang.as_str())
}

/// Split `text` into chunks of at most `max_chars` characters.
///
/// Chunks end after punctuation where possible, then at the last space that
/// fits, and only as a last resort in the middle of a word. Chunks holding
/// nothing but punctuation and whitespace are dropped.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut piece = String::new();

    for ch in text.chars() {
        piece.push(ch);
        if BREAK_CHARS.contains(&ch) {
            push_piece(&mut chunks, &piece, max_chars);
            piece.clear();
        }
    }
    push_piece(&mut chunks, &piece, max_chars);
    chunks
}

fn push_piece(chunks: &mut Vec<String>, piece: &str, max_chars: usize) {
    let mut rest = piece.trim();
    while !rest.is_empty() {
        let (head, tail) = cut(rest, max_chars);
        let head = head.trim();
        if head.chars().any(|c| !c.is_whitespace() && !BREAK_CHARS.contains(&c)) {
            chunks.push(head.to_owned());
        }
        rest = tail.trim_start();
    }
}

fn cut(text: &str, max_chars: usize) -> (&str, &str) {
    let Some((limit, _)) = text.char_indices().nth(max_chars) else {
        return (text, "");
    };
    match text[..limit].rfind(' ') {
        Some(space) if space > 0 => (&text[..space], &text[space..]),
        _ => (&text[..limit], &text[limit..]),
    }
}

#[async_trait]
impl Synthesizer for GoogleTts {
    async fn synthesize(&self, text: &str, lang: &str) -> Result<Bytes, ServiceError> {
        if text.trim().is_empty() {
            return Err(ServiceError::Synthesis("No text to speak".into()));
        }
        if !is_supported_lang(lang) {
            return Err(ServiceError::Synthesis(format!("Language not supported: {lang}")));
        }

        let chunks = split_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(ServiceError::Synthesis("No text to send to TTS API".into()));
        }
        debug!(chunks = chunks.len(), lang, "synthesizing speech");

        let urls = chunks
            .iter()
            .enumerate()
            .map(|(idx, chunk)| self.chunk_url(chunk, lang, idx, chunks.len()))
            .collect::<Result<Vec<_>, _>>()?;
        let parts = try_join_all(urls.into_iter().map(|url| self.fetch_chunk(url))).await?;

        let mut audio = BytesMut::with_capacity(parts.iter().map(Bytes::len).sum());
        for part in &parts {
            audio.extend_from_slice(part);
        }

        info!(lang, audio_bytes = audio.len(), "speech synthesized");
        Ok(audio.freeze())
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
