//! Image generation through an OpenAI-compatible `/images/generations`
//! endpoint backed by a diffusion model.

use std::io::Cursor;

use async_trait::async_trait;
use base64::Engine as _;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{check_status, endpoint, ServiceError};

const SERVICE: &str = "image model";

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000/v1";
pub const DEFAULT_MODEL: &str = "stabilityai/stable-diffusion-2-1";
pub const DEFAULT_SIZE: &str = "512x512";

/// Text-in, image-out generation.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate exactly one image for `prompt`, returned as PNG bytes.
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, ServiceError>;
}

/// Request body for `POST /images/generations`.
#[derive(Debug, Serialize)]
struct ImageGenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u32,
    size: &'a str,
    response_format: &'static str,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    b64_json: Option<String>,
}

/// Response body for `POST /images/generations`.
#[derive(Debug, Deserialize)]
struct ImageGenerationResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Clone)]
pub struct HttpDiffusion {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    size: String,
}

impl Default for HttpDiffusion {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpDiffusion {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            api_key: None,
            model: DEFAULT_MODEL.to_owned(),
            size: DEFAULT_SIZE.to_owned(),
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

    /// Image dimensions as `"<width>x<height>"`.
    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = size.into();
        self
    }
}

/// Decode base64 image data and re-encode it as PNG.
pub fn decode_to_png(b64: &str) -> Result<Vec<u8>, ServiceError> {
    let raw = base64::engine::general_purpose::STANDARD
        .decode(b64.trim())
        .map_err(|e| ServiceError::Decode(e.to_string()))?;
    let image = image::load_from_memory(&raw).map_err(|e| ServiceError::Decode(e.to_string()))?;

    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(|e| ServiceError::Decode(e.to_string()))?;
    Ok(png)
}

#[async_trait]
impl ImageGenerator for HttpDiffusion {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, ServiceError> {
        debug!(model = %self.model, %prompt, "image generation request");

        let body = ImageGenerationRequest {
            model: &self.model,
            prompt,
            n: 1,
            size: &self.size,
            response_format: "b64_json",
        };
        let mut request = self
            .client
            .post(endpoint(&self.base_url, "/images/generations"))
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = check_status(SERVICE, request.send().await?).await?;
        let parsed: ImageGenerationResponse = response.json().await?;
        let b64 = parsed
            .data
            .into_iter()
            .next()
            .and_then(|d| d.b64_json)
            .ok_or_else(|| ServiceError::InvalidResponse {
                service: SERVICE,
                message: "response contains no image data".into(),
            })?;

        let png = decode_to_png(&b64)?;
        info!(image_bytes = png.len(), "image generation done");
        Ok(png)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
