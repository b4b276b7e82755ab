//! Language detection and translation through the Lingo.dev engine.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use super::{check_status, endpoint, ServiceError};

const SERVICE: &str = "lingo.dev";

/// Default public engine endpoint.
pub const DEFAULT_BASE_URL: &str = "https://engine.lingo.dev";

/// Locale detection plus locale-to-locale text translation.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Return the locale code (`"en"`, `"ta"`, …) the text is written in.
    async fn detect_locale(&self, text: &str) -> Result<String, ServiceError>;

    /// Translate `text` from the `source` locale into the `target` locale.
    async fn localize(&self, text: &str, source: &str, target: &str)
    -> Result<String, ServiceError>;
}

/// [`Translator`] backed by the Lingo.dev HTTP engine.
#[derive(Debug, Clone)]
pub struct LingoTranslator {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    locale: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LocalizeRequest<'a> {
    params: LocalizeParams,
    locale: LocalePair<'a>,
    source_locale: &'a str,
    target_locale: &'a str,
    data: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LocalizeParams {
    workflow_id: String,
    fast: bool,
}

#[derive(Debug, Serialize)]
struct LocalePair<'a> {
    source: &'a str,
    target: &'a str,
}

impl LingoTranslator {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            api_key: api_key.into(),
        }
    }

    /// Point the client at a different engine deployment.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Reuse a preconfigured [`Client`] (timeouts, proxies).
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<serde_json::Value, ServiceError> {
        let response = self
            .client
            .post(endpoint(&self.base_url, path))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;
        let response = check_status(SERVICE, response).await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl Translator for LingoTranslator {
    async fn detect_locale(&self, text: &str) -> Result<String, ServiceError> {
        let raw = self.post_json("/recognize", &json!({ "text": text })).await?;
        let parsed: RecognizeResponse = serde_json::from_value(raw)?;
        let locale = parsed.locale.ok_or_else(|| ServiceError::InvalidResponse {
            service: SERVICE,
            message: "missing `locale` in recognize response".into(),
        })?;
        debug!(%locale, "locale detected");
        Ok(locale)
    }

    async fn localize(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, ServiceError> {
        let request = LocalizeRequest {
            params: LocalizeParams {
                workflow_id: Uuid::new_v4().to_string(),
                fast: false,
            },
            locale: LocalePair { source, target },
            source_locale: source,
            target_locale: target,
            data: json!({ "text": text }),
        };
        let raw = self.post_json("/i18n", &request).await?;
        let translated = raw["data"]["text"]
            .as_str()
            .ok_or_else(|| ServiceError::InvalidResponse {
                service: SERVICE,
                message: "missing `data.text` in i18n response".into(),
            })?;
        debug!(source, target, chars = translated.chars().count(), "text localized");
        Ok(translated.to_owned())
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn translator(server: &MockServer) -> LingoTranslator {
        LingoTranslator::new("test-key").with_base_url(server.uri())
    }

    #[tokio::test]
    async fn detect_locale_reads_locale_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/recognize"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({ "text": "வணக்கம்" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "locale": "ta" })))
            .expect(1)
            .mount(&server)
            .await;

        let locale = translator(&server).detect_locale("வணக்கம்").await.unwrap();
        assert_eq!(locale, "ta");
    }

    #[tokio::test]
    async fn detect_locale_without_locale_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/recognize"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let err = translator(&server).detect_locale("hi").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidResponse { .. }));
    }

    #[tokio::test]
    async fn localize_sends_locale_pair_and_returns_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/i18n"))
            .and(body_partial_json(json!({
                "locale": { "source": "ta", "target": "en" },
                "sourceLocale": "ta",
                "targetLocale": "en",
                "data": { "text": "வணக்கம்" },
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "data": { "text": "Hello" } })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let text = translator(&server)
            .localize("வணக்கம்", "ta", "en")
            .await
            .unwrap();
        assert_eq!(text, "Hello");
    }

    #[tokio::test]
    async fn non_success_status_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/i18n"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let err = translator(&server)
            .localize("hello", "en", "fr")
            .await
            .unwrap_err();
        match err {
            ServiceError::Api { status, body, .. } => {
                assert_eq!(status, 401);
                assert_eq!(body, "bad key");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
