//! `POST /kira`: multilingual chat reply.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use kira_core::{KiraReply, StructuredReply};
use kira_web::ServerError;
use serde::Deserialize;
use tracing::debug;
use utoipa::{OpenApi, ToSchema};

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(kira), components(schemas(KiraRequest, StructuredReply)))]
pub struct KiraApi;

#[derive(Debug, Deserialize, ToSchema)]
pub struct KiraRequest {
    /// The user's message, in any language.
    #[serde(default)]
    pub prompt: Option<String>,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/kira", post(kira))
}

/// Reply to a user message in the user's own language.
///
/// The message is translated to English, answered by the chat model with a
/// mood and one of eight categories, and the reply is translated back.
#[utoipa::path(
    post,
    path = "/kira",
    tag = "kira",
    request_body = KiraRequest,
    responses(
        (status = 200, description = "The model's reply object, localized", body = StructuredReply),
        (status = 400, description = "Missing or empty prompt"),
        (status = 500, description = "Translation or chat model failure"),
    )
)]
pub async fn kira(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<KiraRequest>, JsonRejection>,
) -> Result<Json<KiraReply>, ServerError> {
    let Json(request) = payload?;
    let prompt = match request.prompt {
        Some(p) if !p.trim().is_empty() => p,
        _ => return Err(ServerError::BadRequest("No prompt provided".into())),
    };
    debug!(chars = prompt.chars().count(), "kira request accepted");

    let reply = state.pipeline.respond(&prompt).await?;
    Ok(Json(reply))
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use std::path::{Path, PathBuf};

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use kira_core::testing::{FakeTranslator, ScriptedChat};
    use kira_core::{ChatReplyPipeline, ExchangeLog};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::routes;

    const MODEL_OUTPUT: &str = r#"{"mood":"joyful","reply":"That's wonderful!","category":"Foodie Finds","language":"en"}"#;

    fn config(exchange_log: &Path) -> Config {
        Config {
            bind_address: "127.0.0.1:0".into(),
            log_level: "info".into(),
            log_json: false,
            log_dir: None,
            cors_allowed_origins: None,
            enable_swagger: false,
            exchange_log: exchange_log.to_path_buf(),
            pivot_locale: "en".into(),
            lingo_api_key: String::new(),
            lingo_base_url: "http://127.0.0.1:9".into(),
            chat_api_key: String::new(),
            chat_base_url: "http://127.0.0.1:9".into(),
            chat_model: "gpt-4o-mini".into(),
            chat_temperature: 0.7,
            chat_max_tokens: 300,
        }
    }

    struct TestApp {
        app: Router,
        translator: Arc<FakeTranslator>,
        chat: Arc<ScriptedChat>,
        log_path: PathBuf,
        _dir: tempfile::TempDir,
    }

    fn test_app(locale: &str, model_output: &str) -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("kira_logs.txt");
        let translator = Arc::new(FakeTranslator::detecting(locale));
        let chat = Arc::new(ScriptedChat::replying(model_output));
        let pipeline = ChatReplyPipeline::new(
            translator.clone(),
            chat.clone(),
            ExchangeLog::new(&log_path),
        );
        let state = Arc::new(AppState {
            config: Arc::new(config(&log_path)),
            pipeline: Arc::new(pipeline),
        });
        TestApp {
            app: routes::build(state),
            translator,
            chat,
            log_path,
            _dir: dir,
        }
    }

    async fn post_kira(app: &Router, body: &str) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(
                Request::post("/kira")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_owned()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn log_lines(path: &Path) -> Vec<Value> {
        std::fs::read_to_string(path)
            .unwrap_or_default()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn empty_or_missing_prompt_is_rejected_without_calls() {
        let t = test_app("en", MODEL_OUTPUT);
        for body in [r#"{"prompt":""}"#, r#"{"prompt":"   \n"}"#, "{}", r#"{"prompt":null}"#] {
            let (status, json) = post_kira(&t.app, body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
            assert_eq!(json, json!({ "error": "No prompt provided" }));
        }
        assert!(t.translator.calls().is_empty());
        assert!(t.chat.calls().is_empty());
        assert!(log_lines(&t.log_path).is_empty());
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let t = test_app("en", MODEL_OUTPUT);
        for body in ["not json", r#"{"prompt": 5}"#, "[1,2]"] {
            let (status, json) = post_kira(&t.app, body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
            assert!(json["error"].is_string());
        }
        assert!(t.chat.calls().is_empty());
    }

    #[tokio::test]
    async fn english_prompt_returns_model_output_unchanged() {
        let t = test_app("en", MODEL_OUTPUT);

        let (status, json) = post_kira(&t.app, r#"{"prompt":"I am so happy today!"}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::from_str::<Value>(MODEL_OUTPUT).unwrap());
        let lines = log_lines(&t.log_path);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["user_input"], "I am so happy today!");
        assert_eq!(lines[0]["kira_output"], json);
    }

    #[tokio::test]
    async fn tamil_prompt_gets_tamil_reply() {
        let t = test_app("ta", MODEL_OUTPUT);

        let (status, json) = post_kira(&t.app, r#"{"prompt":"வணக்கம்"}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["language"], "ta");
        assert_eq!(json["reply"], "[en->ta] That's wonderful!");
        assert_eq!(json["category"], "Foodie Finds");
        assert_eq!(t.chat.calls()[0][1].content, "[ta->en] வணக்கம்");
    }

    #[tokio::test]
    async fn malformed_model_output_is_500_and_logged() {
        let t = test_app("en", "I'm sorry, I can't do that.");

        let (status, json) = post_kira(&t.app, r#"{"prompt":"  hi  "}"#).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let message = json["error"].as_str().unwrap();
        assert!(!message.is_empty());

        let lines = log_lines(&t.log_path);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["user_input"], "  hi  ");
        assert_eq!(lines[0]["kira_output"]["error"], message);
    }

    #[tokio::test]
    async fn unlisted_category_and_missing_language_still_succeed() {
        let t = test_app("ta", r#"{"mood":"happy","reply":"Hi","category":"Funny Tale"}"#);

        let (status, json) = post_kira(&t.app, r#"{"prompt":"வணக்கம்"}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json,
            json!({ "mood": "happy", "reply": "[en->ta] Hi", "category": "Funny Tale", "language": "ta" })
        );
        assert_eq!(log_lines(&t.log_path)[0]["kira_output"], json);
    }

    #[tokio::test]
    async fn model_output_without_reply_is_500() {
        let t = test_app("en", r#"{"mood":"happy"}"#);

        let (status, json) = post_kira(&t.app, r#"{"prompt":"hi"}"#).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json["error"].as_str().unwrap().contains("reply"));
    }

    #[tokio::test]
    async fn health_is_served() {
        let t = test_app("en", MODEL_OUTPUT);
        let response = t
            .app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
