//! The chat-reply pipeline: detect → translate to pivot → chat model →
//! parse → translate back → log.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info};

use crate::exchange_log::{ChatExchange, ExchangeLog, ExchangeOutput};
use crate::services::chat::{ChatMessage, ChatModel};
use crate::services::lingo::Translator;
use crate::services::ServiceError;
use crate::types::KiraReply;

/// Locale every model call is made in.
pub const DEFAULT_PIVOT_LOCALE: &str = "en";

/// Fixed instruction given to the chat model. The category list and the JSON
/// shape are requested, not enforced: only `reply` is read back.
pub const SYSTEM_PROMPT: &str = concat!(
    "You are Kira, an empathetic and friendly AI.\n\n",
    "Your tasks:\n",
    "1️⃣ Detect the user's mood.\n",
    "2️⃣ Choose ONE category from the list:\n",
    "['Foodie Finds','Funny Tail','History Whishpers','Hidden spots',",
    "'Art & Culture','Legends & Myths','Shopping Gems','Festive Movements'].\n\n",
    "3️⃣ Generate a friendly human-like response **ONLY IN ENGLISH**.\n",
    "   (Do NOT translate. Translation happens later.)\n\n",
    "Return STRICT JSON ONLY:\n",
    "{\n",
    "  \"mood\": \"<mood>\",\n",
    "  \"reply\": \"<english reply>\",\n",
    "  \"category\": \"<category>\",\n",
    "  \"language\": \"en\"\n",
    "}",
);

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A collaborator call failed.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// The model's output was not a JSON object.
    #[error(transparent)]
    MalformedReply(#[from] serde_json::Error),

    /// The model's JSON object had no string `reply` to translate.
    #[error("model output has no string `reply` field")]
    MissingReply,
}

/// Orchestrates one chat exchange against the translation service and the
/// chat model, recording every outcome in the [`ExchangeLog`].
pub struct ChatReplyPipeline {
    translator: Arc<dyn Translator>,
    chat: Arc<dyn ChatModel>,
    log: ExchangeLog,
    pivot_locale: String,
}

impl std::fmt::Debug for ChatReplyPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatReplyPipeline")
            .field("log", &self.log.path())
            .field("pivot_locale", &self.pivot_locale)
            .finish_non_exhaustive()
    }
}

impl ChatReplyPipeline {
    pub fn new(translator: Arc<dyn Translator>, chat: Arc<dyn ChatModel>, log: ExchangeLog) -> Self {
        Self {
            translator,
            chat,
            log,
            pivot_locale: DEFAULT_PIVOT_LOCALE.to_owned(),
        }
    }

    pub fn with_pivot_locale(mut self, locale: impl Into<String>) -> Self {
        self.pivot_locale = locale.into();
        self
    }

    pub fn exchange_log(&self) -> &ExchangeLog {
        &self.log
    }

    /// Produce a reply for `raw_prompt` and append the exchange to the log.
    ///
    /// The log entry carries `raw_prompt` exactly as received, while the
    /// collaborators see it with surrounding whitespace trimmed. Exactly one
    /// entry is written whether the pipeline succeeds or fails.
    pub async fn respond(&self, raw_prompt: &str) -> Result<KiraReply, PipelineError> {
        let outcome = self.run(raw_prompt.trim()).await;

        let output = match &outcome {
            Ok(reply) => ExchangeOutput::Reply(reply.clone()),
            Err(e) => ExchangeOutput::Error {
                error: e.to_string(),
            },
        };
        if let Err(e) = self.log.append(&ChatExchange::now(raw_prompt, output)).await {
            error!(
                error = %e,
                path = %self.log.path().display(),
                "failed to append exchange log entry"
            );
        }

        outcome
    }

    async fn run(&self, text: &str) -> Result<KiraReply, PipelineError> {
        let source = self.translator.detect_locale(text).await?;
        let pivot = self.pivot_locale.as_str();

        let pivot_text = if source == pivot {
            text.to_owned()
        } else {
            self.translator.localize(text, &source, pivot).await?
        };
        debug!(%source, pivot, "prompt ready for chat model");

        let messages = [ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(pivot_text)];
        let raw = self.chat.complete(&messages).await?;
        let mut reply = parse_reply(&raw)?;

        if source != pivot {
            let localized = self.translator.localize(reply.reply(), pivot, &source).await?;
            reply.set_reply(localized);
        }
        reply.set_language(source);

        info!(
            language = reply.language().unwrap_or_default(),
            fields = reply.fields().len(),
            "reply ready"
        );
        Ok(reply)
    }
}

/// Parse the model's trimmed text output as a JSON object with a string
/// `reply`. Nothing else about its shape is checked.
pub fn parse_reply(raw: &str) -> Result<KiraReply, PipelineError> {
    let fields: serde_json::Map<String, serde_json::Value> = serde_json::from_str(raw.trim())?;
    KiraReply::from_fields(fields).map_err(|_| PipelineError::MissingReply)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
