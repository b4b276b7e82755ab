//! Wire types shared by the chat and speech services.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

/// The closed set of categories the chat model chooses from.
///
/// Labels are part of the contract with the model and are reproduced exactly,
/// spelling included.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
pub enum Category {
    #[serde(rename = "Foodie Finds")]
    #[strum(serialize = "Foodie Finds")]
    FoodieFinds,
    #[serde(rename = "Funny Tail")]
    #[strum(serialize = "Funny Tail")]
    FunnyTail,
    #[serde(rename = "History Whishpers")]
    #[strum(serialize = "History Whishpers")]
    HistoryWhishpers,
    #[serde(rename = "Hidden spots")]
    #[strum(serialize = "Hidden spots")]
    HiddenSpots,
    #[serde(rename = "Art & Culture")]
    #[strum(serialize = "Art & Culture")]
    ArtAndCulture,
    #[serde(rename = "Legends & Myths")]
    #[strum(serialize = "Legends & Myths")]
    LegendsAndMyths,
    #[serde(rename = "Shopping Gems")]
    #[strum(serialize = "Shopping Gems")]
    ShoppingGems,
    #[serde(rename = "Festive Movements")]
    #[strum(serialize = "Festive Movements")]
    FestiveMovements,
}

/// Reply object the chat model is instructed to emit. Documents the body of a
/// successful `POST /kira` response; the pipeline itself returns [`KiraReply`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StructuredReply {
    /// Mood detected in the user's message.
    pub mood: String,
    /// Reply text, in the user's language once the pipeline has finished.
    pub reply: String,
    /// One category out of [`Category`].
    pub category: Category,
    /// Locale code of `reply`.
    pub language: String,
}

/// The chat model's JSON object after localization.
///
/// Only a string `reply` is guaranteed. Every other key, including an
/// unexpected `category` or extra fields, is passed through untouched and in
/// the order the model wrote it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KiraReply(Map<String, Value>);

impl KiraReply {
    pub const REPLY: &'static str = "reply";
    pub const LANGUAGE: &'static str = "language";

    /// Wrap a model object, or give it back when it has no string `reply`.
    pub fn from_fields(fields: Map<String, Value>) -> Result<Self, Map<String, Value>> {
        if fields.get(Self::REPLY).is_some_and(Value::is_string) {
            Ok(Self(fields))
        } else {
            Err(fields)
        }
    }

    pub fn reply(&self) -> &str {
        self.0.get(Self::REPLY).and_then(Value::as_str).unwrap_or_default()
    }

    pub fn set_reply(&mut self, reply: impl Into<String>) {
        self.0.insert(Self::REPLY.to_owned(), Value::String(reply.into()));
    }

    pub fn language(&self) -> Option<&str> {
        self.0.get(Self::LANGUAGE).and_then(Value::as_str)
    }

    /// Overwrite `language`, appending the key when the model left it out.
    pub fn set_language(&mut self, language: impl Into<String>) {
        self.0.insert(Self::LANGUAGE.to_owned(), Value::String(language.into()));
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Result of a speech-to-text run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Transcription {
    /// Transcribed text.
    pub text: String,
    /// Language detected by the model.
    pub language: String,
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn category_labels_round_trip_through_strum_and_serde() {
        for category in Category::iter() {
            let label = category.to_string();
            assert_eq!(label.parse::<Category>().unwrap(), category);
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{label}\""));
        }
        assert_eq!(Category::iter().count(), 8);
    }

    #[test]
    fn category_keeps_exact_spelling() {
        assert_eq!(Category::HistoryWhishpers.as_ref(), "History Whishpers");
        assert_eq!(Category::FunnyTail.as_ref(), "Funny Tail");
        assert_eq!(Category::FestiveMovements.as_ref(), "Festive Movements");
    }

    #[test]
    fn structured_reply_serializes_in_contract_order() {
        let reply = StructuredReply {
            mood: "joyful".into(),
            reply: "That's wonderful!".into(),
            category: Category::FunnyTail,
            language: "en".into(),
        };
        assert_eq!(
            serde_json::to_string(&reply).unwrap(),
            r#"{"mood":"joyful","reply":"That's wonderful!","category":"Funny Tail","language":"en"}"#
        );
    }

    fn fields(raw: &str) -> Map<String, Value> {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn kira_reply_requires_string_reply() {
        assert!(KiraReply::from_fields(fields(r#"{"reply":"hi"}"#)).is_ok());
        assert!(KiraReply::from_fields(fields(r#"{"mood":"calm"}"#)).is_err());
        assert!(KiraReply::from_fields(fields(r#"{"reply":42}"#)).is_err());
    }

    #[test]
    fn kira_reply_overwrites_in_place_and_appends_language() {
        let mut reply = KiraReply::from_fields(fields(
            r#"{"reply":"Hi","mood":"happy","category":"Funny Tale","extra":[1]}"#,
        ))
        .unwrap();
        reply.set_reply("வணக்கம்");
        reply.set_language("ta");

        assert_eq!(reply.reply(), "வணக்கம்");
        assert_eq!(reply.language(), Some("ta"));
        assert_eq!(
            serde_json::to_string(&reply).unwrap(),
            r#"{"reply":"வணக்கம்","mood":"happy","category":"Funny Tale","extra":[1],"language":"ta"}"#
        );
    }

    #[test]
    fn unknown_category_is_rejected() {
        let raw = r#"{"mood":"calm","reply":"hi","category":"Sports","language":"en"}"#;
        assert!(serde_json::from_str::<StructuredReply>(raw).is_err());
    }
}
