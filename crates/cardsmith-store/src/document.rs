//! On-disk document shapes
//!
//! Current format:
//!
//! ```json
//! { "version": 1, "flashcards": [ { "id": "...", "question": "...", "answer": "...", "created_at": 0 } ] }
//! ```
//!
//! The legacy format is a bare array of `{"Question": ..., "Answer": ...}`
//! objects; it is read and rewritten in the current format on the next save.

use cardsmith_domain::{Flashcard, FlashcardId};
use serde::{Deserialize, Serialize};

/// Version written by this build
pub const CURRENT_VERSION: u32 = 1;

/// Serialized form of a flashcard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashcardRecord {
    /// Hex-encoded content id
    pub id: String,
    /// Question text
    pub question: String,
    /// Answer text
    pub answer: String,
    /// Creation time (seconds since Unix epoch)
    pub created_at: u64,
}

impl From<&Flashcard> for FlashcardRecord {
    fn from(card: &Flashcard) -> Self {
        Self {
            id: card.id.to_string(),
            question: card.question.clone(),
            answer: card.answer.clone(),
            created_at: card.created_at,
        }
    }
}

impl TryFrom<FlashcardRecord> for Flashcard {
    type Error = String;

    fn try_from(record: FlashcardRecord) -> Result<Self, Self::Error> {
        Ok(Flashcard {
            id: FlashcardId::from_string(&record.id)?,
            question: record.question,
            answer: record.answer,
            created_at: record.created_at,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct StoreDocument {
    pub version: u32,
    pub flashcards: Vec<FlashcardRecord>,
}

impl StoreDocument {
    pub fn from_cards(cards: &[Flashcard]) -> Self {
        Self {
            version: CURRENT_VERSION,
            flashcards: cards.iter().map(FlashcardRecord::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LegacyRecord {
    #[serde(rename = "Question", alias = "question")]
    question: String,
    #[serde(rename = "Answer", alias = "answer")]
    answer: String,
}

/// Decoded contents of a store file
#[derive(Debug)]
pub(crate) struct Decoded {
    pub cards: Vec<Flashcard>,
    pub legacy: bool,
}

/// Parse a store file in either format
///
/// `now` stamps records migrated from the legacy format, which carry no
/// creation time.
pub(crate) fn decode(content: &str, now: u64) -> Result<Decoded, String> {
    let value: serde_json::Value = serde_json::from_str(content).map_err(|e| e.to_string())?;

    match value {
        serde_json::Value::Array(_) => {
            let records: Vec<LegacyRecord> =
                serde_json::from_value(value).map_err(|e| format!("legacy format: {}", e))?;
            let cards = records
                .into_iter()
                .map(|r| {
                    let candidate = cardsmith_domain::Candidate::new(r.question, r.answer, 0);
                    Flashcard::from_candidate(&candidate, now)
                })
                .collect();
            Ok(Decoded { cards, legacy: true })
        }
        serde_json::Value::Object(_) => {
            let document: StoreDocument = serde_json::from_value(value).map_err(|e| e.to_string())?;
            if document.version > CURRENT_VERSION {
                return Err(format!(
                    "unsupported version {} (newest known is {})",
                    document.version, CURRENT_VERSION
                ));
            }
            let cards = document
                .flashcards
                .into_iter()
                .map(Flashcard::try_from)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Decoded { cards, legacy: false })
        }
        other => Err(format!("expected an object or array, found {}", json_kind(&other))),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
