//! Flashcard module - candidates proposed by the model and the records we keep

use sha2::{Digest, Sha256};
use std::fmt;

/// Stable, content-derived identifier for a flashcard
///
/// The identifier is the first 128 bits of a SHA-256 digest over the
/// normalized question and answer, so ingesting identical content twice
/// always produces the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FlashcardId([u8; 16]);

impl FlashcardId {
    /// Derive the id from question/answer content
    ///
    /// Case and whitespace differences do not change the id.
    ///
    /// # Examples
    ///
    /// ```
    /// use cardsmith_domain::FlashcardId;
    ///
    /// let a = FlashcardId::from_content("What is DNA?", "A molecule.");
    /// let b = FlashcardId::from_content("what is  DNA?", "a molecule.");
    /// assert_eq!(a, b);
    /// ```
    pub fn from_content(question: &str, answer: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(question_key(question).as_bytes());
        // Unit separator keeps ("ab", "c") and ("a", "bc") apart
        hasher.update([0x1f]);
        hasher.update(question_key(answer).as_bytes());
        let digest = hasher.finalize();

        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest[..16]);
        Self(bytes)
    }

    /// Parse an id from its 32-character hex form
    ///
    /// # Examples
    ///
    /// ```
    /// use cardsmith_domain::FlashcardId;
    ///
    /// let id = FlashcardId::from_content("Q?", "An answer here");
    /// let parsed = FlashcardId::from_string(&id.to_string()).unwrap();
    /// assert_eq!(id, parsed);
    /// ```
    pub fn from_string(s: &str) -> Result<Self, String> {
        let decoded = hex::decode(s).map_err(|e| format!("Invalid flashcard id: {}", e))?;
        if decoded.len() != 16 {
            return Err(format!(
                "Invalid flashcard id: expected 16 bytes, got {}",
                decoded.len()
            ));
        }
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&decoded);
        Ok(Self(bytes))
    }

    /// Raw identifier bytes
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for FlashcardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Canonical dedup key for a piece of card text
///
/// Lowercases and collapses every whitespace run to a single space.
///
/// # Examples
///
/// ```
/// use cardsmith_domain::question_key;
///
/// assert_eq!(question_key("  What  IS\tDNA? "), "what is dna?");
/// ```
pub fn question_key(text: &str) -> String {
    text.split_whitespace()
        .map(|word| word.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// An unvalidated question/answer pair proposed by the generative model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Question text
    pub question: String,

    /// Answer text
    pub answer: String,

    /// Index of the chunk the pair was generated from
    pub source_chunk_index: usize,
}

impl Candidate {
    /// Create a new candidate
    pub fn new(
        question: impl Into<String>,
        answer: impl Into<String>,
        source_chunk_index: usize,
    ) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            source_chunk_index,
        }
    }

    /// Dedup key of the question
    pub fn key(&self) -> String {
        question_key(&self.question)
    }
}

/// A validated, deduplicated question/answer record
///
/// Flashcards are owned by the store and immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flashcard {
    /// Content-derived identifier
    pub id: FlashcardId,

    /// Question text
    pub question: String,

    /// Answer text
    pub answer: String,

    /// Creation time (seconds since Unix epoch)
    pub created_at: u64,
}

impl Flashcard {
    /// Build a flashcard from an accepted candidate
    ///
    /// Question and answer are trimmed; the id is derived from the trimmed
    /// content.
    pub fn from_candidate(candidate: &Candidate, created_at: u64) -> Self {
        let question = candidate.question.trim().to_string();
        let answer = candidate.answer.trim().to_string();
        Self {
            id: FlashcardId::from_content(&question, &answer),
            question,
            answer,
            created_at,
        }
    }

    /// Dedup key of the question
    pub fn key(&self) -> String {
        question_key(&self.question)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: the key is a fixed point of itself
        #[test]
        fn test_question_key_idempotent(s in "\\PC{0,64}") {
            let once = question_key(&s);
            prop_assert_eq!(question_key(&once), once);
        }

        /// Property: Round-trip through string representation preserves ID
        #[test]
        fn test_id_string_roundtrip(q in "\\PC{0,32}", a in "\\PC{0,32}") {
            let id = FlashcardId::from_content(&q, &a);
            match FlashcardId::from_string(&id.to_string()) {
                Ok(parsed) => prop_assert_eq!(id, parsed),
                Err(e) => return Err(TestCaseError::fail(e)),
            }
        }
    }
}
