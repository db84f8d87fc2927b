//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the pipeline and its
//! collaborators. Implementations live in other crates.

use crate::{Candidate, Flashcard, InputError, RawText};
use std::sync::Arc;

/// Trait for generative model operations
///
/// Implemented by the infrastructure layer (cardsmith-llm)
pub trait LlmProvider {
    /// Error type for LLM operations
    type Error;

    /// Generate a completion of at most `max_tokens` tokens
    fn generate(&self, prompt: &str, max_tokens: usize) -> Result<String, Self::Error>;

    /// Name of the underlying model, for reports
    fn model_name(&self) -> &str {
        "llm"
    }
}

impl<T: LlmProvider + ?Sized> LlmProvider for Arc<T> {
    type Error = T::Error;

    fn generate(&self, prompt: &str, max_tokens: usize) -> Result<String, Self::Error> {
        (**self).generate(prompt, max_tokens)
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

/// Trait for sentence-boundary detection
///
/// Implemented by the infrastructure layer (cardsmith-llm)
pub trait SentenceSegmenter {
    /// Error type for segmentation
    type Error;

    /// Split text into sentence spans
    ///
    /// Returns byte offset pairs `(start, end)` that cover the entire input,
    /// in ascending order, without overlap.
    fn segment_sentences(&self, text: &str) -> Result<Vec<(usize, usize)>, Self::Error>;
}

impl<T: SentenceSegmenter + ?Sized> SentenceSegmenter for Arc<T> {
    type Error = T::Error;

    fn segment_sentences(&self, text: &str) -> Result<Vec<(usize, usize)>, Self::Error> {
        (**self).segment_sentences(text)
    }
}

/// Result of inserting a batch of candidates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertOutcome {
    /// Candidates turned into new flashcards
    pub accepted: usize,

    /// Candidates rejected because their question key already exists
    pub rejected_duplicate: usize,
}

impl InsertOutcome {
    /// Fold another outcome into this one
    pub fn merge(&mut self, other: InsertOutcome) {
        self.accepted += other.accepted;
        self.rejected_duplicate += other.rejected_duplicate;
    }
}

/// Trait for the persistent flashcard collection
///
/// Implemented by the infrastructure layer (cardsmith-store)
pub trait FlashcardStore {
    /// Error type for store operations
    type Error;

    /// Insert candidates, suppressing duplicates, and persist the result
    fn insert(&mut self, candidates: &[Candidate]) -> Result<InsertOutcome, Self::Error>;

    /// All flashcards in insertion order
    fn flashcards(&self) -> &[Flashcard];

    /// Number of flashcards held
    fn len(&self) -> usize {
        self.flashcards().len()
    }

    /// True when the collection holds no flashcards
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Trait for acquiring text from an input source
///
/// Implemented by the application layer (cardsmith-extractor)
pub trait TextSource {
    /// Produce the text of `source` as a single string
    fn acquire_text(&self, source: &str) -> Result<RawText, InputError>;
}
