//! Error types for the Extractor

use cardsmith_domain::InputError;
use thiserror::Error;

/// Errors that can occur during extraction
///
/// `Input`, `TextTooLong`, `Persistence` and `Config` abort a run. The
/// remaining variants are raised per chunk; the pipeline records them as
/// diagnostics and moves on to the next chunk.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// The source could not be turned into text
    #[error(transparent)]
    Input(#[from] InputError),

    /// Text exceeds maximum length
    #[error("Text too long: {0} chars (max: {1})")]
    TextTooLong(usize, usize),

    /// LLM provider error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Generation timeout
    #[error("Generation timed out after {0}s")]
    Timeout(u64),

    /// The model answered without any recognizable list of pairs
    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    /// Sentence-boundary detection failed
    #[error("Segmentation error: {0}")]
    Segmentation(String),

    /// Flashcard store error; the last persisted state is still authoritative
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ExtractorError {
    /// True when the error ends the whole run rather than one chunk
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ExtractorError::Input(_)
                | ExtractorError::TextTooLong(..)
                | ExtractorError::Persistence(_)
                | ExtractorError::Config(_)
        )
    }
}
