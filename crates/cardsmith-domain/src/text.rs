//! Text value types flowing into the pipeline

use std::fmt;

/// Text as handed over by an input collaborator
///
/// Created once per input and never mutated. The optional source identifier
/// is carried through to reports and logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawText {
    text: String,
    source_id: Option<String>,
}

impl RawText {
    /// Wrap a string without a source identifier
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_id: None,
        }
    }

    /// Wrap a string and remember where it came from
    ///
    /// # Examples
    ///
    /// ```
    /// use cardsmith_domain::RawText;
    ///
    /// let raw = RawText::with_source("Cells divide.", "biology.txt");
    /// assert_eq!(raw.source_id(), Some("biology.txt"));
    /// ```
    pub fn with_source(text: impl Into<String>, source_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_id: Some(source_id.into()),
        }
    }

    /// The raw text
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Source identifier, if one was given
    pub fn source_id(&self) -> Option<&str> {
        self.source_id.as_deref()
    }

    /// True when the text holds nothing but whitespace
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Cleaned, canonical text produced by the normalizer
///
/// Lines are single-spaced and paragraphs are separated by exactly one blank
/// line. Construction is restricted to the normalizer so the invariants hold
/// for every value of this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedText {
    text: String,
}

impl NormalizedText {
    /// Wrap already-normalized text.
    ///
    /// Callers outside the normalizer should only use this for text that came
    /// out of a normalizer earlier (e.g. reloaded from a cache).
    pub fn from_normalized(text: String) -> Self {
        Self { text }
    }

    /// The normalized text
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// True when normalization left nothing behind
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Number of whitespace-separated words
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    /// Consume and return the inner string
    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Display for NormalizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
