//! Input collaborator errors

use std::fmt;

/// What went wrong while acquiring text from a source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputErrorKind {
    /// The source does not exist or cannot be read
    Unreadable,
    /// The source type is not handled by any configured extractor
    UnsupportedType,
    /// The source was read but text extraction failed
    ExtractionFailed,
}

impl InputErrorKind {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            InputErrorKind::Unreadable => "unreadable",
            InputErrorKind::UnsupportedType => "unsupported_type",
            InputErrorKind::ExtractionFailed => "extraction_failed",
        }
    }
}

/// Failure to turn a source into text
///
/// Unrecoverable for that source; surfaced to the caller unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputError {
    /// Failure category
    pub kind: InputErrorKind,

    /// The source that failed (path or other identifier)
    pub source: String,

    /// Human-readable detail
    pub message: String,
}

impl InputError {
    /// Create a new input error
    pub fn new(kind: InputErrorKind, source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            source: source.into(),
            message: message.into(),
        }
    }

    /// Source could not be read
    pub fn unreadable(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(InputErrorKind::Unreadable, source, message)
    }

    /// Source type is not supported
    pub fn unsupported_type(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(InputErrorKind::UnsupportedType, source, message)
    }

    /// Text extraction failed
    pub fn extraction_failed(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(InputErrorKind::ExtractionFailed, source, message)
    }
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Failed to process input '{}' ({}): {}",
            self.source,
            self.kind.as_str(),
            self.message
        )
    }
}

impl std::error::Error for InputError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind_and_source() {
        let err = InputError::unsupported_type("scan.pdf", "no PDF extractor configured");
        let msg = err.to_string();
        assert!(msg.contains("scan.pdf"));
        assert!(msg.contains("unsupported_type"));
        assert!(msg.contains("no PDF extractor configured"));
    }
}
