//! File input

use cardsmith_domain::traits::TextSource;
use cardsmith_domain::{InputError, RawText};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Kinds of file the pipeline knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// `.txt`, `.md`
    PlainText,
    /// `.pdf`
    Pdf,
    /// `.jpg`, `.jpeg`, `.png`, `.bmp`, `.tiff`, `.tif`, `.webp`
    Image,
}

impl FileKind {
    /// Detect the kind from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "txt" | "md" | "text" | "markdown" => Some(FileKind::PlainText),
            "pdf" => Some(FileKind::Pdf),
            "jpg" | "jpeg" | "png" | "bmp" | "tiff" | "tif" | "webp" => Some(FileKind::Image),
            _ => None,
        }
    }
}

type Delegate = Box<dyn TextSource + Send + Sync>;

/// Reads text files and hands PDFs and images to registered extractors
pub struct FileTextSource {
    max_bytes: u64,
    pdf: Option<Delegate>,
    image: Option<Delegate>,
}

impl FileTextSource {
    /// Default size cap for input files
    pub const DEFAULT_MAX_BYTES: u64 = 20 * 1024 * 1024;

    /// Create a source that reads plain text only
    pub fn new() -> Self {
        Self {
            max_bytes: Self::DEFAULT_MAX_BYTES,
            pdf: None,
            image: None,
        }
    }

    /// Reject files larger than `max_bytes`
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Handle `.pdf` files with `extractor`
    pub fn with_pdf_extractor(mut self, extractor: impl TextSource + Send + Sync + 'static) -> Self {
        self.pdf = Some(Box::new(extractor));
        self
    }

    /// Handle image files with `extractor`
    pub fn with_image_extractor(mut self, extractor: impl TextSource + Send + Sync + 'static) -> Self {
        self.image = Some(Box::new(extractor));
        self
    }

    fn check_file(&self, path: &Path, source: &str) -> Result<(), InputError> {
        let metadata = fs::metadata(path).map_err(|e| InputError::unreadable(source, e.to_string()))?;
        if !metadata.is_file() {
            return Err(InputError::unreadable(source, "not a regular file"));
        }
        if metadata.len() > self.max_bytes {
            return Err(InputError::unreadable(
                source,
                format!("file is {} bytes, limit is {}", metadata.len(), self.max_bytes),
            ));
        }
        Ok(())
    }

    fn delegate(&self, delegate: Option<&Delegate>, source: &str, what: &str) -> Result<RawText, InputError> {
        match delegate {
            Some(extractor) => extractor.acquire_text(source),
            None => Err(InputError::unsupported_type(
                source,
                format!("no {} extractor configured", what),
            )),
        }
    }
}

impl Default for FileTextSource {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FileTextSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileTextSource")
            .field("max_bytes", &self.max_bytes)
            .field("pdf", &self.pdf.is_some())
            .field("image", &self.image.is_some())
            .finish()
    }
}

impl TextSource for FileTextSource {
    fn acquire_text(&self, source: &str) -> Result<RawText, InputError> {
        let path = Path::new(source);
        let kind = FileKind::from_path(path)
            .ok_or_else(|| InputError::unsupported_type(source, "unrecognized file extension"))?;

        self.check_file(path, source)?;
        debug!("Reading {:?} input {}", kind, source);

        match kind {
            FileKind::PlainText => {
                let bytes = fs::read(path).map_err(|e| InputError::unreadable(source, e.to_string()))?;
                Ok(RawText::with_source(decode_text(bytes), source))
            }
            FileKind::Pdf => self.delegate(self.pdf.as_ref(), source, "PDF"),
            FileKind::Image => self.delegate(self.image.as_ref(), source, "image"),
        }
    }
}

/// UTF-8, falling back to Latin-1 for legacy files
fn decode_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => e.into_bytes().into_iter().map(char::from).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardsmith_domain::InputErrorKind;
    use tempfile::tempdir;

    struct FixedText(&'static str);

    impl TextSource for FixedText {
        fn acquire_text(&self, source: &str) -> Result<RawText, InputError> {
            Ok(RawText::with_source(self.0, source))
        }
    }

    #[test]
    fn test_reads_text_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "Cells divide by mitosis.").unwrap();
        let source = path.to_string_lossy().to_string();

        let raw = FileTextSource::new().acquire_text(&source).unwrap();

        assert_eq!(raw.as_str(), "Cells divide by mitosis.");
        assert_eq!(raw.source_id(), Some(source.as_str()));
    }

    #[test]
    fn test_latin1_fallback() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("old.md");
        fs::write(&path, b"caf\xe9").unwrap();

        let raw = FileTextSource::new().acquire_text(&path.to_string_lossy()).unwrap();
        assert_eq!(raw.as_str(), "café");
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let err = FileTextSource::new().acquire_text("/nonexistent/notes.txt").unwrap_err();
        assert_eq!(err.kind, InputErrorKind::Unreadable);
    }

    #[test]
    fn test_size_cap() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big.txt");
        fs::write(&path, "x".repeat(100)).unwrap();

        let err = FileTextSource::new()
            .with_max_bytes(10)
            .acquire_text(&path.to_string_lossy())
            .unwrap_err();
        assert_eq!(err.kind, InputErrorKind::Unreadable);
    }

    #[test]
    fn test_unsupported_types() {
        let dir = tempdir().unwrap();
        let pdf = dir.path().join("paper.pdf");
        let docx = dir.path().join("report.docx");
        fs::write(&pdf, "%PDF-1.4").unwrap();
        fs::write(&docx, "PK").unwrap();

        let source = FileTextSource::new();
        assert_eq!(
            source.acquire_text(&pdf.to_string_lossy()).unwrap_err().kind,
            InputErrorKind::UnsupportedType
        );
        assert_eq!(
            source.acquire_text(&docx.to_string_lossy()).unwrap_err().kind,
            InputErrorKind::UnsupportedType
        );
    }

    #[test]
    fn test_pdf_delegate() {
        let dir = tempdir().unwrap();
        let pdf = dir.path().join("paper.PDF");
        fs::write(&pdf, "%PDF-1.4").unwrap();

        let source = FileTextSource::new().with_pdf_extractor(FixedText("Extracted text."));
        let raw = source.acquire_text(&pdf.to_string_lossy()).unwrap();
        assert_eq!(raw.as_str(), "Extracted text.");
    }

    #[test]
    fn test_file_kind_detection() {
        assert_eq!(FileKind::from_path(Path::new("a.TXT")), Some(FileKind::PlainText));
        assert_eq!(FileKind::from_path(Path::new("scan.jpeg")), Some(FileKind::Image));
        assert_eq!(FileKind::from_path(Path::new("README")), None);
    }
}
