use std::path::Path;

use super::ExtractionError;

/// Minimum characters of extracted text worth sending to the model.
pub const MIN_TEXT_CHARS: usize = 50;

/// Source document validation and text extraction (allows mocking).
///
/// Both calls block on file I/O and parsing; async callers run them on the
/// blocking pool.
pub trait DocumentExtractor: Send + Sync {
    /// Check that `path` is a readable, well-formed document of the
    /// supported type and size.
    fn validate(&self, path: &Path) -> Result<(), ExtractionError>;

    /// Plain text of the document at `path`.
    fn extract_text(&self, path: &Path) -> Result<String, ExtractionError>;
}

/// Mock extractor for testing: returns configured text, or fails
/// validation when built with [`MockDocumentExtractor::invalid`].
pub struct MockDocumentExtractor {
    text: String,
    invalid: bool,
}

impl MockDocumentExtractor {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            invalid: false,
        }
    }

    pub fn invalid() -> Self {
        Self {
            text: String::new(),
            invalid: true,
        }
    }
}

impl DocumentExtractor for MockDocumentExtractor {
    fn validate(&self, _path: &Path) -> Result<(), ExtractionError> {
        if self.invalid {
            return Err(ExtractionError::Corrupted("mock rejection".into()));
        }
        Ok(())
    }

    fn extract_text(&self, _path: &Path) -> Result<String, ExtractionError> {
        let chars = self.text.trim().chars().count();
        if chars < MIN_TEXT_CHARS {
            return Err(ExtractionError::InsufficientText {
                chars,
                min: MIN_TEXT_CHARS,
            });
        }
        Ok(self.text.clone())
    }
}
