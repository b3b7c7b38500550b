pub mod pdf;
pub mod types;

pub use pdf::*;
pub use types::*;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File does not exist: {0}")]
    NotFound(PathBuf),

    #[error("File must be a PDF")]
    UnsupportedFormat,

    #[error("File size ({size_mb:.2}MB) exceeds maximum allowed size ({max_mb}MB)")]
    TooLarge { size_mb: f64, max_mb: u64 },

    #[error("Invalid or corrupted PDF file: {0}")]
    Corrupted(String),

    #[error("Failed to extract meaningful text from PDF ({chars} characters, need {min})")]
    InsufficientText { chars: usize, min: usize },
}

impl ExtractionError {
    /// Problems with the source file itself, as opposed to its content.
    pub fn is_validation(&self) -> bool {
        !matches!(self, Self::InsufficientText { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_insufficient_text_is_a_content_failure() {
        assert!(ExtractionError::UnsupportedFormat.is_validation());
        assert!(ExtractionError::Corrupted("bad xref".into()).is_validation());
        assert!(!ExtractionError::InsufficientText { chars: 3, min: 50 }.is_validation());
    }

    #[test]
    fn size_message_reports_megabytes() {
        let e = ExtractionError::TooLarge { size_mb: 12.5, max_mb: 10 };
        assert_eq!(
            e.to_string(),
            "File size (12.50MB) exceeds maximum allowed size (10MB)"
        );
    }
}
