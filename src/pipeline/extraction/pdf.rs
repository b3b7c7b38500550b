use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use super::types::{DocumentExtractor, MIN_TEXT_CHARS};
use super::ExtractionError;

const PDF_HEADER: &[u8] = b"%PDF-";
const PDF_EOF_MARKER: &[u8] = b"%%EOF";
/// How far from the end of the file the end-of-file marker may sit.
const EOF_SEARCH_WINDOW: usize = 1024;
/// Below this many characters the next extraction method is tried.
const PREFERRED_TEXT_CHARS: usize = 100;

/// One way of pulling a text layer out of PDF bytes.
type ExtractionMethod = fn(&[u8]) -> Result<String, String>;

/// Extraction methods in the order they are tried.
const EXTRACTION_METHODS: &[(&str, ExtractionMethod)] = &[
    ("pdf-extract", extract_with_pdf_extract),
    ("lopdf", extract_with_lopdf),
];

/// PDF text extractor for digital PDFs with embedded text layers. Uses
/// pdf-extract and falls back to lopdf's own text extraction.
pub struct PdfTextExtractor {
    max_size_bytes: u64,
}

impl PdfTextExtractor {
    pub fn new(max_size_mb: u64) -> Self {
        Self {
            max_size_bytes: max_size_mb.saturating_mul(1024 * 1024),
        }
    }

    fn max_size_mb(&self) -> u64 {
        self.max_size_bytes / (1024 * 1024)
    }
}

fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

fn check_markers(bytes: &[u8]) -> Result<(), ExtractionError> {
    if !bytes.starts_with(PDF_HEADER) {
        return Err(ExtractionError::Corrupted("missing PDF header".into()));
    }
    let tail = &bytes[bytes.len().saturating_sub(EOF_SEARCH_WINDOW)..];
    if !tail.windows(PDF_EOF_MARKER.len()).any(|w| w == PDF_EOF_MARKER) {
        return Err(ExtractionError::Corrupted("missing end-of-file marker, file may be truncated".into()));
    }
    Ok(())
}

impl DocumentExtractor for PdfTextExtractor {
    fn validate(&self, path: &Path) -> Result<(), ExtractionError> {
        let metadata = fs::metadata(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ExtractionError::NotFound(path.to_path_buf()),
            _ => ExtractionError::Io(e),
        })?;
        if !metadata.is_file() {
            return Err(ExtractionError::NotFound(path.to_path_buf()));
        }
        if !has_pdf_extension(path) {
            return Err(ExtractionError::UnsupportedFormat);
        }
        if metadata.len() > self.max_size_bytes {
            return Err(ExtractionError::TooLarge {
                size_mb: metadata.len() as f64 / (1024.0 * 1024.0),
                max_mb: self.max_size_mb(),
            });
        }
        check_markers(&fs::read(path)?)
    }

    fn extract_text(&self, path: &Path) -> Result<String, ExtractionError> {
        let bytes = fs::read(path)?;
        let text = extract_with(EXTRACTION_METHODS, &bytes)?;
        tracing::info!(chars = text.chars().count(), "Extracted text from PDF");
        Ok(text)
    }
}

fn extract_with_pdf_extract(bytes: &[u8]) -> Result<String, String> {
    // pdf-extract panics on some malformed font tables.
    std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
        .map_err(|_| "pdf-extract panicked".to_string())?
        .map_err(|e| e.to_string())
}

fn extract_with_lopdf(bytes: &[u8]) -> Result<String, String> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| e.to_string())?;
    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    doc.extract_text(&pages).map_err(|e| e.to_string())
}

/// Try each method in turn, stopping at the first that yields a full text
/// layer. Otherwise the longest result is used if it meets the minimum.
fn extract_with(
    methods: &[(&str, ExtractionMethod)],
    bytes: &[u8],
) -> Result<String, ExtractionError> {
    let mut best: Option<String> = None;
    let mut errors = Vec::new();

    for &(name, method) in methods {
        match method(bytes) {
            Ok(text) => {
                let text = text.trim().to_string();
                let chars = text.chars().count();
                if chars >= PREFERRED_TEXT_CHARS {
                    return Ok(text);
                }
                tracing::debug!(method = name, chars, "Extraction method came up short");
                if best.as_ref().map_or(true, |b| chars > b.chars().count()) {
                    best = Some(text);
                }
            }
            Err(e) => {
                tracing::debug!(method = name, error = %e, "Extraction method failed");
                errors.push(format!("{name}: {e}"));
            }
        }
    }

    match best {
        Some(text) if text.chars().count() >= MIN_TEXT_CHARS => Ok(text),
        Some(text) => Err(ExtractionError::InsufficientText {
            chars: text.chars().count(),
            min: MIN_TEXT_CHARS,
        }),
        None => Err(ExtractionError::Corrupted(errors.join("; "))),
    }
}
