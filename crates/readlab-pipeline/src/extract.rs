//! Text extraction adapters

use crate::error::ExtractionError;
use readlab_domain::traits::TextExtractor;
use readlab_domain::DocumentKind;
use std::fs;
use std::path::Path;

/// Reads `.txt` and `.md` files as text
///
/// Invalid UTF-8 sequences are replaced rather than rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileExtractor;

impl TextExtractor for FileExtractor {
    type Error = ExtractionError;

    fn extract(&self, path: &Path) -> Result<String, Self::Error> {
        let bytes = read(path)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Extracts the text layer of a PDF
///
/// Scanned PDFs without a text layer come back empty; there is no OCR.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    type Error = ExtractionError;

    fn extract(&self, path: &Path) -> Result<String, Self::Error> {
        let bytes = read(path)?;
        pdf_extract::extract_text_from_mem(&bytes).map_err(|e| ExtractionError::Pdf(e.to_string()))
    }
}

/// Picks the adapter from the file extension
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoExtractor {
    file: FileExtractor,
    pdf: PdfExtractor,
}

impl AutoExtractor {
    /// Create an extractor for every supported kind
    pub fn new() -> Self {
        Self::default()
    }
}

impl TextExtractor for AutoExtractor {
    type Error = ExtractionError;

    fn extract(&self, path: &Path) -> Result<String, Self::Error> {
        match DocumentKind::from_path(path) {
            DocumentKind::Pdf => self.pdf.extract(path),
            DocumentKind::Markdown | DocumentKind::Text => self.file.extract(path),
        }
    }
}

fn read(path: &Path) -> Result<Vec<u8>, ExtractionError> {
    fs::read(path).map_err(|e| ExtractionError::Read {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}
