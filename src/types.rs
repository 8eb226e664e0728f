// Core types and constants for pdfqa
use serde::Serialize;

/// Stripped character count below which the text layer is considered empty.
pub const DEFAULT_FALLBACK_THRESHOLD: usize = 10;

/// Page segmentation mode 6: assume a single uniform block of text.
pub const DEFAULT_PAGE_SEGMENTATION_MODE: u32 = 6;

/// Raw text of a document, tagged with the extractor that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractedText {
    Primary(String),
    Fallback(String),
}

impl ExtractedText {
    pub fn text(&self) -> &str {
        match self {
            ExtractedText::Primary(text) | ExtractedText::Fallback(text) => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            ExtractedText::Primary(text) | ExtractedText::Fallback(text) => text,
        }
    }

    pub fn source(&self) -> TextSource {
        match self {
            ExtractedText::Primary(_) => TextSource::Primary,
            ExtractedText::Fallback(_) => TextSource::Fallback,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextSource {
    Primary,
    Fallback,
}

impl std::fmt::Display for TextSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TextSource::Primary => f.write_str("primary"),
            TextSource::Fallback => f.write_str("fallback"),
        }
    }
}

// Error types
#[derive(Debug, thiserror::Error)]
pub enum PdfQaError {
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("image decode error: {0}")]
    ImageDecode(String),

    #[error("OCR error: {0}")]
    Ocr(String),

    #[error("model error: {0}")]
    Model(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PdfQaError {
    pub fn model(err: impl std::fmt::Display) -> Self {
        PdfQaError::Model(err.to_string())
    }

    pub fn decode(err: impl std::fmt::Display) -> Self {
        PdfQaError::ImageDecode(err.to_string())
    }
}

impl From<image::ImageError> for PdfQaError {
    fn from(err: image::ImageError) -> Self {
        PdfQaError::ImageDecode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PdfQaError>;
