// Text layer vs. OCR routing
//
// The text layer is tried first. When its trimmed length is below the
// fallback threshold the document is treated as scanned: its embedded images
// are decoded and run through OCR, and that text replaces the text layer
// entirely. A document whose real text is shorter than the threshold is
// indistinguishable from a failed extraction and also goes through OCR.

use std::path::Path;
use std::time::Instant;

use super::images::extract_images;
use super::ocr_engine::{ocr_images, OcrEngine};
use super::text_layer::extract_text_layer;
use crate::config::{ExtractionConfig, ExtractionMode};
use crate::types::{ExtractedText, Result};

/// Extraction result with timing
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    pub text: ExtractedText,
    pub extraction_time_ms: u64,
}

/// True when the text layer is too short to be trusted.
pub fn needs_fallback(primary: &str, threshold: usize) -> bool {
    primary.trim().chars().count() < threshold
}

/// The single fallback decision: keep `primary`, or discard it for the
/// output of `fallback`. `fallback` runs only when it is needed.
pub fn resolve_text<F>(primary: String, threshold: usize, fallback: F) -> Result<ExtractedText>
where
    F: FnOnce() -> Result<String>,
{
    if needs_fallback(&primary, threshold) {
        tracing::warn!("No text found in text layer, falling back to OCR");
        Ok(ExtractedText::Fallback(fallback()?))
    } else {
        Ok(ExtractedText::Primary(primary))
    }
}

/// Router for determining extraction strategy
pub struct ExtractionRouter<'a> {
    config: ExtractionConfig,
    ocr: &'a mut dyn OcrEngine,
}

impl<'a> ExtractionRouter<'a> {
    pub fn new(config: ExtractionConfig, ocr: &'a mut dyn OcrEngine) -> Self {
        Self { config, ocr }
    }

    pub fn extract(&mut self, pdf_path: &Path) -> Result<ExtractionResult> {
        let start = Instant::now();
        tracing::info!("Extracting {} ({:?} mode)", pdf_path.display(), self.config.mode);

        let text = match self.config.mode {
            ExtractionMode::Auto => {
                let primary = extract_text_layer(pdf_path)?;
                let ocr = &mut *self.ocr;
                resolve_text(primary, self.config.fallback_threshold, || ocr_document(ocr, pdf_path))?
            }
            ExtractionMode::Native => ExtractedText::Primary(extract_text_layer(pdf_path)?),
            ExtractionMode::Ocr => ExtractedText::Fallback(ocr_document(self.ocr, pdf_path)?),
        };

        let extraction_time_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            "Extracted {} chars from {} text in {} ms",
            text.text().chars().count(),
            text.source(),
            extraction_time_ms
        );
        Ok(ExtractionResult { text, extraction_time_ms })
    }
}

/// Image extraction followed by OCR. Decoded images are dropped on return.
fn ocr_document(ocr: &mut dyn OcrEngine, pdf_path: &Path) -> Result<String> {
    let images = extract_images(pdf_path)?;
    ocr_images(ocr, &images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DEFAULT_FALLBACK_THRESHOLD;
    use rstest::rstest;
    use std::cell::Cell;

    #[rstest]
    #[case("", true)]
    #[case("  ", true)]
    #[case("\n\n\t  \n", true)]
    #[case("123456789", true)]
    #[case("  short  \n", true)]
    #[case("1234567890", false)]
    #[case("Hello, World! This is page one.", false)]
    #[case("\n   exactly10!   \n", false)]
    fn threshold_decides_fallback(#[case] primary: &str, #[case] expected: bool) {
        assert_eq!(needs_fallback(primary, DEFAULT_FALLBACK_THRESHOLD), expected);
    }

    #[test]
    fn threshold_counts_characters_not_bytes() {
        // 9 characters, 18 bytes
        assert!(needs_fallback("ééééééééé", 10));
    }

    #[test]
    fn long_primary_text_never_runs_fallback() {
        let calls = Cell::new(0);
        let text = resolve_text("Hello, World! This is page one.".to_string(), 10, || {
            calls.set(calls.get() + 1);
            Ok("ocr".to_string())
        })
        .unwrap();

        assert_eq!(calls.get(), 0);
        assert_eq!(text, ExtractedText::Primary("Hello, World! This is page one.".to_string()));
    }

    #[test]
    fn short_primary_text_is_replaced_by_fallback() {
        let calls = Cell::new(0);
        let text = resolve_text("  ".to_string(), 10, || {
            calls.set(calls.get() + 1);
            Ok("recovered by ocr\n".to_string())
        })
        .unwrap();

        assert_eq!(calls.get(), 1);
        assert_eq!(text, ExtractedText::Fallback("recovered by ocr\n".to_string()));
    }

    #[test]
    fn fallback_errors_propagate() {
        let result = resolve_text(String::new(), 10, || {
            Err(crate::types::PdfQaError::Ocr("engine missing".to_string()))
        });
        assert!(result.is_err());
    }

    #[test]
    fn custom_threshold_is_honoured() {
        assert!(!needs_fallback("abc", 3));
        assert!(needs_fallback("abc", 4));
        assert!(!needs_fallback("", 0));
    }
}
