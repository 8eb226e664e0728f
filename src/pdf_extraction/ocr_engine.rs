// OCR Engine module for Tesseract
use image::{DynamicImage, ImageFormat};
use std::process::Command;

use crate::config::OcrConfig;
use crate::types::{PdfQaError, Result};

/// Anything that turns pixels into text.
pub trait OcrEngine {
    fn recognize(&mut self, image: &DynamicImage) -> Result<String>;
}

/// Run the engine over each image in order. Every image's text is followed
/// by a newline; an empty input gives an empty string.
pub fn ocr_images(engine: &mut dyn OcrEngine, images: &[DynamicImage]) -> Result<String> {
    let mut text = String::new();
    for (index, image) in images.iter().enumerate() {
        let recognized = engine.recognize(image)?;
        tracing::debug!("Image {}: {} chars recognized", index + 1, recognized.chars().count());
        text.push_str(&recognized);
        text.push('\n');
    }
    Ok(text)
}

/// The `tesseract` command-line engine.
pub struct TesseractOcr {
    command: String,
    language: String,
    page_segmentation_mode: u32,
}

impl TesseractOcr {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            command: config.tesseract_cmd.clone(),
            language: config.language.clone(),
            page_segmentation_mode: config.page_segmentation_mode,
        }
    }

    pub fn is_available(&self) -> bool {
        Command::new(&self.command).arg("--version").output().is_ok()
    }

    fn args(&self) -> Vec<String> {
        vec![
            "stdout".to_string(),
            "-l".to_string(),
            self.language.clone(),
            "--psm".to_string(),
            self.page_segmentation_mode.to_string(),
        ]
    }
}

impl OcrEngine for TesseractOcr {
    fn recognize(&mut self, image: &DynamicImage) -> Result<String> {
        // Dropping the handle removes the file.
        let input = tempfile::Builder::new()
            .prefix("pdfqa-ocr-")
            .suffix(".png")
            .tempfile()?;
        image
            .save_with_format(input.path(), ImageFormat::Png)
            .map_err(|e| PdfQaError::Ocr(format!("cannot write OCR input: {}", e)))?;

        let output = Command::new(&self.command)
            .arg(input.path())
            .args(self.args())
            .output()
            .map_err(|e| PdfQaError::Ocr(format!("failed to run {}: {}", self.command, e)))?;

        if !output.status.success() {
            return Err(PdfQaError::Ocr(format!(
                "{} exited with {}: {}",
                self.command,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
