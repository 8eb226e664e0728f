// PDF extraction module
pub mod extraction_router;
pub mod images;
pub mod lopdf_helper;
pub mod normalizer;
pub mod ocr_engine;
pub mod text_layer;

#[cfg(test)]
pub(crate) mod fixtures;

pub use extraction_router::{needs_fallback, resolve_text, ExtractionResult, ExtractionRouter};
pub use images::extract_images;
pub use normalizer::clean_text;
pub use ocr_engine::{ocr_images, OcrEngine, TesseractOcr};
pub use text_layer::{extract_text_layer, get_page_count};
