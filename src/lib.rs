// pdfqa - question answering over PDF documents
pub mod config;
pub mod pdf_extraction;
pub mod pipeline;
pub mod qa;
pub mod report;
pub mod types;

pub use types::{ExtractedText, PdfQaError, Result, TextSource};
