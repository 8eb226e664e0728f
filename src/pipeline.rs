// extract -> fallback OCR -> clean -> answer
use std::time::Instant;

use crate::config::PipelineConfig;
use crate::pdf_extraction::{clean_text, get_page_count, ExtractionRouter, OcrEngine};
use crate::qa::{Answer, QuestionAnswerer};
use crate::types::{Result, TextSource};

/// Clean text ready to be used as QA context.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedContext {
    pub source: TextSource,
    pub page_count: usize,
    pub raw_chars: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub question: String,
    pub context: PreparedContext,
    pub answer: Answer,
}

/// Extract the document's text (with OCR fallback) and normalize it.
pub fn prepare_context(config: &PipelineConfig, ocr: &mut dyn OcrEngine) -> Result<PreparedContext> {
    let mut router = ExtractionRouter::new(config.extraction.clone(), ocr);
    let extraction = router.extract(&config.document_path)?;
    let page_count = get_page_count(&config.document_path)?;

    let source = extraction.text.source();
    let raw = extraction.text.into_text();
    let text = clean_text(&raw);
    tracing::debug!("Cleaned {} chars down to {}", raw.chars().count(), text.len());

    Ok(PreparedContext {
        source,
        page_count,
        raw_chars: raw.chars().count(),
        text,
    })
}

/// Run the whole pipeline for the configured document and question.
pub fn run(
    config: &PipelineConfig,
    ocr: &mut dyn OcrEngine,
    qa: &mut dyn QuestionAnswerer,
) -> Result<PipelineOutput> {
    let context = prepare_context(config, ocr)?;

    let start = Instant::now();
    let answer = qa.answer(&config.question, &context.text)?;
    tracing::info!(
        "Answered in {} ms (score {:.4})",
        start.elapsed().as_millis(),
        answer.score
    );

    Ok(PipelineOutput {
        question: config.question.clone(),
        context,
        answer,
    })
}
