// Rendering pipeline results for stdout
use serde::Serialize;

use crate::pipeline::PipelineOutput;
use crate::types::{PdfQaError, Result, TextSource};

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    question: &'a str,
    answer: &'a str,
    score: f32,
    start: usize,
    end: usize,
    source: TextSource,
}

pub fn render(output: &PipelineOutput, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(output)),
        OutputFormat::Json => render_json(output),
    }
}

fn render_text(output: &PipelineOutput) -> String {
    let answer = &output.answer;
    format!(
        "Question: {}\nAnswer: {}\nAnswer with score: {{score: {:.4}, start: {}, end: {}, answer: {:?}}}\n",
        output.question, answer.answer, answer.score, answer.start, answer.end, answer.answer
    )
}

fn render_json(output: &PipelineOutput) -> Result<String> {
    let report = JsonReport {
        question: &output.question,
        answer: &output.answer.answer,
        score: output.answer.score,
        start: output.answer.start,
        end: output.answer.end,
        source: output.context.source,
    };
    serde_json::to_string_pretty(&report).map_err(|e| PdfQaError::Io(e.into()))
}
