// ONNX Runtime question-answering model
use ort::{
    inputs,
    session::{builder::GraphOptimizationLevel, Session},
    value::Value,
};
use std::path::Path;

use super::model_source::resolve_model_files;
use super::span::{best_span, SpanCandidate};
use super::tokenizer::{QaTokenizer, QaWindow};
use super::{Answer, QuestionAnswerer};
use crate::config::ModelConfig;
use crate::types::{PdfQaError, Result};

const START_LOGITS: &str = "start_logits";
const END_LOGITS: &str = "end_logits";
const TOKEN_TYPE_IDS: &str = "token_type_ids";

pub struct OnnxQuestionAnswerer {
    session: Session,
    tokenizer: QaTokenizer,
    uses_token_type_ids: bool,
    max_answer_len: usize,
}

impl OnnxQuestionAnswerer {
    /// Resolve the configured model (local directory or hub id) and load it.
    pub fn load(config: &ModelConfig) -> Result<Self> {
        let files = resolve_model_files(config)?;
        Self::from_files(&files.model, &files.tokenizer, config)
    }

    pub fn from_files(model_path: &Path, tokenizer_path: &Path, config: &ModelConfig) -> Result<Self> {
        tracing::info!("Loading QA model from {}", model_path.display());

        let session = Session::builder()
            .map_err(PdfQaError::model)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(PdfQaError::model)?
            .with_intra_threads(config.intra_threads)
            .map_err(PdfQaError::model)?
            .commit_from_file(model_path)
            .map_err(|e| PdfQaError::Model(format!("failed to load {}: {}", model_path.display(), e)))?;

        for required in [START_LOGITS, END_LOGITS] {
            if !session.outputs.iter().any(|output| output.name == required) {
                return Err(PdfQaError::Model(format!(
                    "{} has no {} output; is it a question-answering export?",
                    model_path.display(),
                    required
                )));
            }
        }
        let uses_token_type_ids = session.inputs.iter().any(|input| input.name == TOKEN_TYPE_IDS);

        let tokenizer = QaTokenizer::from_file(tokenizer_path, config.max_seq_len, config.doc_stride)?;

        tracing::info!(
            "QA model ready ({} inputs, token_type_ids: {})",
            session.inputs.len(),
            uses_token_type_ids
        );
        Ok(Self {
            session,
            tokenizer,
            uses_token_type_ids,
            max_answer_len: config.max_answer_len,
        })
    }

    fn run_window(&mut self, window: &QaWindow) -> Result<(Vec<f32>, Vec<f32>)> {
        let shape = [1_usize, window.len()];
        let input_ids = Value::from_array((shape, window.input_ids.clone().into_boxed_slice()))
            .map_err(PdfQaError::model)?;
        let attention_mask = Value::from_array((shape, window.attention_mask.clone().into_boxed_slice()))
            .map_err(PdfQaError::model)?;

        let outputs = if self.uses_token_type_ids {
            let token_type_ids = Value::from_array((shape, window.type_ids.clone().into_boxed_slice()))
                .map_err(PdfQaError::model)?;
            self.session.run(inputs![
                "input_ids" => input_ids,
                "attention_mask" => attention_mask,
                "token_type_ids" => token_type_ids
            ])
        } else {
            self.session.run(inputs![
                "input_ids" => input_ids,
                "attention_mask" => attention_mask
            ])
        }
        .map_err(PdfQaError::model)?;

        let (_, start) = outputs[START_LOGITS]
            .try_extract_tensor::<f32>()
            .map_err(PdfQaError::model)?;
        let (_, end) = outputs[END_LOGITS]
            .try_extract_tensor::<f32>()
            .map_err(PdfQaError::model)?;
        Ok((start.to_vec(), end.to_vec()))
    }
}

impl QuestionAnswerer for OnnxQuestionAnswerer {
    fn answer(&mut self, question: &str, context: &str) -> Result<Answer> {
        let windows = self.tokenizer.windows(question, context)?;

        let mut best: Option<(SpanCandidate, usize)> = None;
        for (index, window) in windows.iter().enumerate() {
            let (start_logits, end_logits) = self.run_window(window)?;
            let Some(candidate) = best_span(
                &start_logits,
                &end_logits,
                &window.context_mask,
                window.cls_index,
                self.max_answer_len,
            ) else {
                continue;
            };
            if best.map_or(true, |(b, _)| candidate.score > b.score) {
                best = Some((candidate, index));
            }
        }

        let Some((candidate, index)) = best else {
            tracing::warn!("Context has no tokens to answer from");
            return Ok(Answer::empty());
        };
        Ok(answer_from_window(&windows[index], candidate, context))
    }
}

/// Map a token span back to the context text.
fn answer_from_window(window: &QaWindow, candidate: SpanCandidate, context: &str) -> Answer {
    match window.byte_span(candidate.start_token, candidate.end_token) {
        Some((start, end)) => Answer {
            score: candidate.score,
            start,
            end,
            answer: context.get(start..end).unwrap_or_default().to_string(),
        },
        None => Answer { score: candidate.score, ..Answer::empty() },
    }
}
