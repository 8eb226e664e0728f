// Extractive question answering
pub mod model_source;
pub mod onnx_model;
pub mod span;
pub mod tokenizer;

use serde::Serialize;

use crate::types::Result;

pub use model_source::{resolve_model_files, ModelFiles};
pub use onnx_model::OnnxQuestionAnswerer;
pub use tokenizer::{QaTokenizer, QaWindow};

/// A span of the context chosen as the answer. `start..end` is a byte range
/// of the context the question was asked against.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub score: f32,
    pub start: usize,
    pub end: usize,
    pub answer: String,
}

impl Answer {
    /// The result for a context with nothing to select from.
    pub fn empty() -> Self {
        Self {
            score: 0.0,
            start: 0,
            end: 0,
            answer: String::new(),
        }
    }
}

/// Anything that maps (question, context) to an answer span.
pub trait QuestionAnswerer {
    fn answer(&mut self, question: &str, context: &str) -> Result<Answer>;
}
