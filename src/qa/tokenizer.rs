// QA Tokenizer Module
//
// Question and context are encoded as a pair. Only the context is truncated;
// when it does not fit, the tokenizer emits overlapping windows so every part
// of the context is seen with the full question.
use std::path::Path;
use tokenizers::tokenizer::{Encoding, Tokenizer, TruncationDirection, TruncationParams, TruncationStrategy};

use crate::types::{PdfQaError, Result};

/// One model input: `[CLS] question [SEP] context-window [SEP]` or the
/// tokenizer's equivalent template.
#[derive(Debug, Clone)]
pub struct QaWindow {
    pub input_ids: Vec<i64>,
    pub attention_mask: Vec<i64>,
    pub type_ids: Vec<i64>,
    /// True where the token belongs to the context.
    pub context_mask: Vec<bool>,
    /// Byte offsets into the context, meaningful where `context_mask` is set.
    pub offsets: Vec<(usize, usize)>,
    /// Position of the classifier token, when the vocabulary has one.
    pub cls_index: Option<usize>,
}

impl QaWindow {
    fn from_encoding(encoding: &Encoding, cls_id: Option<u32>) -> Self {
        let to_i64 = |values: &[u32]| values.iter().map(|&v| v as i64).collect::<Vec<_>>();
        Self {
            input_ids: to_i64(encoding.get_ids()),
            attention_mask: to_i64(encoding.get_attention_mask()),
            type_ids: to_i64(encoding.get_type_ids()),
            context_mask: encoding
                .get_sequence_ids()
                .into_iter()
                .map(|sequence| sequence == Some(1))
                .collect(),
            offsets: encoding.get_offsets().to_vec(),
            cls_index: cls_id.and_then(|id| encoding.get_ids().iter().position(|&token| token == id)),
        }
    }

    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }

    pub fn context_tokens(&self) -> usize {
        self.context_mask.iter().filter(|&&c| c).count()
    }

    /// Byte range of the context covered by tokens `start..=end`.
    pub fn byte_span(&self, start: usize, end: usize) -> Option<(usize, usize)> {
        let (from, _) = *self.offsets.get(start)?;
        let (_, to) = *self.offsets.get(end)?;
        (from <= to).then_some((from, to))
    }
}

const CLS_TOKENS: [&str; 2] = ["[CLS]", "<s>"];

pub struct QaTokenizer {
    tokenizer: Tokenizer,
    cls_id: Option<u32>,
    max_seq_len: usize,
    doc_stride: usize,
}

impl QaTokenizer {
    pub fn from_file(path: &Path, max_seq_len: usize, doc_stride: usize) -> Result<Self> {
        let tokenizer = Tokenizer::from_file(path).map_err(|e| {
            PdfQaError::Model(format!("failed to load tokenizer {}: {}", path.display(), e))
        })?;
        Ok(Self::new(tokenizer, max_seq_len, doc_stride))
    }

    pub fn new(mut tokenizer: Tokenizer, max_seq_len: usize, doc_stride: usize) -> Self {
        // One window per run; padding would only add masked tokens.
        tokenizer.with_padding(None);
        let cls_id = CLS_TOKENS.iter().find_map(|token| tokenizer.token_to_id(token));
        Self { tokenizer, cls_id, max_seq_len, doc_stride }
    }

    fn encode_len(&mut self, input: tokenizers::EncodeInput<'_>, add_special_tokens: bool) -> Result<usize> {
        self.tokenizer
            .with_truncation(None)
            .map_err(PdfQaError::model)?;
        let encoding = self
            .tokenizer
            .encode(input, add_special_tokens)
            .map_err(PdfQaError::model)?;
        Ok(encoding.len())
    }

    /// Encode the pair into one or more windows no longer than `max_seq_len`.
    pub fn windows(&mut self, question: &str, context: &str) -> Result<Vec<QaWindow>> {
        let question_len = self.encode_len(question.into(), false)?;
        let special_len = self.encode_len(("", "").into(), true)?;
        let budget = self.max_seq_len.saturating_sub(question_len + special_len);
        if budget == 0 {
            return Err(PdfQaError::Model(format!(
                "question uses {} tokens, leaving no room for context in {}",
                question_len, self.max_seq_len
            )));
        }
        let stride = self.doc_stride.min(budget - 1);

        self.tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: self.max_seq_len,
                strategy: TruncationStrategy::OnlySecond,
                stride,
                direction: TruncationDirection::Right,
            }))
            .map_err(PdfQaError::model)?;

        let mut encoding = self
            .tokenizer
            .encode((question, context), true)
            .map_err(PdfQaError::model)?;
        let overflowing = encoding.take_overflowing();

        let windows: Vec<QaWindow> = std::iter::once(&encoding)
            .chain(overflowing.iter())
            .map(|encoding| QaWindow::from_encoding(encoding, self.cls_id))
            .collect();
        tracing::debug!(
            "Tokenized question ({} tokens) and context into {} windows",
            question_len,
            windows.len()
        );
        Ok(windows)
    }
}
