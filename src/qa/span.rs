// Answer span selection from start/end logits

/// Best span inside one tokenized window, as inclusive token indices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpanCandidate {
    pub start_token: usize,
    pub end_token: usize,
    pub score: f32,
}

/// Logit given to tokens that may not be part of an answer.
const MASKED_LOGIT: f32 = -10_000.0;

fn masked_softmax(logits: &[f32], allowed: &[bool]) -> Vec<f32> {
    let masked: Vec<f32> = logits
        .iter()
        .zip(allowed)
        .map(|(&logit, &ok)| if ok { logit } else { MASKED_LOGIT })
        .collect();
    let max = masked.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exp: Vec<f32> = masked.iter().map(|&v| (v - max).exp()).collect();
    let sum: f32 = exp.iter().sum();
    exp.into_iter().map(|v| v / sum).collect()
}

/// Pick the (start, end) pair maximizing `p_start * p_end` with both ends on
/// context tokens, `start <= end` and at most `max_answer_len` tokens.
///
/// The probabilities are normalized over the context tokens plus the
/// classifier token at `cls_index`, which holds the "no answer" mass. A window
/// where the model prefers no answer therefore yields a low score.
/// `None` when the window holds no context token.
pub fn best_span(
    start_logits: &[f32],
    end_logits: &[f32],
    context_mask: &[bool],
    cls_index: Option<usize>,
    max_answer_len: usize,
) -> Option<SpanCandidate> {
    let len = start_logits.len().min(end_logits.len()).min(context_mask.len());
    let mask = &context_mask[..len];
    if !mask.iter().any(|&ok| ok) || max_answer_len == 0 {
        return None;
    }

    let normalized: Vec<bool> = (0..len).map(|i| mask[i] || cls_index == Some(i)).collect();
    let p_start = masked_softmax(&start_logits[..len], &normalized);
    let p_end = masked_softmax(&end_logits[..len], &normalized);

    let mut best: Option<SpanCandidate> = None;
    for start in (0..len).filter(|&i| mask[i]) {
        let last = (start + max_answer_len).min(len);
        for end in (start..last).filter(|&i| mask[i]) {
            let score = p_start[start] * p_end[end];
            if best.map_or(true, |b| score > b.score) {
                best = Some(SpanCandidate { start_token: start, end_token: end, score });
            }
        }
    }
    best
}
