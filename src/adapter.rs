//! Normalization of backend response choices into one internal shape.
//!
//! Two logprob encodings exist in the wild: chat-style (per-position objects
//! with a `top_logprobs` array) and the legacy completion-style (parallel
//! `tokens` and token-to-logprob dictionary arrays). Classification happens
//! exactly once, into [`LogprobsShape`]; everything downstream sees only the
//! normalized [`QueriedLogprobs`].

use std::cmp::Ordering;
use std::collections::BTreeMap;

use completions_api::{ChatTokenLogprob, Choice, RawLogprobs};

use crate::error::LoomError;
use crate::tree::FinishReason;

/// One alternative token at a position.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub token: String,
    pub logprob: f64,
}

/// One normalized position: the chosen token plus its alternatives, sorted
/// by descending logprob.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionLogprobs {
    pub chosen_token: String,
    /// Terminal signal for this exact position. Only ever set on the last
    /// position of a result.
    pub finish_reason: Option<FinishReason>,
    pub top_logprobs: Vec<Candidate>,
}

/// Normalized result of one query step.
#[derive(Debug, Clone, PartialEq)]
pub enum QueriedLogprobs {
    Logprobs(Vec<PositionLogprobs>),
    /// The backend terminated without producing any token alternatives.
    Finish(FinishReason),
}

/// The two legitimate logprob encodings, as named variants.
enum LogprobsShape<'a> {
    Chat(&'a [ChatTokenLogprob]),
    Completion {
        tokens: &'a [String],
        top_logprobs: &'a [BTreeMap<String, f64>],
    },
}

/// The single shape-classification boundary: chat-style is detected by the
/// presence of the `content` container, legacy by the parallel arrays.
fn classify_logprobs(raw: &RawLogprobs) -> Option<LogprobsShape<'_>> {
    if let Some(content) = raw.content.as_deref() {
        return Some(LogprobsShape::Chat(content));
    }
    match (raw.tokens.as_deref(), raw.top_logprobs.as_deref()) {
        (Some(tokens), Some(top_logprobs)) => Some(LogprobsShape::Completion {
            tokens,
            top_logprobs,
        }),
        _ => None,
    }
}

/// Adapt one response choice into the normalized internal shape.
///
/// A missing-logprobs response with a terminal finish reason becomes a
/// branch-finished signal. `finish_reason: "length"` without logprobs is a
/// known backend quirk that can appear even under correct token-budget
/// accounting; it is coerced to a benign stop with a diagnostic, never an
/// error. Missing logprobs with no finish reason at all is a protocol
/// violation.
pub fn adapt_choice(choice: &Choice) -> Result<QueriedLogprobs, LoomError> {
    let shape = choice.logprobs.as_ref().and_then(classify_logprobs);
    let Some(shape) = shape else {
        return finish_without_logprobs(choice.finish_reason.as_deref());
    };

    // With logprobs present, the choice-level finish reason applies to the
    // last generated position. "length" is truncation, not termination.
    let terminal = choice
        .finish_reason
        .as_deref()
        .and_then(FinishReason::parse);

    let positions = match shape {
        LogprobsShape::Chat(content) => content
            .iter()
            .map(|entry| PositionLogprobs {
                chosen_token: entry.token.clone(),
                finish_reason: None,
                top_logprobs: sorted_candidates(
                    entry
                        .top_logprobs
                        .iter()
                        .map(|alt| Candidate {
                            token: alt.token.clone(),
                            logprob: alt.logprob,
                        })
                        .collect(),
                ),
            })
            .collect::<Vec<_>>(),
        LogprobsShape::Completion {
            tokens,
            top_logprobs,
        } => tokens
            .iter()
            .zip(top_logprobs)
            .map(|(token, alternatives)| PositionLogprobs {
                chosen_token: token.clone(),
                finish_reason: None,
                top_logprobs: sorted_candidates(
                    alternatives
                        .iter()
                        .map(|(token, &logprob)| Candidate {
                            token: token.clone(),
                            logprob,
                        })
                        .collect(),
                ),
            })
            .collect::<Vec<_>>(),
    };

    // A present-but-empty container carries no positions; treating it as a
    // valid result would leave the frontier leaf unexpanded and unfinished,
    // so the builder would re-issue the same query forever.
    if positions.is_empty() {
        return finish_without_logprobs(choice.finish_reason.as_deref());
    }

    let mut positions = positions;
    if let (Some(reason), Some(last)) = (terminal, positions.last_mut()) {
        last.finish_reason = Some(reason);
    }

    Ok(QueriedLogprobs::Logprobs(positions))
}

fn finish_without_logprobs(finish_reason: Option<&str>) -> Result<QueriedLogprobs, LoomError> {
    match finish_reason {
        Some("length") => {
            log::warn!(
                "backend reported finish_reason=length without logprobs; treating as stop"
            );
            Ok(QueriedLogprobs::Finish(FinishReason::Stop))
        }
        Some(value) => match FinishReason::parse(value) {
            Some(reason) => Ok(QueriedLogprobs::Finish(reason)),
            None => {
                log::warn!("unrecognized finish_reason {value:?} without logprobs; treating as stop");
                Ok(QueriedLogprobs::Finish(FinishReason::Stop))
            }
        },
        None => Err(LoomError::MissingLogprobs),
    }
}

/// Backend ordering is not guaranteed; re-sort descending, ties stable.
fn sorted_candidates(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.logprob.partial_cmp(&a.logprob).unwrap_or(Ordering::Equal));
    candidates
}
