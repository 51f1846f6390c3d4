//! Application of one query result to the forest.

use crate::adapter::{PositionLogprobs, QueriedLogprobs};
use crate::selector::cover_prefix_len;
use crate::tree::Token;

/// Where a query result attaches: the root list (first query of a build) or
/// an existing node's children.
pub(crate) enum Attach<'a> {
    Roots(&'a mut Vec<Token>),
    Node(&'a mut Token),
}

/// Attach one normalized query result.
///
/// Finish-only results terminate the attachment point: an existing node gets
/// `branch_finished` set with no children, the root list gets a synthetic
/// marker leaf. Logprob results are walked position by position, appending
/// the selected alternatives as children and descending into the chosen
/// token's node. When the chosen token is not among the kept alternatives
/// the walk stops early and silently, leaving the alternatives as leaves;
/// this is accepted best-effort degradation for vendors whose top-K can
/// exclude the sampled token.
pub(crate) fn apply_query_result(
    attach: Attach<'_>,
    result: QueriedLogprobs,
    max_width: usize,
    cover_prob: f64,
) {
    match result {
        QueriedLogprobs::Finish(reason) => match attach {
            Attach::Node(node) => node.branch_finished = Some(reason),
            Attach::Roots(roots) => roots.push(Token::finish_marker(reason)),
        },
        QueriedLogprobs::Logprobs(positions) => {
            let mut children = match attach {
                Attach::Roots(roots) => roots,
                Attach::Node(node) => &mut node.children,
            };
            for position in positions {
                match append_position(children, &position, max_width, cover_prob) {
                    Some(chosen) => {
                        let slot = children;
                        slot[chosen].branch_finished = position.finish_reason;
                        children = &mut slot[chosen].children;
                    }
                    None => break,
                }
            }
        }
    }
}

/// Append one position's alternatives, capped by the mass selector and the
/// max-width knob (both bounds respected). Returns the index of the chosen
/// token's node, or `None` when the chosen token was cut or absent.
fn append_position(
    children: &mut Vec<Token>,
    position: &PositionLogprobs,
    max_width: usize,
    cover_prob: f64,
) -> Option<usize> {
    let keep = cover_prefix_len(&position.top_logprobs, cover_prob).min(max_width);
    let mut chosen = None;

    for candidate in position.top_logprobs.iter().take(keep) {
        if chosen.is_none() && candidate.token == position.chosen_token {
            chosen = Some(children.len());
        }
        children.push(Token::from_logprob(&candidate.token, candidate.logprob));
    }

    chosen
}
