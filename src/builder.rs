//! Build/expand orchestration: the query → mutate → traverse loop.

use std::fmt;
use std::sync::atomic::Ordering;

use completions_api::{CancellationSignal, CompletionsClient, ProviderCapabilities};
use uuid::Uuid;

use crate::error::LoomError;
use crate::mutate::{apply_query_result, Attach};
use crate::query::query_step;
use crate::schema::ModelKind;
use crate::traverse::{index_path_to_node, next_continuable_path, node_at, node_at_mut, texts_along};
use crate::tree::Token;

/// Options for one build or expand run.
#[derive(Debug, Clone)]
pub struct TreeOptions {
    pub model: String,
    pub kind: ModelKind,
    pub system_prompt: Option<String>,
    pub prompt: String,
    pub prefill: String,
    /// Maximum root-to-leaf path length, in tokens.
    pub depth: usize,
    /// Maximum alternatives requested and attached per position.
    pub max_width: usize,
    /// Target cumulative probability mass per position, in `[0, 1]`.
    pub cover_prob: f64,
    pub capabilities: ProviderCapabilities,
}

/// A failed build or expand call, carrying the partially built forest so no
/// completed work is lost. Mutation commits only between queries, so the
/// carried forest is never torn.
#[derive(Debug)]
pub struct BuildError {
    pub error: LoomError,
    pub roots: Vec<Token>,
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tree build failed: {}", self.error)
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Progress callback. Receives an independent deep copy of the whole forest
/// after every mutation; returning `true` requests cooperative interruption.
pub type ProgressFn<'a> = dyn FnMut(Vec<Token>) -> bool + 'a;

/// Grow a fresh forest from the configured prompt and prefill.
///
/// Exactly one request is in flight at a time; every query is fully awaited
/// before mutation, and the next frontier is re-selected over the whole
/// forest after each mutation. Interruption is cooperative: it is honoured
/// after a mutation commits, never mid-mutation, and returns the current
/// forest as a successful result.
pub async fn build_tree(
    client: &dyn CompletionsClient,
    options: &TreeOptions,
    interrupt: Option<&CancellationSignal>,
    progress: &mut ProgressFn<'_>,
) -> Result<Vec<Token>, BuildError> {
    let mut roots: Vec<Token> = Vec::new();

    let result = query_step(client, options, &[], &options.prefill, options.depth).await;
    let result = match result {
        Ok(result) => result,
        Err(error) => return Err(BuildError { error, roots }),
    };
    apply_query_result(
        Attach::Roots(&mut roots),
        result,
        options.max_width,
        options.cover_prob,
    );
    if progress(roots.clone()) || is_interrupted(interrupt) {
        return Ok(roots);
    }

    loop {
        let Some(path) = next_continuable_path(&roots, options.depth) else {
            break;
        };
        let prefix = texts_along(&roots, &path);

        let result = query_step(client, options, &prefix, &options.prefill, options.depth).await;
        let result = match result {
            Ok(result) => result,
            Err(error) => return Err(BuildError { error, roots }),
        };

        let Some(node) = node_at_mut(&mut roots, &path) else {
            break;
        };
        apply_query_result(
            Attach::Node(node),
            result,
            options.max_width,
            options.cover_prob,
        );
        if progress(roots.clone()) || is_interrupted(interrupt) {
            return Ok(roots);
        }
    }

    Ok(roots)
}

/// Re-enter an existing forest and regrow the subtree under `node_id`.
///
/// The input forest is deep-copied before anything happens; the caller's
/// value is never mutated. The target node's children are reset up front
/// (explicit invalidate-and-regrow), queries carry every ancestor token as
/// prefill so the backend sees the full path context, and frontier selection
/// is restricted to the target node's subtree. Sibling subtrees are left
/// byte-for-byte untouched.
pub async fn expand_tree(
    client: &dyn CompletionsClient,
    options: &TreeOptions,
    existing_roots: &[Token],
    node_id: Uuid,
    interrupt: Option<&CancellationSignal>,
    progress: &mut ProgressFn<'_>,
) -> Result<Vec<Token>, BuildError> {
    let mut roots = existing_roots.to_vec();

    let Some(node_path) = index_path_to_node(&roots, node_id) else {
        return Err(BuildError {
            error: LoomError::NodeNotFound(node_id),
            roots,
        });
    };

    // Ancestor text above the target node; the node itself is the first
    // prefix token of every query in this run.
    let mut ancestor_prefill = options.prefill.clone();
    for text in texts_along(&roots, &node_path[..node_path.len() - 1]) {
        ancestor_prefill.push_str(&text);
    }

    // The target node occupies one slot of every path in its subtree, so the
    // effective budget grows by one to keep the configured depth available
    // below it.
    let depth_budget = options.depth + 1;

    if let Some(node) = node_at_mut(&mut roots, &node_path) {
        node.children.clear();
    }

    loop {
        let frontier = {
            let Some(node) = node_at(&roots, &node_path) else {
                break;
            };
            let subtree = std::slice::from_ref(node);
            match next_continuable_path(subtree, depth_budget) {
                Some(sub_path) => {
                    let prefix = texts_along(subtree, &sub_path);
                    Some((sub_path, prefix))
                }
                None => None,
            }
        };
        let Some((sub_path, prefix)) = frontier else {
            break;
        };

        let result =
            query_step(client, options, &prefix, &ancestor_prefill, depth_budget).await;
        let result = match result {
            Ok(result) => result,
            Err(error) => return Err(BuildError { error, roots }),
        };

        let Some(node) = node_at_mut(&mut roots, &node_path) else {
            break;
        };
        let Some(target) = node_at_mut(std::slice::from_mut(node), &sub_path) else {
            break;
        };
        apply_query_result(
            Attach::Node(target),
            result,
            options.max_width,
            options.cover_prob,
        );
        if progress(roots.clone()) || is_interrupted(interrupt) {
            return Ok(roots);
        }
    }

    Ok(roots)
}

fn is_interrupted(interrupt: Option<&CancellationSignal>) -> bool {
    interrupt.is_some_and(|token| token.load(Ordering::Acquire))
}
