//! Frontier selection over the token forest.
//!
//! Paths are addressed by child indices: the first element indexes `roots`,
//! each following element indexes the previous node's `children`. Index paths
//! stay valid across the mutation that follows selection because mutation is
//! append-only.

use uuid::Uuid;

use crate::tree::Token;

/// Lazily enumerates root-to-leaf index paths in pre-order, left to right.
///
/// The iterator holds an explicit stack instead of recursing, so it is finite
/// and restartable over a forest that stays immutable during one traversal.
pub(crate) struct LeafPaths<'a> {
    roots: &'a [Token],
    stack: Vec<Vec<usize>>,
}

impl<'a> LeafPaths<'a> {
    pub(crate) fn new(roots: &'a [Token]) -> Self {
        let stack = (0..roots.len()).rev().map(|index| vec![index]).collect();
        Self { roots, stack }
    }
}

impl<'a> Iterator for LeafPaths<'a> {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(path) = self.stack.pop() {
            let Some(node) = node_at(self.roots, &path) else {
                continue;
            };
            if node.children.is_empty() {
                return Some(path);
            }
            for index in (0..node.children.len()).rev() {
                let mut child_path = path.clone();
                child_path.push(index);
                self.stack.push(child_path);
            }
        }
        None
    }
}

/// Resolve an index path to a node reference.
pub(crate) fn node_at<'a>(roots: &'a [Token], path: &[usize]) -> Option<&'a Token> {
    let (&first, rest) = path.split_first()?;
    let mut node = roots.get(first)?;
    for &index in rest {
        node = node.children.get(index)?;
    }
    Some(node)
}

/// Resolve an index path to a mutable node reference.
pub(crate) fn node_at_mut<'a>(roots: &'a mut [Token], path: &[usize]) -> Option<&'a mut Token> {
    let (&first, rest) = path.split_first()?;
    let mut node = roots.get_mut(first)?;
    for &index in rest {
        node = node.children.get_mut(index)?;
    }
    Some(node)
}

/// Token texts along an index path, in order.
pub(crate) fn texts_along(roots: &[Token], path: &[usize]) -> Vec<String> {
    let mut texts = Vec::with_capacity(path.len());
    let mut nodes = roots;
    for &index in path {
        let Some(node) = nodes.get(index) else { break };
        texts.push(node.text.clone());
        nodes = &node.children;
    }
    texts
}

/// First continuable root-to-leaf path in pre-order, or `None` when the
/// forest has no open frontier.
///
/// A path is continuable when its leaf is unexpanded, not branch-finished,
/// and strictly under the depth budget. This defines the deterministic
/// expansion order that progress reporting and interruption rely on.
pub(crate) fn next_continuable_path(roots: &[Token], max_depth: usize) -> Option<Vec<usize>> {
    for path in LeafPaths::new(roots) {
        if path.len() >= max_depth {
            continue;
        }
        let Some(node) = node_at(roots, &path) else {
            continue;
        };
        if !node.is_finished() {
            return Some(path);
        }
    }
    None
}

/// Index path from some root down to the node with `id`, pre-order search.
pub(crate) fn index_path_to_node(roots: &[Token], id: Uuid) -> Option<Vec<usize>> {
    let mut stack: Vec<Vec<usize>> = (0..roots.len()).rev().map(|index| vec![index]).collect();
    while let Some(path) = stack.pop() {
        let Some(node) = node_at(roots, &path) else {
            continue;
        };
        if node.id == id {
            return Some(path);
        }
        for index in (0..node.children.len()).rev() {
            let mut child_path = path.clone();
            child_path.push(index);
            stack.push(child_path);
        }
    }
    None
}

/// Path of nodes from some root down to the node with `id`, or `None` when
/// the id is absent. Lookup only; never mutates.
pub fn path_to_node_with_id(id: Uuid, roots: &[Token]) -> Option<Vec<&Token>> {
    let path = index_path_to_node(roots, id)?;
    let mut nodes = Vec::with_capacity(path.len());
    let mut level = roots;
    for &index in &path {
        let node = level.get(index)?;
        nodes.push(node);
        level = &node.children;
    }
    Some(nodes)
}
