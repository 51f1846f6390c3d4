//! Token-probability tree explorer ("logit loom") core.
//!
//! Starting from a prompt and optional prefill, the builder repeatedly asks
//! an OpenAI-compatible backend for the top-K most likely next tokens,
//! attaches every alternative to a trie over token sequences, and re-queries
//! each open frontier path until every branch is finished or the depth budget
//! is spent. An existing tree can be re-entered at any interior node and
//! regrown from there without disturbing sibling subtrees.
//!
//! This crate owns only the tree semantics: the probability-mass selector,
//! the response-shape adapter, the mutator, frontier traversal, and the
//! build/expand orchestration. Transport lives in `completions_api` and is
//! injected through its [`CompletionsClient`](completions_api::CompletionsClient)
//! capability trait. UI rendering and on-disk persistence are external
//! collaborators; only the serialized snapshot shape is defined here.

pub mod adapter;
pub mod builder;
pub mod error;
pub mod schema;
pub mod selector;
pub mod store;
pub mod tree;

mod mutate;
mod query;
mod traverse;

pub use adapter::{adapt_choice, Candidate, PositionLogprobs, QueriedLogprobs};
pub use builder::{build_tree, expand_tree, BuildError, TreeOptions};
pub use error::LoomError;
pub use schema::{ModelKind, ModelSettings, TreeSnapshot};
pub use selector::cover_prefix_len;
pub use store::{LoomState, LoomStore};
pub use traverse::path_to_node_with_id;
pub use tree::{FinishReason, Token};
