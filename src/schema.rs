//! Serialized snapshot shape for saved trees.
//!
//! Persistence itself (file IO, browser storage) belongs to the hosting
//! application; this module only pins down the JSON layout so snapshots
//! round-trip between implementations.

use serde::{Deserialize, Serialize};

use crate::tree::Token;

/// How the model is addressed: message roles or a raw prompt string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Chat,
    Base,
}

/// Prompting settings captured alongside a saved tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSettings {
    pub kind: ModelKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefill: Option<String>,
}

/// Round-trippable snapshot of one explored tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeSnapshot {
    pub model_name: String,
    pub model_settings: ModelSettings,
    pub roots: Vec<Token>,
}
