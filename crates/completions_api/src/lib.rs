//! Transport-only client primitives for OpenAI-compatible completions APIs.
//!
//! This crate owns request/response payload shapes, endpoint URL handling,
//! retry policy, and provider capability probing. It intentionally contains
//! no tree-construction logic and no UI coupling; the `logitloom` core
//! consumes it through the [`CompletionsClient`] capability trait.
//!
//! Both the chat (`/chat/completions`) and legacy (`/completions`) endpoints
//! are supported because their logprob encodings differ on the wire; the
//! response envelope keeps the raw, unclassified logprobs container so the
//! consumer performs exactly one shape classification.

pub mod capability;
pub mod client;
pub mod config;
pub mod error;
pub mod payload;
pub mod retry;
pub mod url;

pub use async_trait::async_trait;
pub use capability::{
    classify_models_payload, detect_capabilities, LogprobSupport, ModelEntry, ModelsPayload,
    PrefillEncoding, Provider, ProviderCapabilities,
};
pub use client::{CancellationSignal, CompletionsClient, HttpCompletionsClient};
pub use config::ApiConfig;
pub use error::ApiError;
pub use payload::{
    ChatCompletionRequest, ChatMessage, ChatTokenLogprob, Choice, CompletionRequest,
    CompletionsResponse, RawLogprobs, Role, TopLogprob,
};
pub use url::{chat_completions_url, completions_url, models_url, probe_prefixes};
