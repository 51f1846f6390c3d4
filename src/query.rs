//! Single query-step request construction.
//!
//! Getting the prefill encoding wrong silently corrupts the whole tree, so
//! the backend-compatibility policy lives here and nowhere else: chat models
//! get a message list with the prefix encoded per the provider capability
//! descriptor, base models get one concatenated prompt string.

use completions_api::{
    ChatCompletionRequest, ChatMessage, CompletionRequest, CompletionsClient, LogprobSupport,
    PrefillEncoding,
};
use serde_json::Map;

use crate::adapter::{adapt_choice, QueriedLogprobs};
use crate::builder::TreeOptions;
use crate::error::LoomError;
use crate::schema::ModelKind;

/// Issue exactly one request continuing `prefix` and adapt the response.
///
/// `base_prefill` is the assistant-side text established before this batch
/// (the configured prefill, plus ancestor tokens when expanding a subtree).
/// The token budget is the depth budget minus the tokens already consumed by
/// the prefix within this batch. Temperature is zero for greedy decoding
/// unless the provider descriptor demands an override; the value disables
/// extra logit scaling, it is not an exploration knob.
///
/// No transport cancellation is passed: interruption of a build is
/// cooperative and in-flight requests are always awaited to completion.
/// Hard aborts are the hosting application's concern, on its own client.
pub(crate) async fn query_step(
    client: &dyn CompletionsClient,
    options: &TreeOptions,
    prefix: &[String],
    base_prefill: &str,
    depth_budget: usize,
) -> Result<QueriedLogprobs, LoomError> {
    let remaining = depth_budget.saturating_sub(prefix.len()).max(1) as u32;
    if options.capabilities.logprobs == LogprobSupport::Unsupported {
        log::warn!("provider reports no logprob support; requesting logprobs regardless");
    }
    let temperature = options.capabilities.needs_temperature.unwrap_or(0.0);
    let assistant_text = format!("{base_prefill}{}", prefix.concat());

    let response = match options.kind {
        ModelKind::Chat => {
            let mut messages = Vec::new();
            if let Some(system_prompt) = options.system_prompt.as_deref() {
                messages.push(ChatMessage::system(system_prompt));
            }
            messages.push(ChatMessage::user(&options.prompt));

            let mut extra = Map::new();
            if !assistant_text.is_empty() {
                let mut assistant = ChatMessage::assistant(assistant_text);
                match options.capabilities.prefill {
                    PrefillEncoding::MessageFlag { key } => {
                        assistant = assistant.with_flag(key, true);
                    }
                    PrefillEncoding::BodyFlags { flags } => {
                        for (key, value) in flags {
                            extra.insert((*key).to_string(), (*value).into());
                        }
                    }
                    PrefillEncoding::AssistantTail | PrefillEncoding::Unknown => {}
                    PrefillEncoding::Unsupported => {
                        log::warn!(
                            "provider does not support chat prefill; sending a plain assistant tail"
                        );
                    }
                }
                messages.push(assistant);
            }

            let request = ChatCompletionRequest {
                model: options.model.clone(),
                messages,
                logprobs: true,
                top_logprobs: options.max_width as u32,
                max_tokens: remaining,
                temperature,
                extra,
            };
            client.chat_complete(&request, None).await?
        }
        ModelKind::Base => {
            let request = CompletionRequest {
                model: options.model.clone(),
                prompt: format!("{}{assistant_text}", options.prompt),
                logprobs: options.max_width as u32,
                max_tokens: remaining,
                temperature,
            };
            client.complete(&request, None).await?
        }
    };

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or(LoomError::MissingChoice)?;
    adapt_choice(&choice)
}
