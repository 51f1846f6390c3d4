//! Scripted completions client for driving the builder without a network.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use completions_api::{
    async_trait, ApiError, CancellationSignal, ChatCompletionRequest, ChatTokenLogprob, Choice,
    CompletionRequest, CompletionsClient, CompletionsResponse, RawLogprobs, TopLogprob,
};

/// One recorded outbound request.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedRequest {
    Chat(ChatCompletionRequest),
    Completion(CompletionRequest),
}

/// Replays a fixed response script in order. Once the script is exhausted it
/// answers every query with a plain `finish_reason: stop`, so any build
/// terminates.
#[derive(Default)]
pub struct ScriptedClient {
    responses: Mutex<VecDeque<CompletionsResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedClient {
    pub fn new(responses: impl IntoIterator<Item = CompletionsResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn recorded_requests(&self) -> Vec<RecordedRequest> {
        lock_unpoisoned(&self.requests).clone()
    }

    pub fn request_count(&self) -> usize {
        lock_unpoisoned(&self.requests).len()
    }

    fn next_response(&self) -> CompletionsResponse {
        lock_unpoisoned(&self.responses)
            .pop_front()
            .unwrap_or_else(|| finish_response("stop"))
    }
}

#[async_trait]
impl CompletionsClient for ScriptedClient {
    async fn chat_complete(
        &self,
        request: &ChatCompletionRequest,
        _cancellation: Option<&CancellationSignal>,
    ) -> Result<CompletionsResponse, ApiError> {
        lock_unpoisoned(&self.requests).push(RecordedRequest::Chat(request.clone()));
        Ok(self.next_response())
    }

    async fn complete(
        &self,
        request: &CompletionRequest,
        _cancellation: Option<&CancellationSignal>,
    ) -> Result<CompletionsResponse, ApiError> {
        lock_unpoisoned(&self.requests).push(RecordedRequest::Completion(request.clone()));
        Ok(self.next_response())
    }
}

/// Chat-style response: per-position `(chosen, alternatives)` pairs.
pub fn chat_response(
    positions: &[(&str, &[(&str, f64)])],
    finish_reason: Option<&str>,
) -> CompletionsResponse {
    CompletionsResponse {
        choices: vec![Choice {
            finish_reason: finish_reason.map(str::to_string),
            logprobs: Some(RawLogprobs {
                content: Some(
                    positions
                        .iter()
                        .map(|(token, alternatives)| ChatTokenLogprob {
                            token: token.to_string(),
                            logprob: alternatives
                                .iter()
                                .find(|(alt, _)| alt == token)
                                .map(|(_, logprob)| *logprob)
                                .unwrap_or(0.0),
                            top_logprobs: alternatives
                                .iter()
                                .map(|(alt, logprob)| TopLogprob {
                                    token: alt.to_string(),
                                    logprob: *logprob,
                                })
                                .collect(),
                        })
                        .collect(),
                ),
                tokens: None,
                top_logprobs: None,
            }),
        }],
    }
}

/// Legacy-style response with parallel token and dictionary arrays.
pub fn completion_response(
    tokens: &[&str],
    alternatives: &[&[(&str, f64)]],
    finish_reason: Option<&str>,
) -> CompletionsResponse {
    CompletionsResponse {
        choices: vec![Choice {
            finish_reason: finish_reason.map(str::to_string),
            logprobs: Some(RawLogprobs {
                content: None,
                tokens: Some(tokens.iter().map(|token| token.to_string()).collect()),
                top_logprobs: Some(
                    alternatives
                        .iter()
                        .map(|position| {
                            position
                                .iter()
                                .map(|(token, logprob)| (token.to_string(), *logprob))
                                .collect()
                        })
                        .collect(),
                ),
            }),
        }],
    }
}

/// Terminal response with no logprobs at all.
pub fn finish_response(finish_reason: &str) -> CompletionsResponse {
    CompletionsResponse {
        choices: vec![Choice {
            finish_reason: Some(finish_reason.to_string()),
            logprobs: None,
        }],
    }
}

/// Response with no choices, a protocol violation.
pub fn empty_response() -> CompletionsResponse {
    CompletionsResponse { choices: Vec::new() }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
