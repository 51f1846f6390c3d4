use completions_api::{
    ChatCompletionRequest, ChatMessage, CompletionRequest, CompletionsResponse,
};
use serde_json::{json, Value};

#[test]
fn chat_request_serializes_expected_fields() {
    let request = ChatCompletionRequest {
        model: "chat-model".to_string(),
        messages: vec![
            ChatMessage::user("prompt"),
            ChatMessage::assistant("prefill"),
        ],
        logprobs: true,
        top_logprobs: 5,
        max_tokens: 12,
        temperature: 0.0,
        extra: serde_json::Map::new(),
    };

    let body = serde_json::to_value(&request).expect("serialize chat request");
    assert_eq!(body["model"], "chat-model");
    assert_eq!(body["logprobs"], Value::Bool(true));
    assert_eq!(body["top_logprobs"], json!(5));
    assert_eq!(body["max_tokens"], json!(12));
    assert_eq!(body["temperature"], json!(0.0));
    assert_eq!(body["messages"][0]["role"], "user");
    assert_eq!(body["messages"][1]["role"], "assistant");
    assert_eq!(body["messages"][1]["content"], "prefill");
}

#[test]
fn vendor_flags_flatten_into_message_and_body() {
    let mut request = ChatCompletionRequest {
        model: "chat-model".to_string(),
        messages: vec![ChatMessage::assistant("tail").with_flag("prefix", true)],
        logprobs: true,
        top_logprobs: 3,
        max_tokens: 4,
        temperature: 0.0,
        extra: serde_json::Map::new(),
    };
    request.extra.insert("continue_final_message".to_string(), json!(true));
    request
        .extra
        .insert("add_generation_prompt".to_string(), json!(false));

    let body = serde_json::to_value(&request).expect("serialize chat request");
    assert_eq!(body["messages"][0]["prefix"], Value::Bool(true));
    assert_eq!(body["continue_final_message"], Value::Bool(true));
    assert_eq!(body["add_generation_prompt"], Value::Bool(false));
}

#[test]
fn flags_are_omitted_when_empty() {
    let request = ChatCompletionRequest {
        model: "chat-model".to_string(),
        messages: vec![ChatMessage::assistant("tail")],
        logprobs: true,
        top_logprobs: 3,
        max_tokens: 4,
        temperature: 0.0,
        extra: serde_json::Map::new(),
    };

    let body = serde_json::to_value(&request).expect("serialize chat request");
    assert!(body.get("continue_final_message").is_none());
    let message = body["messages"][0].as_object().expect("message object");
    assert_eq!(message.len(), 2);
}

#[test]
fn legacy_request_uses_numeric_logprobs() {
    let request = CompletionRequest {
        model: "base-model".to_string(),
        prompt: "Once upon".to_string(),
        logprobs: 4,
        max_tokens: 8,
        temperature: 0.0,
    };

    let body = serde_json::to_value(&request).expect("serialize completion request");
    assert_eq!(body["prompt"], "Once upon");
    assert_eq!(body["logprobs"], json!(4));
}

#[test]
fn chat_response_deserializes_content_logprobs() {
    let body = json!({
        "id": "resp-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": " time" },
            "finish_reason": "stop",
            "logprobs": {
                "content": [{
                    "token": " time",
                    "logprob": -0.25,
                    "top_logprobs": [
                        { "token": " time", "logprob": -0.25 },
                        { "token": " day", "logprob": -2.5 }
                    ]
                }]
            }
        }]
    });

    let response: CompletionsResponse =
        serde_json::from_value(body).expect("parse chat response");
    let choice = &response.choices[0];
    assert_eq!(choice.finish_reason.as_deref(), Some("stop"));
    let raw = choice.logprobs.as_ref().expect("logprobs present");
    let content = raw.content.as_ref().expect("chat content");
    assert_eq!(content[0].token, " time");
    assert_eq!(content[0].top_logprobs.len(), 2);
    assert!(raw.tokens.is_none());
}

#[test]
fn legacy_response_deserializes_parallel_arrays() {
    let body = json!({
        "choices": [{
            "text": "a",
            "finish_reason": "length",
            "logprobs": {
                "tokens": ["a"],
                "top_logprobs": [{ "a": -0.1, "b": -2.3 }],
                "token_logprobs": [-0.1]
            }
        }]
    });

    let response: CompletionsResponse =
        serde_json::from_value(body).expect("parse legacy response");
    let raw = response.choices[0].logprobs.as_ref().expect("logprobs present");
    assert!(raw.content.is_none());
    assert_eq!(raw.tokens.as_deref(), Some(["a".to_string()].as_slice()));
    let alternatives = &raw.top_logprobs.as_ref().expect("top logprobs")[0];
    assert_eq!(alternatives["a"], -0.1);
    assert_eq!(alternatives["b"], -2.3);
}

#[test]
fn response_without_choices_parses_to_an_empty_list() {
    let response: CompletionsResponse =
        serde_json::from_value(json!({})).expect("parse empty response");
    assert!(response.choices.is_empty());
}
