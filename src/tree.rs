use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Why a branch stopped generating. `length` is deliberately absent: budget
/// truncation is not a terminal signal and never finishes a branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    ContentFilter,
    ToolCalls,
    FunctionCall,
}

impl FinishReason {
    pub fn parse(value: &str) -> Option<Self> {
        Some(match value {
            "stop" => Self::Stop,
            "content_filter" => Self::ContentFilter,
            "tool_calls" => Self::ToolCalls,
            "function_call" => Self::FunctionCall,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::ContentFilter => "content_filter",
            Self::ToolCalls => "tool_calls",
            Self::FunctionCall => "function_call",
        }
    }
}

/// One candidate token in the continuation forest.
///
/// Nodes are created by the mutator and never mutated afterwards except to
/// append children and to flip `branch_finished` from `None` to a terminal
/// value. `children` is ordered by non-increasing probability, matching the
/// backend's reported ordering after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    /// Process-unique identifier, assigned at creation, never reused.
    pub id: Uuid,
    /// Literal token text as returned by the backend. May be a partial or
    /// invalid UTF-8 fragment rendered lossily.
    pub text: String,
    /// Natural-log probability of this token at this position.
    pub logprob: f64,
    /// `exp(logprob)`, cached for display and mass summation.
    pub prob: f64,
    pub branch_finished: Option<FinishReason>,
    #[serde(default)]
    pub children: Vec<Token>,
}

impl Token {
    /// Create a node for a backend-reported candidate.
    pub fn from_logprob(text: impl Into<String>, logprob: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            logprob,
            prob: logprob.exp(),
            branch_finished: None,
            children: Vec::new(),
        }
    }

    /// Create a synthetic leaf marking that generation terminated before
    /// producing any alternatives at this attachment point.
    pub fn finish_marker(reason: FinishReason) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: format!("<{}>", reason.as_str()),
            logprob: 0.0,
            prob: 1.0,
            branch_finished: Some(reason),
            children: Vec::new(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.branch_finished.is_some()
    }
}
