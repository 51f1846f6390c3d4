use std::fmt;

use completions_api::ApiError;
use uuid::Uuid;

/// Failures raised by the tree-construction core.
#[derive(Debug)]
pub enum LoomError {
    /// Backend response carried no choice at index 0.
    MissingChoice,
    /// Backend omitted logprobs without a terminal finish reason.
    MissingLogprobs,
    /// `expand_tree` was given an id absent from the forest.
    NodeNotFound(Uuid),
    /// Transport failure, propagated unchanged from the client capability.
    Api(ApiError),
}

impl fmt::Display for LoomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingChoice => write!(f, "backend response has no first choice"),
            Self::MissingLogprobs => {
                write!(f, "backend omitted logprobs without a terminal finish reason")
            }
            Self::NodeNotFound(id) => write!(f, "no node with id {id} in the tree"),
            Self::Api(error) => write!(f, "{error}"),
        }
    }
}

impl std::error::Error for LoomError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Api(error) => Some(error),
            _ => None,
        }
    }
}

impl From<ApiError> for LoomError {
    fn from(error: ApiError) -> Self {
        Self::Api(error)
    }
}
