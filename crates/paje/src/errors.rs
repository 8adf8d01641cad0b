use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by a system while handling a tool call.
///
/// These never reach the end user directly, they are folded into a tool result
/// for the model to reason about.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum AgentError {
    #[error("Ferramenta '{0}' não encontrada")]
    ToolNotFound(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Tool execution failed: {0}")]
    ExecutionError(String),
}

pub type AgentResult<T> = Result<T, AgentError>;
