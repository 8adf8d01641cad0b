use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::message::Message;
use crate::models::tool::Tool;

/// Token accounting reported with each model response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: Option<u32>,
    #[serde(default)]
    pub output_tokens: Option<u32>,
}

impl Usage {
    /// Input plus output, when both were reported
    pub fn total(&self) -> Option<u32> {
        Some(self.input_tokens? + self.output_tokens?)
    }
}

/// Base trait for LLM providers
#[async_trait]
pub trait Provider: Send + Sync {
    /// Generate the next message, advertising `tools` to the model
    async fn complete(
        &self,
        system: &str,
        messages: &[Message],
        tools: &[Tool],
    ) -> Result<(Message, Usage)>;
}
