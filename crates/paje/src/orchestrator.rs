use std::path::Path;

use serde::Serialize;
use serde_json::json;
use tera::Error as TeraError;
use thiserror::Error;

use crate::models::chat::ChatMessage;
use crate::models::message::{Message, ToolRequest};
use crate::models::tool::Tool;
use crate::prompt_template::{load_prompt, load_prompt_file, SYSTEM_TEMPLATE};
use crate::providers::base::Provider;
use crate::systems::{ToolExecutor, ToolResult, SEARCH_TOOL_NAME};

/// Shown to the user when anything in the reply pipeline fails
pub const APOLOGY: &str = "Desculpe, ocorreu um erro ao processar sua mensagem. Tente novamente.";
/// Shown to the user when the model answered without any text
pub const COULD_NOT_PROCESS: &str = "Desculpe, não consegui processar sua solicitação.";

#[derive(Error, Debug)]
pub enum ReplyError {
    #[error("Provider call failed: {0}")]
    Provider(#[source] anyhow::Error),

    #[error("The model returned no text")]
    EmptyResponse,
}

impl ReplyError {
    /// The text the end user sees for this failure
    pub fn user_message(&self) -> &'static str {
        match self {
            ReplyError::Provider(_) => APOLOGY,
            ReplyError::EmptyResponse => COULD_NOT_PROCESS,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
struct SystemInfo {
    name: String,
    description: String,
    instructions: String,
}

fn prompt_context(executor: &ToolExecutor) -> serde_json::Value {
    let systems: Vec<SystemInfo> = executor
        .systems()
        .map(|system| SystemInfo {
            name: system.name().to_string(),
            description: system.description().to_string(),
            instructions: system.instructions().to_string(),
        })
        .collect();

    json!({
        "systems": systems,
        "search_tool": SEARCH_TOOL_NAME,
    })
}

/// Render the persona template with the registered systems
pub fn render_system_prompt(template: &str, executor: &ToolExecutor) -> Result<String, TeraError> {
    load_prompt(template, &prompt_context(executor))
}

/// Drives one question through the model, running any tools it asks for
pub struct Orchestrator {
    provider: Box<dyn Provider>,
    executor: ToolExecutor,
    system_prompt: String,
}

impl Orchestrator {
    /// Create an orchestrator with the bundled persona prompt
    pub fn new(provider: Box<dyn Provider>, executor: ToolExecutor) -> Result<Self, TeraError> {
        Self::with_template(provider, executor, SYSTEM_TEMPLATE)
    }

    /// Create an orchestrator with a custom persona template
    pub fn with_template(
        provider: Box<dyn Provider>,
        executor: ToolExecutor,
        template: &str,
    ) -> Result<Self, TeraError> {
        let system_prompt = render_system_prompt(template, &executor)?;
        Ok(Self {
            provider,
            executor,
            system_prompt,
        })
    }

    /// Create an orchestrator with the persona template stored at `path`
    pub fn with_template_file(
        provider: Box<dyn Provider>,
        executor: ToolExecutor,
        path: &Path,
    ) -> Result<Self, TeraError> {
        let system_prompt = load_prompt_file(path, &prompt_context(&executor))?;
        Ok(Self {
            provider,
            executor,
            system_prompt,
        })
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn tools(&self) -> Vec<Tool> {
        self.executor.tools()
    }

    fn build_messages(user_message: &str, history: &[ChatMessage]) -> Vec<Message> {
        let mut messages: Vec<Message> = history.iter().map(Message::from).collect();
        messages.push(Message::user().with_text(user_message));
        messages
    }

    // The replayed assistant turn carries only the invocation being answered, so
    // every tool_use it contains has a matching tool_result
    fn follow_up_messages(
        messages: &[Message],
        response: &Message,
        request: &ToolRequest,
        result: &ToolResult,
    ) -> Vec<Message> {
        let mut assistant = Message::assistant();
        for content in &response.content {
            if let Some(text) = content.as_text() {
                assistant = assistant.with_text(text);
            }
        }
        let assistant = assistant.with_tool_request(request.id.clone(), request.tool_call.clone());
        let tool_result =
            Message::user().with_tool_response(request.id.clone(), result.to_json_string());

        let mut follow_up = messages.to_vec();
        follow_up.push(assistant);
        follow_up.push(tool_result);
        follow_up
    }

    /// Answer `user_message` given the prior conversation.
    ///
    /// Each tool invocation in the model's response is executed and answered with
    /// its own follow-up call; the answer is the text of all follow-ups in order.
    pub async fn reply(
        &self,
        user_message: &str,
        history: &[ChatMessage],
    ) -> Result<String, ReplyError> {
        let tools = self.executor.tools();
        let messages = Self::build_messages(user_message, history);

        let (response, usage) = self
            .provider
            .complete(&self.system_prompt, &messages, &tools)
            .await
            .map_err(ReplyError::Provider)?;
        tracing::debug!(
            input_tokens = ?usage.input_tokens,
            output_tokens = ?usage.output_tokens,
            total_tokens = ?usage.total(),
            blocks = response.content.len(),
            "model responded"
        );

        let tool_requests = response.tool_requests();
        let answer = if tool_requests.is_empty() {
            response.text()
        } else {
            let mut answer = String::new();
            for request in tool_requests {
                tracing::info!(tool = %request.tool_call.name, id = %request.id, "executing tool");
                let result = self
                    .executor
                    .execute(&request.tool_call.name, request.tool_call.arguments.clone())
                    .await;

                let follow_up = Self::follow_up_messages(&messages, &response, request, &result);
                let (follow_up_response, _) = self
                    .provider
                    .complete(&self.system_prompt, &follow_up, &tools)
                    .await
                    .map_err(ReplyError::Provider)?;
                answer.push_str(&follow_up_response.text());
            }
            answer
        };

        if answer.is_empty() {
            return Err(ReplyError::EmptyResponse);
        }
        tracing::info!(chars = answer.chars().count(), "reply ready");
        Ok(answer)
    }

    /// Like [`Orchestrator::reply`], with failures replaced by their user-facing text
    pub async fn process(&self, user_message: &str, history: &[ChatMessage]) -> String {
        match self.reply(user_message, history).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::error!(error = %e, "failed to answer message");
                e.user_message().to_string()
            }
        }
    }
}
