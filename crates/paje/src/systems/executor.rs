use serde_json::{Map, Value};

use super::System;
use crate::errors::{AgentError, AgentResult};
use crate::models::tool::{Tool, ToolCall};

/// Outcome of one tool execution, handed back to the model as text
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    pub success: bool,
    /// Tool output on success, the error message on failure
    pub payload: Value,
    /// The `query` argument of the call, if it had one
    pub query: Option<String>,
}

impl ToolResult {
    pub fn from_outcome(outcome: AgentResult<Value>, query: Option<String>) -> Self {
        match outcome {
            Ok(payload) => Self {
                success: true,
                payload,
                query,
            },
            Err(e) => Self {
                success: false,
                payload: Value::String(e.to_string()),
                query,
            },
        }
    }

    /// Flatten into the JSON object the model receives.
    ///
    /// Object payloads are merged at the top level, failures land under `error`.
    pub fn to_value(&self) -> Value {
        let mut object = Map::new();
        object.insert("success".to_string(), Value::Bool(self.success));
        match (&self.payload, self.success) {
            (Value::Object(fields), true) => {
                object.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            (payload, true) => {
                object.insert("output".to_string(), payload.clone());
            }
            (payload, false) => {
                object.insert("error".to_string(), payload.clone());
            }
        }
        if let Some(query) = &self.query {
            object.insert("query".to_string(), Value::String(query.clone()));
        }
        Value::Object(object)
    }

    pub fn to_json_string(&self) -> String {
        self.to_value().to_string()
    }
}

/// Registry of systems, routing tool calls by tool name
#[derive(Default)]
pub struct ToolExecutor {
    systems: Vec<Box<dyn System>>,
}

impl ToolExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a system to the registry
    pub fn add_system(&mut self, system: Box<dyn System>) {
        self.systems.push(system);
    }

    pub fn systems(&self) -> impl Iterator<Item = &dyn System> {
        self.systems.iter().map(|system| &**system)
    }

    /// Every tool of every system, advertised to the model
    pub fn tools(&self) -> Vec<Tool> {
        self.systems
            .iter()
            .flat_map(|system| system.tools().iter().cloned())
            .collect()
    }

    fn system_for_tool(&self, tool_name: &str) -> Option<&dyn System> {
        self.systems()
            .find(|system| system.tools().iter().any(|tool| tool.name == tool_name))
    }

    async fn dispatch(&self, tool_call: ToolCall) -> AgentResult<Value> {
        let system = self
            .system_for_tool(&tool_call.name)
            .ok_or_else(|| AgentError::ToolNotFound(tool_call.name.clone()))?;
        system.call(tool_call).await
    }

    /// Run a tool. Failures of any kind come back as an unsuccessful result.
    pub async fn execute(&self, tool_name: &str, arguments: Value) -> ToolResult {
        let query = arguments
            .get("query")
            .and_then(|v| v.as_str())
            .map(String::from);

        let outcome = self
            .dispatch(ToolCall::new(tool_name, arguments))
            .await;
        match &outcome {
            Ok(_) => tracing::info!(tool = tool_name, "tool executed"),
            Err(e) => tracing::warn!(tool = tool_name, error = %e, "tool failed"),
        }

        ToolResult::from_outcome(outcome, query)
    }
}
