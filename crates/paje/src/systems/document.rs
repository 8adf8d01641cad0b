use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::System;
use crate::document::DocumentStore;
use crate::errors::{AgentError, AgentResult};
use crate::models::tool::{Tool, ToolCall};

pub const SEARCH_TOOL_NAME: &str = "search_pdf";

/// Exposes keyword search over the loaded document as a tool
pub struct DocumentSystem {
    store: Arc<DocumentStore>,
    tools: Vec<Tool>,
}

impl DocumentSystem {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        let search_tool = Tool::new(
            SEARCH_TOOL_NAME,
            "Busca informações específicas no documento PDF carregado. Use esta ferramenta \
            quando precisar encontrar informações sobre um tópico específico no documento.",
            json!({
                "type": "object",
                "required": ["query"],
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "A consulta ou pergunta para buscar no PDF. Seja específico sobre o que você está procurando."
                    }
                }
            }),
        );

        Self {
            store,
            tools: vec![search_tool],
        }
    }

    async fn search(&self, arguments: Value) -> AgentResult<Value> {
        let query = arguments
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                AgentError::InvalidParameters("The string argument 'query' is required".into())
            })?;

        if !self.store.is_loaded() {
            tracing::debug!("first search, loading the document");
        }
        let result = self.store.search(query).await.map_err(|e| {
            AgentError::ExecutionError(format!("Failed to search the document: {}", e))
        })?;

        Ok(json!({ "relevantText": result.relevant_text }))
    }
}

#[async_trait]
impl System for DocumentSystem {
    fn name(&self) -> &str {
        "DocumentSystem"
    }

    fn description(&self) -> &str {
        "Keyword search over the reference document of traditional herbal knowledge"
    }

    fn instructions(&self) -> &str {
        "Consulte sempre o documento com a ferramenta search_pdf antes de responder \
        sobre chás, ervas e preparos."
    }

    fn tools(&self) -> &[Tool] {
        &self.tools
    }

    async fn call(&self, tool_call: ToolCall) -> AgentResult<Value> {
        match tool_call.name.as_str() {
            SEARCH_TOOL_NAME => self.search(tool_call.arguments).await,
            _ => Err(AgentError::ToolNotFound(tool_call.name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system(text: &str) -> DocumentSystem {
        DocumentSystem::new(Arc::new(DocumentStore::from_text(text)))
    }

    #[test]
    fn test_advertises_search_tool() {
        let system = system("");
        assert_eq!(system.tools().len(), 1);
        assert_eq!(system.tools()[0].name, SEARCH_TOOL_NAME);
        assert_eq!(system.tools()[0].input_schema["required"], json!(["query"]));
    }

    #[tokio::test]
    async fn test_search_returns_relevant_text() {
        let system = system("Introdução.\n\nA camomila é usada para dores de estômago.");
        let output = system
            .call(ToolCall::new(SEARCH_TOOL_NAME, json!({"query": "camomila"})))
            .await
            .unwrap();
        assert_eq!(
            output["relevantText"],
            "A camomila é usada para dores de estômago."
        );
    }

    #[tokio::test]
    async fn test_search_requires_query() {
        let system = system("texto");
        let error = system
            .call(ToolCall::new(SEARCH_TOOL_NAME, json!({"q": 1})))
            .await
            .unwrap_err();
        assert!(matches!(error, AgentError::InvalidParameters(_)));
    }

    #[tokio::test]
    async fn test_unreadable_document_is_execution_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path().join("sumiu.pdf"));
        let system = DocumentSystem::new(Arc::new(store));

        let error = system
            .call(ToolCall::new(SEARCH_TOOL_NAME, json!({"query": "boldo"})))
            .await
            .unwrap_err();
        assert!(matches!(error, AgentError::ExecutionError(_)));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let error = system("texto")
            .call(ToolCall::new("bash", json!({})))
            .await
            .unwrap_err();
        assert_eq!(error, AgentError::ToolNotFound("bash".to_string()));
    }
}
