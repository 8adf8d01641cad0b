use anyhow::Context;
use paje::document::DocumentStore;
use paje::orchestrator::Orchestrator;
use paje::providers::anthropic::AnthropicProvider;
use paje::providers::configs::AnthropicProviderConfig;
use paje::systems::{DocumentSystem, ToolExecutor};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::configuration::Settings;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// None when no API key is configured; chat requests then fail with 500
    pub orchestrator: Option<Arc<Orchestrator>>,
    pub typing_delay: Duration,
}

impl AppState {
    pub fn new(settings: &Settings, documents: Arc<DocumentStore>) -> anyhow::Result<Self> {
        let orchestrator = match settings.provider.to_config() {
            Some(config) => Some(Arc::new(build_orchestrator(
                config,
                documents,
                settings.document.persona_path.as_deref(),
            )?)),
            None => {
                if let Err(e) = settings.require_api_key() {
                    tracing::warn!(error = %e, "chat is disabled until an API key is configured");
                }
                None
            }
        };

        Ok(Self {
            orchestrator,
            typing_delay: settings.server.typing_delay(),
        })
    }
}

/// Wire the Anthropic provider and the document search tool into an orchestrator
pub fn build_orchestrator(
    config: AnthropicProviderConfig,
    documents: Arc<DocumentStore>,
    persona_path: Option<&Path>,
) -> anyhow::Result<Orchestrator> {
    tracing::info!(model = %config.model, host = %config.host, "configuring Anthropic provider");
    let provider = AnthropicProvider::new(config)?;

    let mut executor = ToolExecutor::new();
    executor.add_system(Box::new(DocumentSystem::new(documents)));

    let orchestrator = match persona_path {
        Some(path) => Orchestrator::with_template_file(Box::new(provider), executor, path)
            .with_context(|| format!("Failed to render persona template {}", path.display()))?,
        None => Orchestrator::new(Box::new(provider), executor)?,
    };
    Ok(orchestrator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn documents() -> Arc<DocumentStore> {
        Arc::new(DocumentStore::from_text("A camomila é usada para dores de estômago."))
    }

    #[test]
    fn test_build_orchestrator_with_bundled_persona() {
        let orchestrator =
            build_orchestrator(AnthropicProviderConfig::new("test-key"), documents(), None)
                .unwrap();

        assert!(orchestrator.system_prompt().contains("search_pdf"));
        assert_eq!(orchestrator.tools().len(), 1);
    }

    #[test]
    fn test_build_orchestrator_with_persona_file() {
        let mut persona = NamedTempFile::new().unwrap();
        write!(persona, "Você é um guia. Use {{{{ search_tool }}}}.").unwrap();

        let orchestrator = build_orchestrator(
            AnthropicProviderConfig::new("test-key"),
            documents(),
            Some(persona.path()),
        )
        .unwrap();

        assert_eq!(orchestrator.system_prompt(), "Você é um guia. Use search_pdf.");
    }

    #[test]
    fn test_missing_persona_file_is_an_error() {
        let result = build_orchestrator(
            AnthropicProviderConfig::new("test-key"),
            documents(),
            Some(Path::new("/nonexistent/persona.md")),
        );
        assert!(result.is_err());
    }
}
