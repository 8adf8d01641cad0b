//! The static document the assistant answers from.
//!
//! The text is read from disk on first use and then kept for the lifetime of the
//! store. Every search reads the same snapshot.
mod loader;
pub mod search;

use std::path::PathBuf;

use tokio::sync::OnceCell;

pub use loader::{load_document, DocumentFormat, LoadError, PDF_SIGNATURE};
pub use search::{select_paragraphs, MatchPass, Selection};

/// Returned in place of an excerpt when the document has nothing usable
pub const NO_RELEVANT_INFORMATION: &str =
    "Nenhuma informação relevante encontrada para a consulta.";

#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalResult<'a> {
    /// The whole cached document
    pub content: &'a str,
    /// Best matching paragraphs, or the no-match sentinel
    pub relevant_text: String,
}

pub struct DocumentStore {
    path: PathBuf,
    text: OnceCell<String>,
}

impl DocumentStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            text: OnceCell::new(),
        }
    }

    /// A store whose text is already in memory, nothing is read from disk
    pub fn from_text<S: Into<String>>(text: S) -> Self {
        Self {
            path: PathBuf::new(),
            text: OnceCell::from(text.into()),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.text.initialized()
    }

    /// Load the document if no load has succeeded yet.
    ///
    /// Concurrent callers wait on a single load. A failed load leaves the store empty
    /// and the next call tries again.
    pub async fn ensure_loaded(&self) -> Result<&str, LoadError> {
        let text = self
            .text
            .get_or_try_init(|| async {
                tracing::info!(path = %self.path.display(), "loading document");
                let text = load_document(&self.path).await?;
                tracing::info!(chars = text.chars().count(), "document loaded");
                Ok::<_, LoadError>(text)
            })
            .await?;
        Ok(text.as_str())
    }

    /// The whole document text
    pub async fn full_text(&self) -> Result<&str, LoadError> {
        self.ensure_loaded().await
    }

    /// Find the paragraphs most relevant to `query`
    pub async fn search(&self, query: &str) -> Result<RetrievalResult<'_>, LoadError> {
        let content = self.ensure_loaded().await?;
        let selection = select_paragraphs(content, query);
        tracing::debug!(
            query,
            pass = ?selection.pass,
            found = selection.paragraphs.len(),
            "document search"
        );

        let relevant_text = selection
            .excerpt()
            .unwrap_or_else(|| NO_RELEVANT_INFORMATION.to_string());
        Ok(RetrievalResult {
            content,
            relevant_text,
        })
    }
}
