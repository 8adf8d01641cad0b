use std::path::{Path, PathBuf};

use thiserror::Error;

/// Leading bytes of every PDF file
pub const PDF_SIGNATURE: &[u8] = b"%PDF";

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read document {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to extract text from {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    PlainText,
}

impl DocumentFormat {
    /// Sniff the format from the file header, anything without the PDF signature is text
    pub fn detect(bytes: &[u8]) -> Self {
        if bytes.len() > PDF_SIGNATURE.len() && bytes.starts_with(PDF_SIGNATURE) {
            DocumentFormat::Pdf
        } else {
            DocumentFormat::PlainText
        }
    }
}

/// Read the document at `path` and return its text content
pub async fn load_document(path: &Path) -> Result<String, LoadError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let format = DocumentFormat::detect(&bytes);
    tracing::debug!(path = %path.display(), ?format, bytes = bytes.len(), "decoding document");

    let text = match format {
        DocumentFormat::Pdf => {
            let decode_error = |message: String| LoadError::Decode {
                path: path.to_path_buf(),
                message,
            };
            // Text extraction is CPU bound and may take a while on large files
            tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
                .await
                .map_err(|e| decode_error(e.to_string()))?
                .map_err(|e| decode_error(e.to_string()))?
        }
        DocumentFormat::PlainText => String::from_utf8_lossy(&bytes).into_owned(),
    };

    Ok(normalize_line_endings(text))
}

fn normalize_line_endings(text: String) -> String {
    if text.contains('\r') {
        text.replace("\r\n", "\n")
    } else {
        text
    }
}
