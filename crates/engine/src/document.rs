//! Where document content comes from.

use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use signflow_types::Document;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DocumentSourceError {
    #[error("document '{document_id}' not found")]
    NotFound { document_id: String },

    #[error("invalid document id '{document_id}'")]
    InvalidId { document_id: String },

    #[error("could not read document {path}: {source}")]
    Io { path: String, source: std::io::Error },
}

impl DocumentSourceError {
    pub fn not_found(document_id: impl Into<String>) -> Self {
        Self::NotFound {
            document_id: document_id.into(),
        }
    }
}

/// Resolves a host document id to its base64 content.
pub trait DocumentSource: Send + Sync {
    fn fetch_base64(&self, document_id: &str) -> Result<Document, DocumentSourceError>;
}

/// Reads `<root>/<document_id>` from disk.
#[derive(Debug, Clone)]
pub struct DirectoryDocumentSource {
    root: PathBuf,
}

impl DirectoryDocumentSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, document_id: &str) -> Result<PathBuf, DocumentSourceError> {
        let relative = Path::new(document_id);
        let mut components = relative.components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.root.join(relative)),
            _ => Err(DocumentSourceError::InvalidId {
                document_id: document_id.to_string(),
            }),
        }
    }
}

impl DocumentSource for DirectoryDocumentSource {
    fn fetch_base64(&self, document_id: &str) -> Result<Document, DocumentSourceError> {
        let path = self.resolve(document_id.trim())?;
        let bytes = fs::read(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                DocumentSourceError::not_found(document_id)
            } else {
                DocumentSourceError::Io {
                    path: path.display().to_string(),
                    source,
                }
            }
        })?;
        debug!(document_id, bytes = bytes.len(), "document loaded");
        Ok(Document::from_bytes(&bytes))
    }
}

/// Documents supplied up front by the host.
#[derive(Debug, Default, Clone)]
pub struct MemoryDocumentSource {
    documents: HashMap<String, Document>,
}

impl MemoryDocumentSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, document_id: impl Into<String>, document: Document) -> Self {
        self.documents.insert(document_id.into(), document);
        self
    }
}

impl DocumentSource for MemoryDocumentSource {
    fn fetch_base64(&self, document_id: &str) -> Result<Document, DocumentSourceError> {
        self.documents
            .get(document_id.trim())
            .cloned()
            .ok_or_else(|| DocumentSourceError::not_found(document_id))
    }
}
