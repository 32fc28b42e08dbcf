//! Definition sources.
//!
//! A source hands out raw definition documents addressed by
//! (theme, layout type). Parsing and caching live in the loader.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a definition source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// No document exists for the key.
    #[error("definition not found: {theme}/{layout_type}")]
    NotFound { theme: String, layout_type: String },

    /// A key segment cannot address a document.
    #[error("invalid definition key segment: {0:?}")]
    InvalidKey(String),

    /// IO error (file system).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read-only catalog of layout definition documents.
#[async_trait]
pub trait DefinitionSource: Send + Sync {
    /// Reads the raw document for (theme, layout type).
    async fn read_definition(&self, theme: &str, layout_type: &str) -> Result<Vec<u8>, SourceError>;

    /// Lists the layout types a theme ships, sorted.
    async fn list_layout_types(&self, theme: &str) -> Result<Vec<String>, SourceError>;
}

/// Serves definitions from `<root>/<theme>/templates/<layout_type>.json`.
#[derive(Debug, Clone)]
pub struct FileDefinitionSource {
    root: PathBuf,
}

impl FileDefinitionSource {
    /// Creates a source rooted at the themes directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the themes directory.
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    fn templates_dir(&self, theme: &str) -> Result<PathBuf, SourceError> {
        Ok(self.root.join(checked_segment(theme)?).join("templates"))
    }
}

/// Rejects segments that could escape the themes directory.
fn checked_segment(segment: &str) -> Result<&str, SourceError> {
    let valid = !segment.is_empty()
        && !segment.starts_with('.')
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(segment)
    } else {
        Err(SourceError::InvalidKey(segment.to_string()))
    }
}

#[async_trait]
impl DefinitionSource for FileDefinitionSource {
    async fn read_definition(&self, theme: &str, layout_type: &str) -> Result<Vec<u8>, SourceError> {
        let path = self
            .templates_dir(theme)?
            .join(format!("{}.json", checked_segment(layout_type)?));
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(SourceError::NotFound {
                theme: theme.to_string(),
                layout_type: layout_type.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_layout_types(&self, theme: &str) -> Result<Vec<String>, SourceError> {
        let dir = self.templates_dir(theme)?;
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut layout_types = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                layout_types.push(stem.to_string());
            }
        }
        layout_types.sort();
        Ok(layout_types)
    }
}
