use std::{io, path::Path, sync::Arc};

const FALLBACK_NAME: &str = "document.pdf";

/// The file a session is built around: raw bytes plus the name shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedDocument {
    name: String,
    bytes: Arc<[u8]>,
}

impl SelectedDocument {
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub async fn load(path: &Path) -> io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| FALLBACK_NAME.to_string());
        tracing::debug!(name = %name, size_bytes = bytes.len(), "read document from disk");
        Ok(Self::new(name, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
