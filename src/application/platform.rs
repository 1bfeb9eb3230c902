// Platform collaborators reached by the export service
use crate::infrastructure::download::StagedFile;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Form is not ready to export: enter a positive system id and a valid temperature for every setpoint")]
    NotReady,

    #[error("Form changed while the export was being prepared, try again")]
    Superseded,

    #[error("{strategy} failed: {reason}")]
    Strategy { strategy: String, reason: String },

    #[error("No save mechanism available")]
    Unavailable,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A way of putting text on the user's clipboard
#[async_trait]
pub trait ClipboardService: Send + Sync {
    fn name(&self) -> &str;

    async fn write_text(&self, text: &str) -> Result<(), ExportError>;
}

/// What a save strategy produced for the user to act on
#[derive(Debug)]
pub enum SavedExport {
    /// File held on disk until the handle is dropped
    Staged(StagedFile),
    /// Self-contained `data:` URI
    DataUri(String),
}

/// A way of handing the encoded document to the user as a file
#[async_trait]
pub trait FileSaveService: Send + Sync {
    fn name(&self) -> &str;

    async fn save(&self, filename: &str, contents: &str) -> Result<SavedExport, ExportError>;
}
