// Download staging: files in a staging directory, data URIs as fallback
use crate::application::platform::{ExportError, FileSaveService, SavedExport};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// A staged export on disk. The file is removed when the handle drops,
/// whether the export completed, failed halfway, or was superseded.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    filename: String,
}

impl StagedFile {
    fn new(path: PathBuf, filename: &str) -> Self {
        Self {
            path,
            filename: filename.to_string(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name offered to the user, without the staging prefix
    pub fn filename(&self) -> &str {
        &self.filename
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!("Released staged export {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                "Could not remove staged export {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

/// Writes exports into a staging directory, one uniquely named file per save
#[derive(Debug)]
pub struct StagingDirSaver {
    dir: PathBuf,
    sequence: AtomicU64,
}

impl StagingDirSaver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            sequence: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl FileSaveService for StagingDirSaver {
    fn name(&self) -> &str {
        "staging-dir"
    }

    async fn save(&self, filename: &str, contents: &str) -> Result<SavedExport, ExportError> {
        let safe_name = Path::new(filename)
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ExportError::Strategy {
                strategy: self.name().to_string(),
                reason: format!("invalid filename '{}'", filename),
            })?;

        tokio::fs::create_dir_all(&self.dir).await?;

        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let path = self
            .dir
            .join(format!("{}-{}-{}", std::process::id(), sequence, safe_name));

        // handle first, so a failed write leaves nothing behind
        let staged = StagedFile::new(path, safe_name);
        tokio::fs::write(staged.path(), contents).await?;

        Ok(SavedExport::Staged(staged))
    }
}

/// Encodes the document into a `data:` URI; cannot fail
#[derive(Debug, Default)]
pub struct DataUriSaver;

pub fn data_uri(contents: &str) -> String {
    format!(
        "data:application/json;charset=utf-8,{}",
        urlencoding::encode(contents)
    )
}

#[async_trait]
impl FileSaveService for DataUriSaver {
    fn name(&self) -> &str {
        "data-uri"
    }

    async fn save(&self, _filename: &str, contents: &str) -> Result<SavedExport, ExportError> {
        Ok(SavedExport::DataUri(data_uri(contents)))
    }
}
