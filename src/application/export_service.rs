// Export service - Gate-controlled copy and download with fallback strategies
use crate::application::form_service::FormSnapshot;
use crate::application::platform::{ClipboardService, ExportError, FileSaveService, SavedExport};
use crate::infrastructure::download::StagedFile;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

const MANUAL_COPY_MESSAGE: &str = "Clipboard unavailable: select the text below and copy it manually";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CopyOutcome {
    Copied { via: String },
    Manual { text: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadOffer {
    pub filename: String,
    pub href: String,
    pub via: String,
    pub revision: u64,
}

#[derive(Default)]
struct DownloadSlot {
    latest_revision: u64,
    staged: Option<(u64, StagedFile)>,
}

pub struct ExportService {
    clipboards: Vec<Arc<dyn ClipboardService>>,
    savers: Vec<Arc<dyn FileSaveService>>,
    slot: Mutex<DownloadSlot>,
}

impl ExportService {
    pub fn new(
        clipboards: Vec<Arc<dyn ClipboardService>>,
        savers: Vec<Arc<dyn FileSaveService>>,
    ) -> Self {
        Self {
            clipboards,
            savers,
            slot: Mutex::new(DownloadSlot::default()),
        }
    }

    /// Copy the encoded payload, trying each clipboard in order. When every
    /// clipboard fails the text comes back for manual copying.
    pub async fn copy(&self, snapshot: &FormSnapshot) -> Result<CopyOutcome, ExportError> {
        ensure_ready(snapshot)?;
        let text = &snapshot.view.payload_text;

        for clipboard in &self.clipboards {
            match clipboard.write_text(text).await {
                Ok(()) => {
                    tracing::info!(
                        "Copied revision {} via {}",
                        snapshot.revision,
                        clipboard.name()
                    );
                    return Ok(CopyOutcome::Copied {
                        via: clipboard.name().to_string(),
                    });
                }
                Err(e) => tracing::warn!("Clipboard {} unavailable: {}", clipboard.name(), e),
            }
        }

        tracing::info!("No clipboard available, falling back to manual copy");
        Ok(CopyOutcome::Manual {
            text: text.clone(),
            message: MANUAL_COPY_MESSAGE.to_string(),
        })
    }

    /// Hand the payload to the first save strategy that works. A staged file
    /// replaces (and thereby releases) any previously staged one.
    pub async fn prepare_download(
        &self,
        snapshot: &FormSnapshot,
    ) -> Result<DownloadOffer, ExportError> {
        ensure_ready(snapshot)?;
        let filename = &snapshot.view.filename;

        for saver in &self.savers {
            let saved = match saver.save(filename, &snapshot.view.payload_text).await {
                Ok(saved) => saved,
                Err(e) => {
                    tracing::warn!("Save strategy {} failed: {}", saver.name(), e);
                    continue;
                }
            };

            let href = match saved {
                SavedExport::Staged(file) => {
                    let href = format!("/downloads/{}", urlencoding::encode(file.filename()));
                    self.stage(snapshot.revision, file)?;
                    href
                }
                SavedExport::DataUri(uri) => {
                    self.release_staged();
                    uri
                }
            };

            return Ok(DownloadOffer {
                filename: filename.clone(),
                href,
                via: saver.name().to_string(),
                revision: snapshot.revision,
            });
        }

        Err(ExportError::Unavailable)
    }

    /// Path of the currently staged download, if it matches `filename`
    pub fn staged_path(&self, filename: &str) -> Option<PathBuf> {
        let slot = self.slot.lock().ok()?;
        slot.staged
            .as_ref()
            .filter(|(_, file)| file.filename() == filename)
            .map(|(_, file)| file.path().to_path_buf())
    }

    /// Drop any staged download older than `revision`
    pub fn observe_revision(&self, revision: u64) {
        let released = {
            let Ok(mut slot) = self.slot.lock() else {
                return;
            };
            slot.latest_revision = slot.latest_revision.max(revision);
            let stale = matches!(
                &slot.staged,
                Some((staged_revision, _)) if *staged_revision < slot.latest_revision
            );
            if stale { slot.staged.take() } else { None }
        };

        if let Some((staged_revision, _file)) = released {
            tracing::debug!(
                "Released download for revision {} (now at {})",
                staged_revision,
                revision
            );
        }
    }

    pub fn release_staged(&self) {
        let released = self.slot.lock().ok().and_then(|mut slot| slot.staged.take());
        drop(released);
    }

    fn stage(&self, revision: u64, file: StagedFile) -> Result<(), ExportError> {
        let previous = {
            let mut slot = self.slot.lock().map_err(|_| ExportError::Unavailable)?;
            if revision < slot.latest_revision {
                // file drops here, removing it from disk
                return Err(ExportError::Superseded);
            }
            slot.staged.replace((revision, file))
        };
        // previous file released outside the lock
        drop(previous);
        Ok(())
    }
}

fn ensure_ready(snapshot: &FormSnapshot) -> Result<(), ExportError> {
    if snapshot.view.export_ready {
        Ok(())
    } else {
        Err(ExportError::NotReady)
    }
}

/// Release staged downloads as soon as the form moves past them
pub async fn release_superseded_downloads(
    mut rx: watch::Receiver<Arc<FormSnapshot>>,
    exports: Arc<ExportService>,
) {
    while rx.changed().await.is_ok() {
        let revision = rx.borrow_and_update().revision;
        exports.observe_revision(revision);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::form_service::FormService;
    use crate::domain::form::{FormEdit, Preset};
    use crate::infrastructure::download::{DataUriSaver, StagingDirSaver};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeClipboard {
        name: &'static str,
        works: bool,
        writes: AtomicUsize,
    }

    impl FakeClipboard {
        fn new(name: &'static str, works: bool) -> Arc<Self> {
            Arc::new(Self {
                name,
                works,
                writes: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ClipboardService for FakeClipboard {
        fn name(&self) -> &str {
            self.name
        }

        async fn write_text(&self, _text: &str) -> Result<(), ExportError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if self.works {
                Ok(())
            } else {
                Err(ExportError::Strategy {
                    strategy: self.name.to_string(),
                    reason: "no display".to_string(),
                })
            }
        }
    }

    struct BrokenSaver;

    #[async_trait]
    impl FileSaveService for BrokenSaver {
        fn name(&self) -> &str {
            "broken"
        }

        async fn save(&self, _filename: &str, _contents: &str) -> Result<SavedExport, ExportError> {
            Err(ExportError::Io(std::io::Error::other("disk full")))
        }
    }

    fn form() -> FormService {
        let presets = vec![Preset {
            name: "cold".to_string(),
            temperature: "-95".to_string(),
            humidities: vec![],
        }];
        FormService::new("1", presets, "calibration_setpoints_system_${system_id}.json")
    }

    fn ready_snapshot(form: &FormService) -> Arc<FormSnapshot> {
        form.apply(FormEdit::QuickAdd {
            preset: "cold".to_string(),
        })
        .unwrap()
    }

    fn service_with_savers(savers: Vec<Arc<dyn FileSaveService>>) -> ExportService {
        ExportService::new(vec![], savers)
    }

    #[tokio::test]
    async fn test_copy_refused_when_not_ready() {
        let clipboard = FakeClipboard::new("fake", true);
        let service = ExportService::new(vec![clipboard.clone()], vec![]);

        let err = service.copy(&form().snapshot()).await.unwrap_err();
        assert!(matches!(err, ExportError::NotReady));
        assert_eq!(clipboard.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_copy_falls_through_to_working_clipboard() {
        let broken = FakeClipboard::new("wl-copy", false);
        let working = FakeClipboard::new("xclip", true);
        let service = ExportService::new(vec![broken.clone(), working.clone()], vec![]);

        let outcome = service.copy(&ready_snapshot(&form())).await.unwrap();
        assert_eq!(
            outcome,
            CopyOutcome::Copied {
                via: "xclip".to_string()
            }
        );
        assert_eq!(broken.writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_copy_offers_manual_fallback() {
        let service = ExportService::new(vec![FakeClipboard::new("pbcopy", false)], vec![]);
        let snapshot = ready_snapshot(&form());

        match service.copy(&snapshot).await.unwrap() {
            CopyOutcome::Manual { text, message } => {
                assert_eq!(text, snapshot.view.payload_text);
                assert_eq!(message, MANUAL_COPY_MESSAGE);
            }
            other => panic!("expected manual fallback, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_download_refused_when_not_ready() {
        let service = service_with_savers(vec![Arc::new(DataUriSaver)]);
        let err = service.prepare_download(&form().snapshot()).await.unwrap_err();
        assert!(matches!(err, ExportError::NotReady));
    }

    #[tokio::test]
    async fn test_download_staged_then_released_on_new_revision() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_with_savers(vec![Arc::new(StagingDirSaver::new(dir.path()))]);
        let form = form();
        let snapshot = ready_snapshot(&form);

        let offer = service.prepare_download(&snapshot).await.unwrap();
        assert_eq!(offer.filename, "calibration_setpoints_system_1.json");
        assert_eq!(offer.href, "/downloads/calibration_setpoints_system_1.json");
        assert_eq!(offer.via, "staging-dir");

        let path = service.staged_path(&offer.filename).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            snapshot.view.payload_text
        );

        let next = form.apply(FormEdit::AddGroup).unwrap();
        service.observe_revision(next.revision);
        assert!(service.staged_path(&offer.filename).is_none());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_new_download_supersedes_old_file() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_with_savers(vec![Arc::new(StagingDirSaver::new(dir.path()))]);
        let snapshot = ready_snapshot(&form());

        let offer = service.prepare_download(&snapshot).await.unwrap();
        let first = service.staged_path(&offer.filename).unwrap();
        service.prepare_download(&snapshot).await.unwrap();
        let second = service.staged_path(&offer.filename).unwrap();

        assert_ne!(first, second);
        assert!(!first.exists());
        assert!(second.exists());
    }

    #[tokio::test]
    async fn test_stale_snapshot_cannot_stage() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_with_savers(vec![Arc::new(StagingDirSaver::new(dir.path()))]);
        let snapshot = ready_snapshot(&form());

        service.observe_revision(snapshot.revision + 1);
        let err = service.prepare_download(&snapshot).await.unwrap_err();
        assert!(matches!(err, ExportError::Superseded));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_download_falls_back_to_data_uri() {
        let service = service_with_savers(vec![Arc::new(BrokenSaver), Arc::new(DataUriSaver)]);
        let offer = service.prepare_download(&ready_snapshot(&form())).await.unwrap();

        assert_eq!(offer.via, "data-uri");
        assert!(offer.href.starts_with("data:application/json;charset=utf-8,%5B%5B"));
    }

    #[tokio::test]
    async fn test_download_unavailable_when_every_saver_fails() {
        let service = service_with_savers(vec![Arc::new(BrokenSaver)]);
        let err = service
            .prepare_download(&ready_snapshot(&form()))
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::Unavailable));
    }

    #[tokio::test]
    async fn test_release_task_follows_form() {
        let dir = tempfile::tempdir().unwrap();
        let service = Arc::new(service_with_savers(vec![Arc::new(StagingDirSaver::new(
            dir.path(),
        ))]));
        let form = form();
        let snapshot = ready_snapshot(&form);
        let offer = service.prepare_download(&snapshot).await.unwrap();

        let task = tokio::spawn(release_superseded_downloads(
            form.subscribe(),
            service.clone(),
        ));
        form.apply(FormEdit::AddGroup).unwrap();

        for _ in 0..50 {
            if service.staged_path(&offer.filename).is_none() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(service.staged_path(&offer.filename).is_none());
        task.abort();
    }
}
