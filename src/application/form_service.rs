// Form service - The form-state store and the views recomputed on every revision
use crate::domain::form::{FormEdit, FormError, FormState, Preset};
use crate::infrastructure::config::export_filename;
use crate::infrastructure::json_encoder::encode;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

/// Everything derived from one form revision for display and export
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportView {
    pub payload_text: String,
    pub compact: bool,
    pub valid: bool,
    pub export_ready: bool,
    pub setpoint_count: usize,
    pub reading_count: usize,
    pub filename: String,
}

impl ExportView {
    pub fn project(state: &FormState, filename_template: &str) -> Self {
        let payload = state.payload();

        Self {
            payload_text: encode(&payload, state.compact),
            compact: state.compact,
            valid: state.is_valid(),
            export_ready: state.is_export_ready(),
            setpoint_count: payload.len(),
            reading_count: payload.iter().map(|s| s.readings().len()).sum(),
            filename: export_filename(filename_template, &state.system_id),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FormSnapshot {
    pub revision: u64,
    pub state: FormState,
    pub view: ExportView,
}

#[derive(Clone)]
pub struct FormService {
    tx: Arc<watch::Sender<Arc<FormSnapshot>>>,
    presets: Arc<[Preset]>,
    filename_template: Arc<str>,
}

impl FormService {
    pub fn new(default_system_id: &str, presets: Vec<Preset>, filename_template: &str) -> Self {
        let state = FormState::new(default_system_id);
        let view = ExportView::project(&state, filename_template);
        let (tx, _rx) = watch::channel(Arc::new(FormSnapshot {
            revision: 0,
            state,
            view,
        }));

        Self {
            tx: Arc::new(tx),
            presets: presets.into(),
            filename_template: filename_template.into(),
        }
    }

    pub fn snapshot(&self) -> Arc<FormSnapshot> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<FormSnapshot>> {
        self.tx.subscribe()
    }

    pub fn presets(&self) -> &[Preset] {
        &self.presets
    }

    /// Apply one edit and publish the next revision. A rejected edit leaves
    /// the current revision in place and notifies nobody.
    pub fn apply(&self, edit: FormEdit) -> Result<Arc<FormSnapshot>, FormError> {
        let mut outcome = None;

        self.tx.send_if_modified(|current| {
            match current.state.apply(edit, &self.presets) {
                Ok(state) => {
                    let view = ExportView::project(&state, &self.filename_template);
                    let next = Arc::new(FormSnapshot {
                        revision: current.revision + 1,
                        state,
                        view,
                    });
                    *current = next.clone();
                    outcome = Some(Ok(next));
                    true
                }
                Err(e) => {
                    outcome = Some(Err(e));
                    false
                }
            }
        });

        // the closure always runs, so `outcome` is set here
        match outcome {
            Some(Ok(snapshot)) => {
                tracing::debug!(
                    "Form revision {}: {} setpoints, export_ready={}",
                    snapshot.revision,
                    snapshot.view.setpoint_count,
                    snapshot.view.export_ready
                );
                Ok(snapshot)
            }
            Some(Err(e)) => {
                tracing::debug!("Rejected form edit: {}", e);
                Err(e)
            }
            None => Ok(self.snapshot()),
        }
    }
}
