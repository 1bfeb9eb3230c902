// Application state for HTTP handlers
use crate::application::export_service::ExportService;
use crate::application::form_service::FormService;
use crate::application::self_check::SelfCheckService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub form_service: FormService,
    pub export_service: Arc<ExportService>,
    pub self_check: SelfCheckService,
}
