use std::sync::Arc;

use crate::backend::{CandidateStore, LocationResolver, ModuleDirectory, TimesheetSource};
use crate::drafts::DraftStore;
use crate::wizard::SessionRegistry;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub locations: Arc<dyn LocationResolver>,
    pub candidates: Arc<dyn CandidateStore>,
    pub timesheet: Arc<dyn TimesheetSource>,
    pub modules: Arc<dyn ModuleDirectory>,
    /// Shared draft storage; each wizard sees it through its profile scope.
    pub drafts: Arc<dyn DraftStore>,
    pub sessions: Arc<SessionRegistry>,
}
