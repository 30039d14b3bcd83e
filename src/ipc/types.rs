use serde::Deserialize;

use crate::absence::AbsenceBoard;
use crate::gateway::RecordStore;
use crate::history::HistoryStore;
use crate::model::ImportStudent;
use crate::roster::RosterCache;
use crate::session::CheckInSession;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Everything the sidecar holds for one front-end session. Cached views are
/// only ever replaced as a whole.
#[derive(Default)]
pub struct AppState {
    pub store: Option<Box<dyn RecordStore>>,
    pub backend: Option<&'static str>,
    pub roster: RosterCache,
    pub session: CheckInSession,
    pub history: HistoryStore,
    pub absence: AbsenceBoard,
    /// Rows read by `students.previewImport`, waiting for `students.import`.
    pub pending_import: Vec<ImportStudent>,
}

impl AppState {
    /// Swaps the active store and drops everything cached from the old one.
    pub fn connect(&mut self, store: Box<dyn RecordStore>, backend: &'static str) {
        *self = AppState {
            store: Some(store),
            backend: Some(backend),
            ..AppState::default()
        };
    }
}
