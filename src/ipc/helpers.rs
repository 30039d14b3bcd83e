use crate::error::AttendanceError;
use crate::gateway::RecordStore;
use crate::ipc::error::HandlerErr;
use crate::ipc::types::AppState;
use serde_json::json;
use tracing::warn;

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn require_store(state: &AppState) -> Result<&dyn RecordStore, HandlerErr> {
    state
        .store
        .as_deref()
        .ok_or_else(|| HandlerErr::new("no_store", "connect a record store first"))
}

/// A cached view that is re-fetched from the store as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Roster,
    History,
    Absence,
}

impl View {
    pub fn name(self) -> &'static str {
        match self {
            View::Roster => "roster",
            View::History => "history",
            View::Absence => "absence",
        }
    }

    /// Replaces the cached view. On failure the previous contents stay and
    /// the error names the view in its details.
    pub fn refresh(self, state: &mut AppState) -> Result<(), HandlerErr> {
        let store = require_store(state)?;
        let tag = |e: AttendanceError| {
            HandlerErr::from(e).with_details(json!({ "view": self.name() }))
        };
        match self {
            View::Roster => {
                let students = store.list_students().map_err(tag)?;
                state.roster.replace(students);
            }
            View::History => {
                let records = store.list_check_ins().map_err(tag)?;
                state.history.replace(records);
            }
            View::Absence => {
                let stats = store.list_absence_stats().map_err(tag)?;
                state.absence.replace(stats);
            }
        }
        Ok(())
    }
}

/// Runs the refreshes that must follow a successful write. A view whose
/// refresh fails keeps its previous contents and is returned by name.
pub fn refresh_after_write(state: &mut AppState, views: &[View]) -> Vec<&'static str> {
    let mut stale = Vec::new();
    for view in views {
        if let Err(e) = view.refresh(state) {
            warn!(view = view.name(), code = e.code, error = %e.message, "refresh after write failed");
            stale.push(view.name());
        }
    }
    stale
}
