use crate::history::{detail_rows, summarize};
use crate::ipc::error::{ok, respond, HandlerErr};
use crate::ipc::helpers::{get_required_str, refresh_after_write, require_store, View};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use tracing::info;

fn history_refresh(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    View::History.refresh(state)?;
    Ok(json!({ "records": state.history.summaries() }))
}

fn history_detail(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let check_in_id = get_required_str(params, "checkInId")?;
    let Some(record) = state.history.find(&check_in_id) else {
        return Err(HandlerErr::new("not_found", "check-in not found")
            .with_details(json!({ "checkInId": check_in_id })));
    };
    let summary = summarize(record);
    Ok(json!({
        "id": record.id,
        "date": record.date,
        "timestamp": summary.timestamp,
        "counts": summary.counts,
        "students": detail_rows(record),
        "issues": summary.issues,
    }))
}

/// Deleting a check-in changes both the record list and the absence counts
/// derived from it, so both views are re-fetched.
fn history_delete(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let check_in_id = get_required_str(params, "checkInId")?;
    require_store(state)?.delete_check_in(&check_in_id)?;
    info!(check_in_id = %check_in_id, "check-in deleted");
    let stale = refresh_after_write(state, &[View::History, View::Absence]);
    Ok(json!({ "deleted": check_in_id, "stale": stale }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "history.refresh" => Some(respond(&req.id, history_refresh(state))),
        "history.list" => Some(ok(&req.id, json!({ "records": state.history.summaries() }))),
        "history.detail" => Some(respond(&req.id, history_detail(state, &req.params))),
        "history.delete" => Some(respond(&req.id, history_delete(state, &req.params))),
        _ => None,
    }
}
