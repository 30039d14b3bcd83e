use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{get_required_str, refresh_after_write, require_store, View};
use crate::ipc::types::{AppState, Request};
use crate::model::Status;
use crate::session::CheckInSession;
use serde_json::json;
use tracing::info;

fn parse_status(params: &serde_json::Value) -> Result<Status, HandlerErr> {
    let raw = params
        .get("status")
        .cloned()
        .ok_or_else(|| HandlerErr::bad_params("missing status"))?;
    serde_json::from_value(raw).map_err(|_| {
        HandlerErr::bad_params("status must be one of present, leave, absent, unknown")
    })
}

fn snapshot(state: &AppState) -> serde_json::Value {
    json!({
        "state": state.session.state(),
        "date": state.session.date(),
        "groups": state.session.derive_groups(),
    })
}

fn session_start(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    state.session = CheckInSession::new();
    Ok(snapshot(state))
}

fn session_assign(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    let status = parse_status(params)?;
    let Some(student) = state.roster.get(&student_id) else {
        return Err(HandlerErr::new("not_found", "student not in roster")
            .with_details(json!({ "studentId": student_id })));
    };
    state.session.assign(student, status)?;
    Ok(snapshot(state))
}

fn session_remove(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    let removed = state.session.remove(&student_id)?;
    let mut out = snapshot(state);
    out["removed"] = json!(removed);
    Ok(out)
}

fn session_reset(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    state.session.clear();
    Ok(snapshot(state))
}

fn session_submit(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    let payload = state.session.finalize()?;
    require_store(state)?.submit_check_in(&payload)?;
    state.session.mark_submitted();
    info!(date = %payload.date, students = payload.students.len(), "check-in submitted");

    let stale = refresh_after_write(state, &[View::History, View::Absence]);
    Ok(json!({
        "date": payload.date,
        "count": payload.students.len(),
        "state": state.session.state(),
        "stale": stale,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "session.start" => session_start(state),
        "session.assign" => session_assign(state, &req.params),
        "session.remove" => session_remove(state, &req.params),
        "session.reset" => session_reset(state),
        "session.groups" => Ok(snapshot(state)),
        "session.submit" => session_submit(state),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
