use crate::ipc::error::{ok, respond, HandlerErr};
use crate::ipc::helpers::View;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn roster_refresh(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    View::Roster.refresh(state)?;
    Ok(json!({ "students": state.roster.students() }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        // students.list is the settings-page name for the same fetch.
        "roster.refresh" | "students.list" => Some(respond(&req.id, roster_refresh(state))),
        "roster.list" => Some(ok(&req.id, json!({ "students": state.roster.students() }))),
        _ => None,
    }
}
