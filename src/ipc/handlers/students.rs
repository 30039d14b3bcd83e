use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{get_required_str, refresh_after_write, require_store, View};
use crate::ipc::types::{AppState, Request};
use crate::model::ImportStudent;
use crate::roster::read_import_file;
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

fn students_delete(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    require_store(state)?.delete_student(&student_id)?;
    info!(student_id = %student_id, "student deleted");
    let stale = refresh_after_write(state, &[View::Roster, View::Absence]);
    Ok(json!({ "deleted": student_id, "stale": stale }))
}

fn students_preview_import(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let path = PathBuf::from(get_required_str(params, "path")?);
    let rows = read_import_file(&path).map_err(|e| {
        HandlerErr::from(e).with_details(json!({ "path": path.to_string_lossy() }))
    })?;
    state.pending_import = rows;
    Ok(json!({
        "count": state.pending_import.len(),
        "students": state.pending_import,
    }))
}

fn students_import(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let rows: Vec<ImportStudent> = match params.get("students") {
        None | Some(serde_json::Value::Null) => state.pending_import.clone(),
        Some(v) => serde_json::from_value(v.clone())
            .map_err(|e| HandlerErr::bad_params(format!("invalid students: {e}")))?,
    };
    require_store(state)?.import_students(&rows)?;
    info!(count = rows.len(), "students imported");
    state.pending_import.clear();
    let stale = refresh_after_write(state, &[View::Roster]);
    Ok(json!({ "imported": rows.len(), "stale": stale }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.delete" => Some(respond(&req.id, students_delete(state, &req.params))),
        "students.previewImport" => {
            Some(respond(&req.id, students_preview_import(state, &req.params)))
        }
        "students.import" => Some(respond(&req.id, students_import(state, &req.params))),
        _ => None,
    }
}
