use crate::absence::CHART_LIMIT;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::View;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn parse_limit(params: &serde_json::Value) -> Result<usize, HandlerErr> {
    match params.get("limit") {
        None | Some(serde_json::Value::Null) => Ok(CHART_LIMIT),
        Some(v) => v
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| HandlerErr::bad_params("limit must be a non-negative integer")),
    }
}

fn chart(state: &AppState, limit: usize) -> serde_json::Value {
    json!({
        "stats": state.absence.top(limit),
        "total": state.absence.stats().len(),
    })
}

fn absence_refresh(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let limit = parse_limit(params)?;
    View::Absence.refresh(state)?;
    Ok(chart(state, limit))
}

fn absence_top(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let limit = parse_limit(params)?;
    Ok(chart(state, limit))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "absence.refresh" => Some(respond(&req.id, absence_refresh(state, &req.params))),
        "absence.top" => Some(respond(&req.id, absence_top(state, &req.params))),
        _ => None,
    }
}
