use crate::config::StoreConfig;
use crate::gateway;
use crate::ipc::error::{ok, respond, HandlerErr};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use tracing::info;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "store": state.backend,
            "session": state.session.state(),
        }),
    )
}

fn store_connect(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let config: StoreConfig = serde_json::from_value(params.clone())
        .map_err(|e| HandlerErr::bad_params(format!("invalid store config: {e}")))?;
    let store = gateway::open_store(&config)
        .map_err(|e| HandlerErr::new("store_open_failed", format!("{e:#}")))?;
    let backend = config.backend_name();
    state.connect(store, backend);
    info!(backend, "record store connected");
    Ok(json!({ "backend": backend }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "store.connect" => Some(respond(&req.id, store_connect(state, &req.params))),
        _ => None,
    }
}
