use rollcalld::config::{StoreConfig, ENV_LOG};
use rollcalld::{gateway, ipc};
use std::io::{self, BufRead, Write};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_logging() {
    // stdout carries the protocol; logs go to stderr.
    let filter = EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .try_init();
}

fn initial_state() -> ipc::AppState {
    let mut state = ipc::AppState::default();
    match StoreConfig::from_env() {
        Ok(Some(config)) => match gateway::open_store(&config) {
            Ok(store) => {
                info!(backend = config.backend_name(), "record store connected from environment");
                state.connect(store, config.backend_name());
            }
            Err(e) => error!(error = %format!("{e:#}"), "failed to open configured record store"),
        },
        Ok(None) => info!("no record store configured; waiting for store.connect"),
        Err(e) => error!(error = %e, "invalid store configuration in environment"),
    }
    state
}

fn main() {
    init_logging();
    let mut state = initial_state();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                let _ = writeln!(
                    stdout,
                    "{}",
                    serde_json::json!({
                        "ok": false,
                        "error": { "code": "bad_json", "message": e.to_string() }
                    })
                );
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
    info!("stdin closed; exiting");
}
