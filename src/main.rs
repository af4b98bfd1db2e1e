mod attachments;
mod auth;
mod backup;
mod codec;
mod config;
mod db;
mod error;
mod ipc;
mod partition;
mod records;
mod schema;
mod seed;
mod store;
mod workflow;

use dotenvy::dotenv;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    // .env first so it can carry the log filter too.
    dotenv().ok();

    // stdout carries the protocol; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(config::LOG_ENV)
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();

    let mut state = ipc::AppState::default();

    if let Ok(path) = std::env::var(config::WORKSPACE_ENV) {
        if !path.trim().is_empty() {
            let path = PathBuf::from(path.trim());
            if let Err(e) = ipc::open_workspace(&mut state, &path) {
                error!(workspace = %path.display(), code = e.code, "failed to open workspace: {}", e.message);
            }
        }
    }
    info!(version = env!("CARGO_PKG_VERSION"), "academicd ready");

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
                // No id to answer to.
                let resp = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                let _ = writeln!(stdout, "{}", resp);
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
}
