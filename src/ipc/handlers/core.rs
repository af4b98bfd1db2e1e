use crate::config::load_workspace_config;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{with_store, Ctx, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::seed::{self, SeedReport};
use crate::store::DocumentStore;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::info;

/// Opens (and seeds) a workspace, replacing whatever was open. The session is logged out.
pub fn open_workspace(state: &mut AppState, path: &Path) -> Result<SeedReport, HandlerErr> {
    let config = load_workspace_config(path).map_err(|e| HandlerErr {
        code: "config_invalid",
        message: e.to_string(),
        details: Some(json!({ "path": path.to_string_lossy() })),
    })?;
    let mut store = DocumentStore::open(path)?;
    let report = seed::initialize(&mut store, &config)?;

    state.session.logout();
    state.workspace = Some(path.to_path_buf());
    state.store = Some(store);
    info!(
        workspace = %path.display(),
        seeded = report.seeded.len(),
        skipped_corrupt = report.skipped_corrupt.len(),
        "workspace opened"
    );
    Ok(report)
}

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
            "role": state.session.principal().map(|p| p.role().as_str())
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match open_workspace(state, &path) {
        Ok(report) => ok(
            &req.id,
            json!({
                "workspacePath": path.to_string_lossy(),
                "seeded": report.seeded.iter().map(|c| c.as_str()).collect::<Vec<_>>(),
                "skippedCorrupt": report.skipped_corrupt.iter().map(|c| c.as_str()).collect::<Vec<_>>(),
            }),
        ),
        Err(e) => e.response(&req.id),
    }
}

fn store_status(ctx: &mut Ctx<'_>, _params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let collections: Vec<serde_json::Value> = ctx
        .store
        .status()
        .into_iter()
        .map(|s| {
            json!({
                "name": s.name.as_str(),
                "path": s.path.to_string_lossy(),
                "cached": s.cached,
                "revision": s.revision,
                "corrupt": s.corrupt,
            })
        })
        .collect();
    Ok(json!({
        "workspacePath": ctx.workspace.to_string_lossy(),
        "collections": collections
    }))
}

fn store_reload(ctx: &mut Ctx<'_>, _params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    ctx.store.reload();
    Ok(json!({ "reloaded": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        "store.status" => Some(with_store(state, req, store_status)),
        "store.reload" => Some(with_store(state, req, store_reload)),
        _ => None,
    }
}
