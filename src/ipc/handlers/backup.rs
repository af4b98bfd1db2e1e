use crate::auth::Principal;
use crate::backup;
use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::handlers::core::open_workspace;
use crate::ipc::helpers::{get_required_str, with_store, Ctx, HandlerErr};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

fn backup_export_workspace_bundle(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    ctx.admin()?;
    let out_path = get_required_str(params, "outPath")?;
    let out = PathBuf::from(&out_path);
    let export = backup::export_workspace_bundle(ctx.workspace, &out).map_err(|e| HandlerErr {
        code: "io_failed",
        message: e.to_string(),
        details: Some(json!({ "path": out_path })),
    })?;
    info!(path = %out_path, entries = export.entry_count, "workspace bundle exported");
    Ok(json!({
        "path": out_path,
        "bundleFormat": export.bundle_format,
        "entryCount": export.entry_count
    }))
}

fn handle_backup_import_workspace_bundle(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(workspace_path) = state.workspace.clone() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match state.session.principal() {
        Some(Principal::Admin { .. }) => {}
        Some(_) => return err(&req.id, "forbidden", "only an admin can restore a bundle", None),
        None => return err(&req.id, "unauthenticated", "log in first", None),
    }
    let in_path = match req.params.get("inPath").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => return err(&req.id, "bad_params", "missing inPath", None),
    };

    let src = PathBuf::from(&in_path);
    if !src.is_file() {
        return err(
            &req.id,
            "not_found",
            "bundle file not found",
            Some(json!({ "path": in_path })),
        );
    }

    // Drop cached collections before the data directory is swapped.
    state.store = None;

    let import = match backup::import_workspace_bundle(&src, &workspace_path) {
        Ok(v) => v,
        Err(e) => {
            let reopened = open_workspace(state, &workspace_path);
            return err(
                &req.id,
                "io_failed",
                e.to_string(),
                Some(json!({ "path": src.to_string_lossy(), "reopened": reopened.is_ok() })),
            );
        }
    };
    info!(path = %in_path, files = import.files_restored, "workspace bundle imported");

    match open_workspace(state, &workspace_path) {
        Ok(_) => ok(
            &req.id,
            json!({
                "workspacePath": workspace_path.to_string_lossy(),
                "bundleFormatDetected": import.bundle_format_detected,
                "filesRestored": import.files_restored,
                "loggedOut": true
            }),
        ),
        Err(e) => e.response(&req.id),
    }
}

fn export_relational_snapshot(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    ctx.admin()?;
    let out_path = get_required_str(params, "outPath")?;
    let summary = db::export_relational_snapshot(ctx.store, &PathBuf::from(&out_path)).map_err(|e| HandlerErr {
        code: "io_failed",
        message: format!("{e:#}"),
        details: Some(json!({ "path": out_path })),
    })?;
    Ok(json!({
        "path": out_path,
        "rows": summary.rows
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "backup.exportWorkspaceBundle" => Some(with_store(state, req, backup_export_workspace_bundle)),
        "backup.importWorkspaceBundle" => Some(handle_backup_import_workspace_bundle(state, req)),
        "export.relationalSnapshot" => Some(with_store(state, req, export_relational_snapshot)),
        _ => None,
    }
}
