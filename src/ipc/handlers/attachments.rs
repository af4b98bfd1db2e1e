use crate::attachments;
use crate::auth::Principal;
use crate::ipc::helpers::{get_optional_str, get_required_str, with_store, Ctx, HandlerErr};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;

fn attachments_import(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let default_owner = match ctx.principal()? {
        Principal::Admin { teacher_id } | Principal::Teacher { teacher_id } => teacher_id.clone(),
        Principal::Parent { student_id, .. } => student_id.clone(),
    };
    let kind = get_required_str(params, "kind")?;
    if !attachments::is_kind(&kind) {
        return Err(HandlerErr {
            code: "bad_params",
            message: format!("unknown kind: {}", kind),
            details: Some(json!({ "kinds": attachments::KINDS })),
        });
    }
    let source = PathBuf::from(get_required_str(params, "sourcePath")?);
    if !source.is_file() {
        return Err(HandlerErr {
            code: "not_found",
            message: "attachment file not found".to_string(),
            details: Some(json!({ "path": source.to_string_lossy() })),
        });
    }
    let owner = get_optional_str(params, "owner").unwrap_or(default_owner);
    let stored = attachments::import(ctx.store.data_dir(), &kind, &owner, &source).map_err(|e| HandlerErr {
        code: "io_failed",
        message: e.to_string(),
        details: Some(json!({ "path": source.to_string_lossy() })),
    })?;
    Ok(json!({ "path": stored.to_string_lossy() }))
}

fn attachments_check(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    ctx.principal()?;
    let path = get_required_str(params, "path")?;
    let check = attachments::check(&PathBuf::from(&path));
    Ok(json!({
        "path": path,
        "exists": check.exists,
        "size": check.size
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "attachments.import" => Some(with_store(state, req, attachments_import)),
        "attachments.check" => Some(with_store(state, req, attachments_check)),
        _ => None,
    }
}
