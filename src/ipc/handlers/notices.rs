use crate::auth::Principal;
use crate::ipc::helpers::{get_optional_str, get_required_str, parse_params, with_store, Ctx, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::records::notices::{self, Audience, NoticeInput};
use crate::records::teachers;
use crate::schema::EntryKind;
use serde_json::json;

fn notices_create(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    ctx.admin()?;
    let input: NoticeInput = parse_params(params)?;
    let entry = notices::create(ctx.store, input)?;
    Ok(json!({ "entry": entry }))
}

fn notices_list(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let audience = match ctx.principal()?.clone() {
        Principal::Admin { .. } => Audience::everyone(),
        Principal::Teacher { teacher_id } => {
            let teacher = teachers::get(ctx.store, &teacher_id)?;
            Audience::teacher(&teacher.classes)
        }
        Principal::Parent { class_name, .. } => Audience::parent(&class_name),
    };
    let kind = match get_optional_str(params, "type").as_deref() {
        None => None,
        Some("Event") => Some(EntryKind::Event),
        Some("Notice") => Some(EntryKind::Notice),
        Some(other) => return Err(HandlerErr::bad_params(format!("unknown type: {}", other))),
    };
    let entries = notices::list(ctx.store, &audience, kind)?;
    Ok(json!({ "entries": entries }))
}

fn notices_delete(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    ctx.admin()?;
    let entry_id = get_required_str(params, "entryId")?;
    let removed = notices::delete(ctx.store, &entry_id)?;
    Ok(json!({ "deleted": removed }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "notices.create" => Some(with_store(state, req, notices_create)),
        "notices.list" => Some(with_store(state, req, notices_list)),
        "notices.delete" => Some(with_store(state, req, notices_delete)),
        _ => None,
    }
}
