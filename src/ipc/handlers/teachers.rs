use crate::ipc::helpers::{get_required_str, parse_params, with_store, Ctx, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::records::teachers::{self, ProfileInput, TeacherInput};
use serde_json::json;

fn teachers_list(ctx: &mut Ctx<'_>, _params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    ctx.admin()?;
    let list: Vec<serde_json::Value> = teachers::list(ctx.store)?
        .iter()
        .map(|t| t.redacted())
        .collect();
    Ok(json!({ "teachers": list }))
}

fn teachers_create(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    ctx.admin()?;
    let input: TeacherInput = parse_params(params)?;
    let teacher = teachers::create(ctx.store, input)?;
    Ok(json!({ "teacher": teacher.redacted() }))
}

fn teachers_update(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    ctx.admin()?;
    let teacher_id = get_required_str(params, "teacherId")?;
    let input: TeacherInput = parse_params(params)?;
    let teacher = teachers::update(ctx.store, &teacher_id, input)?;
    Ok(json!({ "teacher": teacher.redacted() }))
}

fn teachers_delete(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let own_id = ctx.admin()?;
    let teacher_id = get_required_str(params, "teacherId")?;
    if teacher_id == own_id {
        return Err(HandlerErr::new("validation_failed", "cannot delete the logged-in account"));
    }
    let removed = teachers::delete(ctx.store, &teacher_id)?;
    Ok(json!({ "deleted": removed.redacted() }))
}

/// Any staff login may edit its own contact details and password.
fn teachers_update_profile(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let teacher_id = ctx.staff()?;
    let input: ProfileInput = parse_params(params)?;
    let teacher = teachers::update_profile(ctx.store, &teacher_id, input)?;
    Ok(json!({ "teacher": teacher.redacted() }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "teachers.list" => Some(with_store(state, req, teachers_list)),
        "teachers.create" => Some(with_store(state, req, teachers_create)),
        "teachers.update" => Some(with_store(state, req, teachers_update)),
        "teachers.delete" => Some(with_store(state, req, teachers_delete)),
        "teachers.updateProfile" => Some(with_store(state, req, teachers_update_profile)),
        _ => None,
    }
}
