use crate::auth::Principal;
use crate::ipc::helpers::{get_optional_str, get_required_str, parse_params, with_store, Ctx, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::records::timetable::{self, SlotInput};
use serde_json::json;

fn timetable_set(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let teacher_id = ctx.teacher()?;
    let input: SlotInput = parse_params(params)?;
    let slot = timetable::set(ctx.store, &teacher_id, input)?;
    Ok(json!({ "slot": slot }))
}

fn timetable_clear(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let teacher_id = ctx.teacher()?;
    let day = get_required_str(params, "day")?;
    let period = params
        .get("period")
        .and_then(|v| v.as_u64())
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| HandlerErr::bad_params("missing period"))?;
    timetable::clear(ctx.store, &teacher_id, &day, period)?;
    Ok(json!({ "cleared": true }))
}

/// Teachers read their own week; an admin may name any teacher.
fn timetable_for_teacher(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let own_id = ctx.staff()?;
    let teacher_id = match ctx.principal()? {
        Principal::Admin { .. } => get_optional_str(params, "teacherId").unwrap_or(own_id),
        _ => own_id,
    };
    let slots = timetable::for_teacher(ctx.store, &teacher_id)?;
    Ok(json!({ "teacherId": teacher_id, "slots": slots }))
}

fn timetable_for_class(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let class_name = get_required_str(params, "className")?;
    if let Principal::Parent { class_name: own, .. } = ctx.principal()? {
        if *own != class_name {
            return Err(HandlerErr::new("forbidden", "parents can only read their child's class"));
        }
    }
    let slots = timetable::for_class(ctx.store, &class_name)?;
    Ok(json!({ "className": class_name, "slots": slots }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "timetable.set" => Some(with_store(state, req, timetable_set)),
        "timetable.clear" => Some(with_store(state, req, timetable_clear)),
        "timetable.forTeacher" => Some(with_store(state, req, timetable_for_teacher)),
        "timetable.forClass" => Some(with_store(state, req, timetable_for_class)),
        _ => None,
    }
}
