use crate::ipc::helpers::{get_optional_str, get_required_str, parse_params, with_store, Ctx, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::records::students::{self, StudentInput};
use serde_json::json;

fn students_list(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    ctx.staff()?;
    let class_name = get_optional_str(params, "className");
    let list = students::list(ctx.store, class_name.as_deref())?;
    Ok(json!({ "students": list }))
}

fn students_get(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    ctx.student_access(&student_id)?;
    let student = students::get(ctx.store, &student_id)?;
    Ok(json!({ "student": student }))
}

fn students_create(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    ctx.staff()?;
    let input: StudentInput = parse_params(params)?;
    let student = students::create(ctx.store, input)?;
    Ok(json!({ "student": student }))
}

fn students_update(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    ctx.staff()?;
    let student_id = get_required_str(params, "studentId")?;
    let input: StudentInput = parse_params(params)?;
    let student = students::update(ctx.store, &student_id, input)?;
    Ok(json!({ "student": student }))
}

fn students_delete(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    ctx.staff()?;
    let student_id = get_required_str(params, "studentId")?;
    let removed = students::delete(ctx.store, &student_id)?;
    Ok(json!({ "deleted": removed }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(with_store(state, req, students_list)),
        "students.get" => Some(with_store(state, req, students_get)),
        "students.create" => Some(with_store(state, req, students_create)),
        "students.update" => Some(with_store(state, req, students_update)),
        "students.delete" => Some(with_store(state, req, students_delete)),
        _ => None,
    }
}
