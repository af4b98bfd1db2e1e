use crate::ipc::helpers::{get_required_str, with_store, Ctx, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::records::attendance;
use crate::schema::collections::AttendanceSheet;
use serde_json::json;

fn attendance_open(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let teacher_id = ctx.teacher()?;
    let date = get_required_str(params, "date")?;
    let class_name = get_required_str(params, "className")?;
    let roster = attendance::open(ctx.store, &teacher_id, &date, &class_name)?;
    Ok(json!({
        "date": date,
        "className": class_name,
        "roster": roster
    }))
}

fn attendance_save(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let teacher_id = ctx.teacher()?;
    let date = get_required_str(params, "date")?;
    let class_name = get_required_str(params, "className")?;
    let Some(raw) = params.get("marks") else {
        return Err(HandlerErr::bad_params("missing marks"));
    };
    let marks: AttendanceSheet = serde_json::from_value(raw.clone())
        .map_err(|e| HandlerErr::bad_params(format!("invalid marks: {}", e)))?;
    let saved = attendance::save(ctx.store, &teacher_id, &date, &class_name, marks)?;
    Ok(json!({ "saved": saved }))
}

fn attendance_student_history(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    ctx.student_access(&student_id)?;
    let history = attendance::student_history(ctx.store, &student_id)?;
    let summary = attendance::summarize(&history);
    Ok(json!({
        "studentId": student_id,
        "entries": history,
        "summary": summary
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "attendance.open" => Some(with_store(state, req, attendance_open)),
        "attendance.save" => Some(with_store(state, req, attendance_save)),
        "attendance.studentHistory" => Some(with_store(state, req, attendance_student_history)),
        _ => None,
    }
}
