use crate::ipc::helpers::{get_optional_str, get_required_str, parse_params, with_store, Ctx, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::records::performance::{self, ExamInput};
use serde_json::json;

fn performance_record(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let teacher_id = ctx.teacher()?;
    let input: ExamInput = parse_params(params)?;
    let recorded = performance::record(ctx.store, &teacher_id, input)?;
    Ok(json!({ "recorded": recorded }))
}

fn performance_class_report(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    ctx.staff()?;
    let class_name = get_required_str(params, "className")?;
    let exam_name = get_optional_str(params, "examName");
    let report = performance::class_report(ctx.store, &class_name, exam_name.as_deref())?;
    Ok(json!({ "report": report }))
}

fn performance_student_report(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    ctx.student_access(&student_id)?;
    let report = performance::student_report(ctx.store, &student_id)?;
    Ok(json!({ "report": report }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "performance.record" => Some(with_store(state, req, performance_record)),
        "performance.classReport" => Some(with_store(state, req, performance_class_report)),
        "performance.studentReport" => Some(with_store(state, req, performance_student_report)),
        _ => None,
    }
}
