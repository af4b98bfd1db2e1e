use crate::auth::Principal;
use crate::ipc::helpers::{get_required_str, parse_params, with_store, Ctx, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::partition::Upsert;
use crate::records::assignments::{self, AssignmentInput, GradeInput, SubmissionInput};
use serde_json::json;

fn assignments_create(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let teacher_id = ctx.teacher()?;
    let input: AssignmentInput = parse_params(params)?;
    let assignment = assignments::create(ctx.store, &teacher_id, input)?;
    Ok(json!({ "assignment": assignment }))
}

fn assignments_list(ctx: &mut Ctx<'_>, _params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let teacher_id = ctx.teacher()?;
    let list = assignments::list(ctx.store, &teacher_id)?;
    Ok(json!({ "assignments": list }))
}

fn assignments_delete(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let teacher_id = ctx.teacher()?;
    let assignment_id = get_required_str(params, "assignmentId")?;
    assignments::delete(ctx.store, &teacher_id, &assignment_id)?;
    Ok(json!({ "deleted": assignment_id }))
}

fn assignments_for_student(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    ctx.student_access(&student_id)?;
    let list = assignments::for_student(ctx.store, &student_id)?;
    Ok(json!({ "assignments": list }))
}

/// Parents submit for their own child; a teacher may record a submission for any student.
fn assignments_submit(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let student_id = match ctx.principal()? {
        Principal::Parent { student_id, .. } => student_id.clone(),
        Principal::Teacher { .. } => get_required_str(params, "studentId")?,
        Principal::Admin { .. } => {
            return Err(HandlerErr::new("forbidden", "not allowed for role admin"));
        }
    };
    let assignment_id = get_required_str(params, "assignmentId")?;
    let input: SubmissionInput = parse_params(params)?;
    let (submission, outcome) = assignments::submit(ctx.store, &student_id, &assignment_id, input)?;
    Ok(json!({
        "submission": submission,
        "replaced": outcome == Upsert::Replaced
    }))
}

fn assignments_grade(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let teacher_id = ctx.teacher()?;
    let assignment_id = get_required_str(params, "assignmentId")?;
    let student_id = get_required_str(params, "studentId")?;
    let input: GradeInput = parse_params(params)?;
    let submission = assignments::grade(ctx.store, &teacher_id, &assignment_id, &student_id, input)?;
    Ok(json!({ "submission": submission }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "assignments.create" => Some(with_store(state, req, assignments_create)),
        "assignments.list" => Some(with_store(state, req, assignments_list)),
        "assignments.delete" => Some(with_store(state, req, assignments_delete)),
        "assignments.forStudent" => Some(with_store(state, req, assignments_for_student)),
        "assignments.submit" => Some(with_store(state, req, assignments_submit)),
        "assignments.grade" => Some(with_store(state, req, assignments_grade)),
        _ => None,
    }
}
