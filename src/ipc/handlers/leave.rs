use crate::auth::Principal;
use crate::ipc::helpers::{get_optional_str, get_required_str, parse_params, with_store, Ctx, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::records::leave::{self, Applicant, LeaveFilter, LeaveInput};
use crate::schema::LeaveTarget;
use crate::workflow::ApprovalStatus;
use serde_json::json;

fn applicant(ctx: &Ctx<'_>) -> Result<Applicant, HandlerErr> {
    match ctx.principal()? {
        Principal::Teacher { teacher_id } => Ok(Applicant::Teacher {
            teacher_id: teacher_id.clone(),
        }),
        Principal::Parent { student_id, .. } => Ok(Applicant::Parent {
            student_id: student_id.clone(),
        }),
        Principal::Admin { .. } => Err(HandlerErr::new(
            "forbidden",
            "log in as a teacher to apply for leave",
        )),
    }
}

fn parse_status(params: &serde_json::Value, key: &str) -> Result<Option<ApprovalStatus>, HandlerErr> {
    match get_optional_str(params, key) {
        None => Ok(None),
        Some(s) => ApprovalStatus::parse(&s)
            .map(Some)
            .ok_or_else(|| HandlerErr::bad_params(format!("unknown {}: {}", key, s))),
    }
}

fn leave_apply(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let applicant = applicant(ctx)?;
    let input: LeaveInput = parse_params(params)?;
    let application = leave::apply(ctx.store, &applicant, input)?;
    Ok(json!({ "leave": application }))
}

/// Admins see every application; applicants see only their own.
fn leave_list(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let applicant = match ctx.principal()? {
        Principal::Admin { .. } => None,
        _ => Some(applicant(ctx)?),
    };
    let target_type = match get_optional_str(params, "targetType").as_deref() {
        None => None,
        Some("teacher") => Some(LeaveTarget::Teacher),
        Some("student") => Some(LeaveTarget::Student),
        Some(other) => return Err(HandlerErr::bad_params(format!("unknown targetType: {}", other))),
    };
    let filter = LeaveFilter {
        applicant,
        status: parse_status(params, "status")?,
        target_type,
    };
    let list = leave::list(ctx.store, &filter)?;
    Ok(json!({ "leaves": list }))
}

fn leave_cancel(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let applicant = applicant(ctx)?;
    let leave_id = get_required_str(params, "leaveId")?;
    let application = leave::cancel(ctx.store, &applicant, &leave_id)?;
    Ok(json!({ "leave": application }))
}

fn leave_review(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    ctx.admin()?;
    let leave_id = get_required_str(params, "leaveId")?;
    let Some(decision) = parse_status(params, "decision")? else {
        return Err(HandlerErr::bad_params("missing decision"));
    };
    let comments = get_optional_str(params, "comments");
    let application = leave::review(ctx.store, &leave_id, decision, comments.as_deref())?;
    Ok(json!({ "leave": application }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "leave.apply" => Some(with_store(state, req, leave_apply)),
        "leave.list" => Some(with_store(state, req, leave_list)),
        "leave.cancel" => Some(with_store(state, req, leave_cancel)),
        "leave.review" => Some(with_store(state, req, leave_review)),
        _ => None,
    }
}
