use crate::auth::Principal;
use crate::ipc::helpers::{get_required_str, parse_params, with_store, Ctx, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::records::fees::{self, PaymentInput};
use serde_json::json;

/// Fee records are for the office and the student's own parent; teachers have no access.
fn fee_access(ctx: &Ctx<'_>, params: &serde_json::Value) -> Result<(String, bool), HandlerErr> {
    match ctx.principal()? {
        Principal::Admin { .. } => Ok((get_required_str(params, "studentId")?, false)),
        Principal::Parent { student_id, .. } => Ok((student_id.clone(), true)),
        Principal::Teacher { .. } => Err(HandlerErr::new("forbidden", "not allowed for role teacher")),
    }
}

fn fees_get(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let (student_id, _) = fee_access(ctx, params)?;
    let record = fees::get(ctx.store, &student_id)?;
    let outstanding = record.outstanding();
    Ok(json!({ "fee": record, "outstanding": outstanding }))
}

fn fees_list(ctx: &mut Ctx<'_>, _params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    ctx.admin()?;
    let list = fees::list(ctx.store)?;
    Ok(json!({ "fees": list }))
}

fn fees_set_due(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    ctx.admin()?;
    let student_id = get_required_str(params, "studentId")?;
    let amount_due = params
        .get("amountDue")
        .and_then(|v| v.as_f64())
        .ok_or_else(|| HandlerErr::bad_params("missing amountDue"))?;
    let record = fees::set_due(ctx.store, &student_id, amount_due)?;
    Ok(json!({ "fee": record }))
}

/// Parents may not pay more than the outstanding balance.
fn fees_record_payment(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let (student_id, capped) = fee_access(ctx, params)?;
    let input: PaymentInput = parse_params(params)?;
    let record = fees::record_payment(ctx.store, &student_id, input, capped)?;
    let outstanding = record.outstanding();
    Ok(json!({ "fee": record, "outstanding": outstanding }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "fees.get" => Some(with_store(state, req, fees_get)),
        "fees.list" => Some(with_store(state, req, fees_list)),
        "fees.setDue" => Some(with_store(state, req, fees_set_due)),
        "fees.recordPayment" => Some(with_store(state, req, fees_record_payment)),
        _ => None,
    }
}
