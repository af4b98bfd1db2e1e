use crate::auth::Principal;
use crate::ipc::helpers::{get_optional_str, get_required_str, with_store, Ctx, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::records::orders::{self, CATALOG};
use crate::workflow::ApprovalStatus;
use serde_json::json;
use std::collections::BTreeMap;

fn orders_catalog(ctx: &mut Ctx<'_>, _params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    ctx.staff()?;
    let items: Vec<serde_json::Value> = CATALOG
        .iter()
        .map(|(name, price)| json!({ "name": name, "price": price }))
        .collect();
    Ok(json!({ "items": items }))
}

fn orders_place(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let teacher_id = ctx.teacher()?;
    let Some(raw) = params.get("items") else {
        return Err(HandlerErr::bad_params("missing items"));
    };
    let items: BTreeMap<String, u32> = serde_json::from_value(raw.clone())
        .map_err(|e| HandlerErr::bad_params(format!("invalid items: {}", e)))?;
    let order = orders::place(ctx.store, &teacher_id, items)?;
    Ok(json!({ "order": order }))
}

fn orders_list(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let own_id = ctx.staff()?;
    let teacher_filter = match ctx.principal()? {
        Principal::Admin { .. } => get_optional_str(params, "teacherId"),
        _ => Some(own_id),
    };
    let status = match get_optional_str(params, "status") {
        None => None,
        Some(s) => Some(
            ApprovalStatus::parse(&s).ok_or_else(|| HandlerErr::bad_params(format!("unknown status: {}", s)))?,
        ),
    };
    let list = orders::list(ctx.store, teacher_filter.as_deref(), status)?;
    Ok(json!({ "orders": list }))
}

fn orders_review(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    ctx.admin()?;
    let order_id = get_required_str(params, "orderId")?;
    let decision = get_required_str(params, "decision")?;
    let decision = ApprovalStatus::parse(&decision)
        .ok_or_else(|| HandlerErr::bad_params(format!("unknown decision: {}", decision)))?;
    let order = orders::review(ctx.store, &order_id, decision)?;
    Ok(json!({ "order": order }))
}

fn orders_cancel(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let teacher_id = ctx.teacher()?;
    let order_id = get_required_str(params, "orderId")?;
    let order = orders::cancel(ctx.store, &teacher_id, &order_id)?;
    Ok(json!({ "order": order }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "orders.catalog" => Some(with_store(state, req, orders_catalog)),
        "orders.place" => Some(with_store(state, req, orders_place)),
        "orders.list" => Some(with_store(state, req, orders_list)),
        "orders.review" => Some(with_store(state, req, orders_review)),
        "orders.cancel" => Some(with_store(state, req, orders_cancel)),
        _ => None,
    }
}
