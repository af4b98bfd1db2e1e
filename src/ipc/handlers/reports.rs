use crate::ipc::helpers::{with_store, Ctx, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::records::reports;
use serde_json::json;

fn reports_overview(ctx: &mut Ctx<'_>, _params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    ctx.admin()?;
    let overview = reports::overview(ctx.store)?;
    Ok(json!({ "overview": overview }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "reports.overview" => Some(with_store(state, req, reports_overview)),
        _ => None,
    }
}
