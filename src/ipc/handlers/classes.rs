use crate::ipc::helpers::{get_required_str, parse_params, with_store, Ctx, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::records::classes::{self, ClassInput};
use serde_json::json;

fn classes_list(ctx: &mut Ctx<'_>, _params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    ctx.staff()?;
    let list = classes::list(ctx.store)?;
    Ok(json!({ "classes": list }))
}

fn classes_get(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    ctx.staff()?;
    let class_name = get_required_str(params, "className")?;
    let detail = classes::get(ctx.store, &class_name)?;
    Ok(json!({ "class": detail }))
}

fn classes_upsert(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    ctx.staff()?;
    let input: ClassInput = parse_params(params)?;
    let info = classes::upsert(ctx.store, input)?;
    Ok(json!({ "class": info }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "classes.list" => Some(with_store(state, req, classes_list)),
        "classes.get" => Some(with_store(state, req, classes_get)),
        "classes.upsert" => Some(with_store(state, req, classes_upsert)),
        _ => None,
    }
}
