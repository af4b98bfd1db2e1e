use crate::auth::Principal;
use crate::ipc::helpers::{get_required_str, parse_params, with_store, Ctx, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::records::resources::{self, ResourceInput};
use serde_json::json;

fn resources_add(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let teacher_id = ctx.teacher()?;
    let input: ResourceInput = parse_params(params)?;
    let resource = resources::add(ctx.store, &teacher_id, input)?;
    Ok(json!({ "resource": resource }))
}

fn resources_list(ctx: &mut Ctx<'_>, _params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let teacher_id = ctx.teacher()?;
    let list = resources::list(ctx.store, &teacher_id)?;
    Ok(json!({ "resources": list }))
}

fn resources_for_class(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let class_name = match ctx.principal()? {
        Principal::Parent { class_name, .. } => class_name.clone(),
        _ => get_required_str(params, "className")?,
    };
    let list = resources::for_class(ctx.store, &class_name)?;
    Ok(json!({ "className": class_name, "resources": list }))
}

fn resources_delete(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let teacher_id = ctx.teacher()?;
    let resource_id = get_required_str(params, "resourceId")?;
    resources::delete(ctx.store, &teacher_id, &resource_id)?;
    Ok(json!({ "deleted": resource_id }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "resources.add" => Some(with_store(state, req, resources_add)),
        "resources.list" => Some(with_store(state, req, resources_list)),
        "resources.forClass" => Some(with_store(state, req, resources_for_class)),
        "resources.delete" => Some(with_store(state, req, resources_delete)),
        _ => None,
    }
}
