use crate::auth::Principal;
use crate::ipc::helpers::{get_required_str, parse_params, with_store, Ctx, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::records::messages::{self, MessageInput, Sender};
use crate::records::{students, teachers};
use crate::schema::Party;
use serde_json::json;

/// The inbox key of the logged-in user: the teacher record, or the child for a parent.
fn mailbox_id(ctx: &Ctx<'_>) -> Result<String, HandlerErr> {
    Ok(match ctx.principal()? {
        Principal::Admin { teacher_id } | Principal::Teacher { teacher_id } => teacher_id.clone(),
        Principal::Parent { student_id, .. } => student_id.clone(),
    })
}

fn sender_of(ctx: &mut Ctx<'_>) -> Result<Sender, HandlerErr> {
    let principal = ctx.principal()?.clone();
    Ok(match principal {
        Principal::Admin { teacher_id } => Sender {
            name: teachers::get(ctx.store, &teacher_id)?.name,
            id: teacher_id,
            party: Party::Admin,
        },
        Principal::Teacher { teacher_id } => Sender {
            name: teachers::get(ctx.store, &teacher_id)?.name,
            id: teacher_id,
            party: Party::Teacher,
        },
        Principal::Parent { student_id, .. } => {
            let student = students::get(ctx.store, &student_id)?;
            let name = if student.parent_name.is_empty() {
                format!("Parent of {}", student.name)
            } else {
                student.parent_name
            };
            Sender {
                id: student_id,
                party: Party::Parent,
                name,
            }
        }
    })
}

fn messages_send(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let input: MessageInput = parse_params(params)?;
    let sender = sender_of(ctx)?;
    let message = messages::send(ctx.store, &sender, input)?;
    Ok(json!({ "message": message }))
}

fn messages_inbox(ctx: &mut Ctx<'_>, _params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let id = mailbox_id(ctx)?;
    let list = messages::inbox(ctx.store, &id)?;
    let unread = list.iter().filter(|m| !m.read).count();
    Ok(json!({ "messages": list, "unread": unread }))
}

fn messages_sent(ctx: &mut Ctx<'_>, _params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let id = mailbox_id(ctx)?;
    let list = messages::sent(ctx.store, &id)?;
    Ok(json!({ "messages": list }))
}

fn messages_mark_read(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let id = mailbox_id(ctx)?;
    let message_id = get_required_str(params, "messageId")?;
    let message = messages::mark_read(ctx.store, &id, &message_id)?;
    Ok(json!({ "message": message }))
}

fn messages_delete(ctx: &mut Ctx<'_>, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let id = mailbox_id(ctx)?;
    let message_id = get_required_str(params, "messageId")?;
    messages::delete(ctx.store, &id, &message_id)?;
    Ok(json!({ "deleted": message_id }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "messages.send" => Some(with_store(state, req, messages_send)),
        "messages.inbox" => Some(with_store(state, req, messages_inbox)),
        "messages.sent" => Some(with_store(state, req, messages_sent)),
        "messages.markRead" => Some(with_store(state, req, messages_mark_read)),
        "messages.delete" => Some(with_store(state, req, messages_delete)),
        _ => None,
    }
}
