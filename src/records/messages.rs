use super::{new_id, non_blank, now_time, today, trimmed};
use crate::error::{DomainError, DomainResult};
use crate::partition::{delete_where, prune_empty};
use crate::schema::collections::{Messages, Students, Teachers};
use crate::schema::validate::require_fields;
use crate::schema::{Message, Party};
use crate::store::DocumentStore;
use serde::Deserialize;

/// Who is sending, as established by the session.
#[derive(Debug, Clone)]
pub struct Sender {
    pub id: String,
    pub party: Party,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageInput {
    #[serde(default)]
    pub recipient_id: String,
    pub recipient_type: Party,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub related_student_id: Option<String>,
}

/// Resolves the recipient partition key. `admin` with no explicit ID goes to the first admin.
fn resolve_recipient(store: &mut DocumentStore, input: &MessageInput) -> DomainResult<(String, Party)> {
    let id = input.recipient_id.trim();
    match input.recipient_type {
        Party::Admin => {
            let teachers = store.get::<Teachers>()?;
            let admin = if id.is_empty() {
                let mut admins: Vec<_> = teachers.values().filter(|t| t.is_admin).collect();
                admins.sort_by(|a, b| a.join_date.cmp(&b.join_date).then_with(|| a.username.cmp(&b.username)));
                admins.first().map(|t| t.id.clone())
            } else {
                teachers.get(id).filter(|t| t.is_admin).map(|t| t.id.clone())
            };
            admin
                .map(|a| (a, Party::Admin))
                .ok_or_else(|| DomainError::not_found("admin", id))
        }
        Party::Teacher => {
            if store.get::<Teachers>()?.contains_key(id) {
                Ok((id.to_string(), Party::Teacher))
            } else {
                Err(DomainError::not_found("teacher", id))
            }
        }
        // Parents are addressed through their child's record.
        Party::Student | Party::Parent => {
            let exists = store.get::<Students>()?.values().flatten().any(|s| s.id == id);
            if exists {
                Ok((id.to_string(), Party::Student))
            } else {
                Err(DomainError::not_found("student", id))
            }
        }
    }
}

pub fn send(store: &mut DocumentStore, sender: &Sender, input: MessageInput) -> DomainResult<Message> {
    require_fields(&[("subject", &input.subject), ("content", &input.content)])?;
    let (recipient_id, recipient_type) = resolve_recipient(store, &input)?;

    let related_student_id = non_blank(input.related_student_id.as_deref());
    let related_student_name = match &related_student_id {
        Some(id) => store
            .get::<Students>()?
            .into_values()
            .flatten()
            .find(|s| &s.id == id)
            .map(|s| s.name),
        None => None,
    };

    let message = Message {
        id: new_id(),
        date: today(),
        time: now_time(),
        subject: trimmed(&input.subject),
        content: trimmed(&input.content),
        sender_id: sender.id.clone(),
        sender_type: sender.party,
        sender_name: sender.name.clone(),
        recipient_id: recipient_id.clone(),
        recipient_type,
        status: "Sent".to_string(),
        read: false,
        related_student_id,
        related_student_name,
    };
    let mut inboxes = store.get::<Messages>()?;
    inboxes.entry(recipient_id).or_default().push(message.clone());
    store.put::<Messages>(inboxes)?;
    Ok(message)
}

fn newest_first(messages: &mut [Message]) {
    messages.sort_by(|a, b| (&b.date, &b.time).cmp(&(&a.date, &a.time)));
}

pub fn inbox(store: &mut DocumentStore, recipient_id: &str) -> DomainResult<Vec<Message>> {
    let mut out = store.get::<Messages>()?.remove(recipient_id).unwrap_or_default();
    newest_first(&mut out);
    Ok(out)
}

pub fn sent(store: &mut DocumentStore, sender_id: &str) -> DomainResult<Vec<Message>> {
    let mut out: Vec<Message> = store
        .get::<Messages>()?
        .into_values()
        .flatten()
        .filter(|m| m.sender_id == sender_id)
        .collect();
    newest_first(&mut out);
    Ok(out)
}

pub fn mark_read(store: &mut DocumentStore, recipient_id: &str, message_id: &str) -> DomainResult<Message> {
    let mut inboxes = store.get::<Messages>()?;
    let message = inboxes
        .get_mut(recipient_id)
        .and_then(|l| l.iter_mut().find(|m| m.id == message_id))
        .ok_or_else(|| DomainError::not_found("message", message_id))?;
    message.read = true;
    message.status = "Read".to_string();
    let updated = message.clone();
    store.put::<Messages>(inboxes)?;
    Ok(updated)
}

/// Deletes a message from the recipient's inbox.
pub fn delete(store: &mut DocumentStore, recipient_id: &str, message_id: &str) -> DomainResult<()> {
    let mut inboxes = store.get::<Messages>()?;
    let removed = inboxes
        .get_mut(recipient_id)
        .map_or(0, |l| delete_where(l, |m| m.id == message_id));
    if removed == 0 {
        return Err(DomainError::not_found("message", message_id));
    }
    prune_empty(&mut inboxes);
    store.put::<Messages>(inboxes)?;
    Ok(())
}
