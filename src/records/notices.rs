use super::{new_id, non_blank, today, trimmed};
use crate::error::{DomainError, DomainResult};
use crate::schema::classes::is_known_class;
use crate::schema::collections::EventsNotices;
use crate::schema::validate::{parse_date, parse_optional_date, require_fields};
use crate::schema::{Attachment, EntryKind, EventNotice};
use crate::store::DocumentStore;
use serde::Deserialize;

pub const AUDIENCE_GROUPS: [&str; 4] = ["All", "Students", "Teachers", "Parents"];

fn is_audience_tag(tag: &str) -> bool {
    AUDIENCE_GROUPS.contains(&tag) || is_known_class(tag)
}

/// Tags a viewer matches. `None` sees every entry.
#[derive(Debug, Clone)]
pub struct Audience(Option<Vec<String>>);

impl Audience {
    pub fn everyone() -> Self {
        Self(None)
    }

    pub fn teacher(classes: &[String]) -> Self {
        let mut tags = vec!["All".to_string(), "Teachers".to_string()];
        tags.extend(classes.iter().cloned());
        Self(Some(tags))
    }

    pub fn parent(class_name: &str) -> Self {
        Self(Some(vec![
            "All".to_string(),
            "Parents".to_string(),
            "Students".to_string(),
            class_name.to_string(),
        ]))
    }

    fn sees(&self, entry: &EventNotice) -> bool {
        match &self.0 {
            None => true,
            Some(tags) => entry.target_audience.iter().any(|t| tags.contains(t)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoticeInput {
    #[serde(alias = "type")]
    pub kind: EntryKind,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub target_audience: Vec<String>,
    #[serde(default)]
    pub publish_date: Option<String>,
    #[serde(default)]
    pub event_date: Option<String>,
    #[serde(default)]
    pub event_time: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub attachment: Option<Attachment>,
}

pub fn create(store: &mut DocumentStore, input: NoticeInput) -> DomainResult<EventNotice> {
    require_fields(&[("title", &input.title), ("content", &input.content)])?;
    if input.target_audience.is_empty() {
        return Err(DomainError::MissingFields(vec!["target_audience"]));
    }
    if let Some(bad) = input.target_audience.iter().find(|t| !is_audience_tag(t)) {
        return Err(DomainError::invalid(format!("unknown audience '{bad}'")));
    }
    parse_optional_date("publish_date", input.publish_date.as_deref())?;
    let event_date = non_blank(input.event_date.as_deref());
    match (&input.kind, &event_date) {
        (EntryKind::Event, None) => return Err(DomainError::MissingFields(vec!["event_date"])),
        (_, Some(d)) => {
            parse_date("event_date", d)?;
        }
        _ => {}
    }

    let entry = EventNotice {
        id: new_id(),
        kind: input.kind,
        title: trimmed(&input.title),
        content: trimmed(&input.content),
        target_audience: input.target_audience,
        publish_date: non_blank(input.publish_date.as_deref()).unwrap_or_else(today),
        event_date,
        event_time: non_blank(input.event_time.as_deref()),
        location: non_blank(input.location.as_deref()),
        attachment: input.attachment,
    };
    let mut board = store.get::<EventsNotices>()?;
    board.insert(entry.id.clone(), entry.clone());
    store.put::<EventsNotices>(board)?;
    Ok(entry)
}

/// Entries the audience can see, newest event/publish date first.
pub fn list(store: &mut DocumentStore, audience: &Audience, kind: Option<EntryKind>) -> DomainResult<Vec<EventNotice>> {
    let mut out: Vec<EventNotice> = store
        .get::<EventsNotices>()?
        .into_values()
        .filter(|e| audience.sees(e))
        .filter(|e| kind.map_or(true, |k| e.kind == k))
        .collect();
    out.sort_by(|a, b| b.sort_date().cmp(a.sort_date()).then_with(|| a.title.cmp(&b.title)));
    Ok(out)
}

pub fn delete(store: &mut DocumentStore, entry_id: &str) -> DomainResult<EventNotice> {
    let mut board = store.get::<EventsNotices>()?;
    let removed = board
        .remove(entry_id)
        .ok_or_else(|| DomainError::not_found("event or notice", entry_id))?;
    store.put::<EventsNotices>(board)?;
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::testing::workspace;

    fn notice(title: &str, audience: &[&str], event_date: Option<&str>) -> NoticeInput {
        NoticeInput {
            kind: if event_date.is_some() { EntryKind::Event } else { EntryKind::Notice },
            title: title.into(),
            content: "Details".into(),
            target_audience: audience.iter().map(|s| s.to_string()).collect(),
            publish_date: Some("2026-10-01".into()),
            event_date: event_date.map(str::to_string),
            event_time: None,
            location: None,
            attachment: None,
        }
    }

    #[test]
    fn listing_filters_by_audience_and_sorts_newest_first() {
        let (ws, mut store) = workspace("academicd-notices");
        create(&mut store, notice("Sports day", &["All"], Some("2026-11-15"))).unwrap();
        create(&mut store, notice("Staff meeting", &["Teachers"], None)).unwrap();
        create(&mut store, notice("5B trip", &["Grade 5B"], Some("2026-12-01"))).unwrap();

        let parent = list(&mut store, &Audience::parent("Grade 5B"), None).unwrap();
        let titles: Vec<_> = parent.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["5B trip", "Sports day"]);

        let teacher = list(&mut store, &Audience::teacher(&[]), None).unwrap();
        assert_eq!(teacher.len(), 2);
        assert_eq!(list(&mut store, &Audience::everyone(), Some(EntryKind::Event)).unwrap().len(), 2);
        let _ = std::fs::remove_dir_all(ws);
    }

    #[test]
    fn events_need_a_date_and_known_audience() {
        let (ws, mut store) = workspace("academicd-notices-invalid");
        let mut no_date = notice("Fair", &["All"], Some("2026-11-15"));
        no_date.event_date = None;
        assert!(create(&mut store, no_date).is_err());
        assert!(create(&mut store, notice("X", &["Aliens"], None)).is_err());
        assert!(store.get::<EventsNotices>().unwrap().is_empty());
        let _ = std::fs::remove_dir_all(ws);
    }
}
