use super::{new_id, non_blank, today, trimmed};
use crate::error::{DomainError, DomainResult};
use crate::partition::{delete_where, prune_empty};
use crate::schema::classes::ALL_CLASSES_TAG;
use crate::schema::collections::{Resources, Teachers};
use crate::schema::validate::{check_class, require_fields};
use crate::schema::Resource;
use crate::store::DocumentStore;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResourceInput {
    pub title: String,
    pub description: String,
    #[serde(alias = "type")]
    pub kind: String,
    pub class_name: String,
    pub subject: Option<String>,
    pub file_name: String,
    pub file_path: Option<String>,
    pub tags: Vec<String>,
}

pub fn add(store: &mut DocumentStore, teacher_id: &str, input: ResourceInput) -> DomainResult<Resource> {
    require_fields(&[("title", &input.title), ("class_name", &input.class_name)])?;
    if input.class_name != ALL_CLASSES_TAG {
        check_class(&input.class_name)?;
    }
    let uploaded_by = store
        .get::<Teachers>()?
        .get(teacher_id)
        .map(|t| t.name.clone())
        .ok_or_else(|| DomainError::not_found("teacher", teacher_id))?;

    let resource = Resource {
        id: new_id(),
        title: trimmed(&input.title),
        description: trimmed(&input.description),
        kind: non_blank(Some(input.kind.as_str())).unwrap_or_else(|| "Document".to_string()),
        class_name: input.class_name,
        subject: non_blank(input.subject.as_deref()),
        file_name: trimmed(&input.file_name),
        file_path: non_blank(input.file_path.as_deref()),
        tags: input
            .tags
            .iter()
            .filter_map(|t| non_blank(Some(t.as_str())))
            .collect(),
        uploaded_by,
        upload_date: today(),
    };
    let mut all = store.get::<Resources>()?;
    all.entry(teacher_id.to_string())
        .or_default()
        .push(resource.clone());
    store.put::<Resources>(all)?;
    Ok(resource)
}

pub fn list(store: &mut DocumentStore, teacher_id: &str) -> DomainResult<Vec<Resource>> {
    let mut out = store.get::<Resources>()?.remove(teacher_id).unwrap_or_default();
    out.sort_by(|a, b| b.upload_date.cmp(&a.upload_date));
    Ok(out)
}

/// Resources shared with one class, including those tagged for all classes.
pub fn for_class(store: &mut DocumentStore, class_name: &str) -> DomainResult<Vec<Resource>> {
    check_class(class_name)?;
    let mut out: Vec<Resource> = store
        .get::<Resources>()?
        .into_values()
        .flatten()
        .filter(|r| r.class_name == class_name || r.class_name == ALL_CLASSES_TAG)
        .collect();
    out.sort_by(|a, b| b.upload_date.cmp(&a.upload_date).then_with(|| a.title.cmp(&b.title)));
    Ok(out)
}

pub fn delete(store: &mut DocumentStore, teacher_id: &str, resource_id: &str) -> DomainResult<()> {
    let mut all = store.get::<Resources>()?;
    let removed = all
        .get_mut(teacher_id)
        .map_or(0, |l| delete_where(l, |r| r.id == resource_id));
    if removed == 0 {
        return Err(DomainError::not_found("resource", resource_id));
    }
    prune_empty(&mut all);
    store.put::<Resources>(all)?;
    Ok(())
}
