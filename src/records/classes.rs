use super::non_blank;
use crate::error::{DomainError, DomainResult};
use crate::schema::classes::full_class_list;
use crate::schema::collections::{Classes, Students, Teachers};
use crate::schema::validate::check_class;
use crate::schema::{ClassInfo, Student};
use crate::store::DocumentStore;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSummary {
    pub name: String,
    pub student_count: usize,
    pub head_teacher_id: Option<String>,
    pub capacity: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDetail {
    pub info: ClassInfo,
    pub students: Vec<Student>,
    pub teacher_ids: Vec<String>,
}

/// Every class on the fixed list, in display order.
pub fn list(store: &mut DocumentStore) -> DomainResult<Vec<ClassSummary>> {
    let classes = store.get::<Classes>()?;
    let students = store.get::<Students>()?;
    Ok(full_class_list()
        .into_iter()
        .map(|name| {
            let info = classes.get(&name);
            ClassSummary {
                student_count: students.get(&name).map_or(0, Vec::len),
                head_teacher_id: info.and_then(|i| i.head_teacher_id.clone()),
                capacity: info.and_then(|i| i.capacity),
                name,
            }
        })
        .collect())
}

pub fn get(store: &mut DocumentStore, name: &str) -> DomainResult<ClassDetail> {
    check_class(name)?;
    let info = store
        .get::<Classes>()?
        .remove(name)
        .unwrap_or_else(|| ClassInfo::blank(name));
    let students = store
        .get::<Students>()?
        .remove(name)
        .unwrap_or_default()
        .iter()
        .map(Student::redacted)
        .collect();
    let teacher_ids = store
        .get::<Teachers>()?
        .into_values()
        .filter(|t| t.classes.iter().any(|c| c == name))
        .map(|t| t.id)
        .collect();
    Ok(ClassDetail {
        info,
        students,
        teacher_ids,
    })
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClassInput {
    pub name: String,
    pub head_teacher_id: Option<String>,
    pub capacity: Option<u32>,
    pub description: String,
    pub academic_year: Option<String>,
}

pub fn upsert(store: &mut DocumentStore, input: ClassInput) -> DomainResult<ClassInfo> {
    check_class(&input.name)?;
    let head_teacher_id = non_blank(input.head_teacher_id.as_deref());
    if let Some(id) = &head_teacher_id {
        if !store.get::<Teachers>()?.contains_key(id) {
            return Err(DomainError::not_found("teacher", id.clone()));
        }
    }
    if let (Some(cap), Some(roster)) = (input.capacity, store.get::<Students>()?.get(&input.name)) {
        if (cap as usize) < roster.len() {
            return Err(DomainError::invalid(format!(
                "capacity {cap} is below the current roster of {}",
                roster.len()
            )));
        }
    }

    let info = ClassInfo {
        name: input.name.clone(),
        head_teacher_id,
        capacity: input.capacity,
        description: input.description.trim().to_string(),
        academic_year: non_blank(input.academic_year.as_deref()),
    };
    let mut classes = store.get::<Classes>()?;
    classes.insert(input.name, info.clone());
    store.put::<Classes>(classes)?;
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::testing::workspace;

    #[test]
    fn list_covers_every_class_even_without_records() {
        let (ws, mut store) = workspace("academicd-classes-list");
        let all = list(&mut store).unwrap();
        assert_eq!(all.len(), 43);
        assert!(all.iter().all(|c| c.student_count == 0));
        let _ = std::fs::remove_dir_all(ws);
    }

    #[test]
    fn upsert_checks_class_and_head_teacher() {
        let (ws, mut store) = workspace("academicd-classes-upsert");
        let bad_class = ClassInput {
            name: "Grade 12A".into(),
            ..Default::default()
        };
        assert_eq!(upsert(&mut store, bad_class).unwrap_err().code(), "validation_failed");
        let ghost = ClassInput {
            name: "Grade 1A".into(),
            head_teacher_id: Some("ghost".into()),
            ..Default::default()
        };
        assert_eq!(upsert(&mut store, ghost).unwrap_err().code(), "not_found");

        let ok = ClassInput {
            name: "Grade 1A".into(),
            capacity: Some(30),
            description: "Morning batch".into(),
            ..Default::default()
        };
        upsert(&mut store, ok).unwrap();
        let detail = get(&mut store, "Grade 1A").unwrap();
        assert_eq!(detail.info.capacity, Some(30));
        assert_eq!(detail.info.description, "Morning batch");
        let _ = std::fs::remove_dir_all(ws);
    }
}
