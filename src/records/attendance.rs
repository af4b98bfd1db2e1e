use crate::error::{DomainError, DomainResult};
use crate::schema::collections::{Attendance, AttendanceSheet, Students, Teachers};
use crate::schema::validate::{check_class, parse_date};
use crate::schema::AttendanceStatus;
use crate::store::DocumentStore;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterMark {
    pub student_id: String,
    pub admission_no: String,
    pub name: String,
    pub roll_no: String,
    pub status: AttendanceStatus,
    /// False when the status is the default rather than a saved mark.
    pub saved: bool,
}

/// The class roster with each student's saved status, or `Present` for students not yet marked.
pub fn open(
    store: &mut DocumentStore,
    teacher_id: &str,
    date: &str,
    class_name: &str,
) -> DomainResult<Vec<RosterMark>> {
    check_class(class_name)?;
    parse_date("date", date)?;
    let book = store.get::<Attendance>()?;
    let sheet = book
        .get(teacher_id)
        .and_then(|by_date| by_date.get(date))
        .and_then(|by_class| by_class.get(class_name));
    let roster = store.get::<Students>()?.remove(class_name).unwrap_or_default();
    Ok(roster
        .into_iter()
        .map(|s| {
            let saved = sheet.and_then(|m| m.get(&s.id)).copied();
            RosterMark {
                status: saved.unwrap_or_default(),
                saved: saved.is_some(),
                student_id: s.id,
                admission_no: s.admission_no,
                name: s.name,
                roll_no: s.roll_no,
            }
        })
        .collect())
}

/// Replaces the whole sheet for (teacher, date, class). Students left out of `marks` are dropped
/// from the saved sheet.
pub fn save(
    store: &mut DocumentStore,
    teacher_id: &str,
    date: &str,
    class_name: &str,
    marks: AttendanceSheet,
) -> DomainResult<usize> {
    check_class(class_name)?;
    parse_date("date", date)?;
    let students = store.get::<Students>()?;
    let roster = students.get(class_name);
    let unknown: Vec<&String> = marks
        .keys()
        .filter(|id| !roster.is_some_and(|r| r.iter().any(|s| &s.id == *id)))
        .collect();
    if !unknown.is_empty() {
        return Err(DomainError::invalid(format!(
            "students not in {class_name}: {}",
            unknown.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")
        )));
    }

    let count = marks.len();
    let mut book = store.get::<Attendance>()?;
    book.entry(teacher_id.to_string())
        .or_default()
        .entry(date.to_string())
        .or_default()
        .insert(class_name.to_string(), marks);
    store.put::<Attendance>(book)?;
    Ok(count)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub date: String,
    pub class_name: String,
    pub status: AttendanceStatus,
    pub teacher_id: String,
    pub teacher_name: String,
}

/// Every saved mark for one student across all teachers, newest first.
pub fn student_history(store: &mut DocumentStore, student_id: &str) -> DomainResult<Vec<HistoryEntry>> {
    let teachers = store.get::<Teachers>()?;
    let book = store.get::<Attendance>()?;
    let mut out = Vec::new();
    for (teacher_id, by_date) in &book {
        let teacher_name = teachers
            .get(teacher_id)
            .map(|t| t.name.clone())
            .unwrap_or_else(|| "Unknown".to_string());
        for (date, by_class) in by_date {
            for (class_name, sheet) in by_class {
                if let Some(status) = sheet.get(student_id) {
                    out.push(HistoryEntry {
                        date: date.clone(),
                        class_name: class_name.clone(),
                        status: *status,
                        teacher_id: teacher_id.clone(),
                        teacher_name: teacher_name.clone(),
                    });
                }
            }
        }
    }
    out.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.class_name.cmp(&b.class_name)));
    Ok(out)
}

/// Count of each status in a student's history.
pub fn summarize(history: &[HistoryEntry]) -> BTreeMap<String, usize> {
    let mut out = BTreeMap::new();
    for h in history {
        *out.entry(format!("{:?}", h.status)).or_insert(0) += 1;
    }
    out
}
