use super::{new_id, non_blank, today, trimmed};
use crate::error::{DomainError, DomainResult};
use crate::partition::upsert_by;
use crate::schema::collections::{Performance, Students};
use crate::schema::validate::{check_class, parse_optional_date, require_fields};
use crate::schema::PerformanceEntry;
use crate::store::DocumentStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScoreInput {
    pub student_id: String,
    pub marks: Option<f64>,
    pub breakdown: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExamInput {
    pub class_name: String,
    pub exam_name: String,
    pub subject: String,
    pub max_marks: f64,
    pub date: Option<String>,
    pub scores: Vec<ScoreInput>,
}

/// Records one exam for a class. Re-recording the same (student, exam, subject) replaces the
/// earlier entry.
pub fn record(store: &mut DocumentStore, teacher_id: &str, input: ExamInput) -> DomainResult<usize> {
    require_fields(&[
        ("class_name", &input.class_name),
        ("exam_name", &input.exam_name),
        ("subject", &input.subject),
    ])?;
    check_class(&input.class_name)?;
    parse_optional_date("date", input.date.as_deref())?;
    if input.max_marks <= 0.0 {
        return Err(DomainError::invalid("max_marks must be greater than zero"));
    }
    if input.scores.is_empty() {
        return Err(DomainError::invalid("no scores to record"));
    }

    let roster = store.get::<Students>()?.remove(&input.class_name).unwrap_or_default();
    let mut entries = Vec::with_capacity(input.scores.len());
    for score in &input.scores {
        let student = roster
            .iter()
            .find(|s| s.id == score.student_id)
            .ok_or_else(|| DomainError::invalid(format!("student {} is not in {}", score.student_id, input.class_name)))?;
        let Some(marks) = score.marks else {
            return Err(DomainError::MissingFields(vec!["marks"]));
        };
        if !(0.0..=input.max_marks).contains(&marks) {
            return Err(DomainError::invalid(format!(
                "marks for {} must be between 0 and {}",
                student.name, input.max_marks
            )));
        }
        entries.push(PerformanceEntry {
            id: new_id(),
            student_id: student.id.clone(),
            student_name: student.name.clone(),
            exam_name: trimmed(&input.exam_name),
            subject: trimmed(&input.subject),
            marks,
            max_marks: input.max_marks,
            breakdown: score.breakdown.clone(),
            date_recorded: non_blank(input.date.as_deref()).unwrap_or_else(today),
        });
    }

    let count = entries.len();
    let mut book = store.get::<Performance>()?;
    let list = book
        .entry(teacher_id.to_string())
        .or_default()
        .entry(input.class_name.clone())
        .or_default();
    for entry in entries {
        upsert_by(
            list,
            |e| (e.student_id.clone(), e.exam_name.clone(), e.subject.clone()),
            entry,
        );
    }
    store.put::<Performance>(book)?;
    Ok(count)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSummary {
    pub student_id: String,
    pub student_name: String,
    pub entries: usize,
    pub total_marks: f64,
    pub total_max_marks: f64,
    pub percentage: f64,
}

fn summarize<'a>(entries: impl Iterator<Item = &'a PerformanceEntry>) -> Vec<StudentSummary> {
    let mut by_student: BTreeMap<String, StudentSummary> = BTreeMap::new();
    for e in entries {
        let s = by_student
            .entry(e.student_id.clone())
            .or_insert_with(|| StudentSummary {
                student_id: e.student_id.clone(),
                student_name: e.student_name.clone(),
                entries: 0,
                total_marks: 0.0,
                total_max_marks: 0.0,
                percentage: 0.0,
            });
        s.entries += 1;
        s.total_marks += e.marks;
        s.total_max_marks += e.max_marks;
    }
    let mut out: Vec<StudentSummary> = by_student
        .into_values()
        .map(|mut s| {
            if s.total_max_marks > 0.0 {
                s.percentage = s.total_marks / s.total_max_marks * 100.0;
            }
            s
        })
        .collect();
    out.sort_by(|a, b| b.percentage.total_cmp(&a.percentage).then_with(|| a.student_name.cmp(&b.student_name)));
    out
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassReport {
    pub class_name: String,
    pub exam_name: Option<String>,
    pub students: Vec<StudentSummary>,
    pub class_average: f64,
}

/// Per-student percentages for a class across all teachers, optionally narrowed to one exam.
pub fn class_report(store: &mut DocumentStore, class_name: &str, exam_name: Option<&str>) -> DomainResult<ClassReport> {
    check_class(class_name)?;
    let book = store.get::<Performance>()?;
    let entries = book
        .values()
        .filter_map(|by_class| by_class.get(class_name))
        .flatten()
        .filter(|e| exam_name.map_or(true, |x| e.exam_name == x));
    let students = summarize(entries);
    let class_average = if students.is_empty() {
        0.0
    } else {
        students.iter().map(|s| s.percentage).sum::<f64>() / students.len() as f64
    };
    Ok(ClassReport {
        class_name: class_name.to_string(),
        exam_name: exam_name.map(str::to_string),
        students,
        class_average,
    })
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentReport {
    pub student_id: String,
    pub entries: Vec<PerformanceEntry>,
    pub percentage: f64,
}

/// Every entry for one student, newest first, with the overall percentage.
pub fn student_report(store: &mut DocumentStore, student_id: &str) -> DomainResult<StudentReport> {
    let book = store.get::<Performance>()?;
    let mut entries: Vec<PerformanceEntry> = book
        .into_values()
        .flat_map(|by_class| by_class.into_values().flatten())
        .filter(|e| e.student_id == student_id)
        .collect();
    entries.sort_by(|a, b| {
        b.date_recorded
            .cmp(&a.date_recorded)
            .then_with(|| a.subject.cmp(&b.subject))
    });
    let percentage = summarize(entries.iter())
        .first()
        .map_or(0.0, |s| s.percentage);
    Ok(StudentReport {
        student_id: student_id.to_string(),
        entries,
        percentage,
    })
}
