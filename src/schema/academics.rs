use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Class metadata. Created lazily: a class without a record still exists in the fixed class list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassInfo {
    pub name: String,
    #[serde(default)]
    pub head_teacher_id: Option<String>,
    #[serde(default)]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub academic_year: Option<String>,
}

impl ClassInfo {
    pub fn blank(name: &str) -> Self {
        Self {
            name: name.to_string(),
            head_teacher_id: None,
            capacity: None,
            description: String::new(),
            academic_year: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AttendanceStatus {
    #[default]
    Present,
    Absent,
    Late,
    Excused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SubmissionStatus {
    #[default]
    Submitted,
    Graded,
    #[serde(rename = "Needs Revision")]
    NeedsRevision,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: String,
    pub student_id: String,
    #[serde(default)]
    pub student_name: String,
    #[serde(default)]
    pub submission_date: String,
    #[serde(default)]
    pub submission_time: String,
    #[serde(default)]
    pub submission_text: String,
    #[serde(default)]
    pub submission_file_path: Option<String>,
    #[serde(default)]
    pub status: SubmissionStatus,
    #[serde(default)]
    pub grade: Option<f64>,
    #[serde(default)]
    pub feedback: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub due_date: String,
    pub assigned_class: String,
    pub max_score: u32,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub created_date: String,
    #[serde(default)]
    pub submissions: Vec<Submission>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceEntry {
    pub id: String,
    pub student_id: String,
    #[serde(default)]
    pub student_name: String,
    pub exam_name: String,
    pub subject: String,
    pub marks: f64,
    pub max_marks: f64,
    /// Optional per-component scores, e.g. theory/practical.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub breakdown: BTreeMap<String, f64>,
    #[serde(default)]
    pub date_recorded: String,
}

impl PerformanceEntry {
    pub fn percentage(&self) -> f64 {
        if self.max_marks <= 0.0 {
            return 0.0;
        }
        self.marks / self.max_marks * 100.0
    }
}

pub const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimetableSlot {
    pub day: String,
    pub period: u32,
    pub subject: String,
    pub class_name: String,
}

impl TimetableSlot {
    /// Sort key: Monday first, then period.
    pub fn order_key(&self) -> (usize, u32) {
        let day = WEEKDAYS
            .iter()
            .position(|d| *d == self.day)
            .unwrap_or(WEEKDAYS.len());
        (day, self.period)
    }
}
