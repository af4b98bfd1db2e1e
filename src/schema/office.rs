use crate::workflow::ApprovalStatus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Party {
    Admin,
    Teacher,
    Parent,
    Student,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub date: String,
    #[serde(default)]
    pub time: String,
    pub subject: String,
    pub content: String,
    pub sender_id: String,
    pub sender_type: Party,
    #[serde(default)]
    pub sender_name: String,
    pub recipient_id: String,
    pub recipient_type: Party,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub related_student_id: Option<String>,
    #[serde(default)]
    pub related_student_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    /// A class name or "All Classes".
    pub class_name: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub uploaded_by: String,
    #[serde(default)]
    pub upload_date: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LeaveTarget {
    #[default]
    Teacher,
    Student,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveApplication {
    pub id: String,
    #[serde(default)]
    pub target_id: String,
    #[serde(default)]
    pub target_type: LeaveTarget,
    #[serde(default)]
    pub target_name: String,
    #[serde(default)]
    pub class_name: Option<String>,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub leave_days: i64,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub status: ApprovalStatus,
    #[serde(default, alias = "submission_date")]
    pub application_date: String,
    #[serde(default)]
    pub applied_by: String,
    #[serde(default)]
    pub supporting_docs: Vec<String>,
    #[serde(default)]
    pub comments: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub date: String,
    pub amount: f64,
    pub method: String,
    pub receipt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeRecord {
    pub student_id: String,
    #[serde(default)]
    pub student_admission_no: String,
    #[serde(default)]
    pub student_name: String,
    #[serde(rename = "class", default)]
    pub class_name: String,
    #[serde(default)]
    pub amount_due: f64,
    #[serde(default)]
    pub amount_paid: f64,
    #[serde(default)]
    pub last_payment_date: Option<String>,
    #[serde(default)]
    pub payment_history: Vec<Payment>,
}

impl FeeRecord {
    pub fn for_student(student_id: &str, admission_no: &str, name: &str, class_name: &str) -> Self {
        Self {
            student_id: student_id.to_string(),
            student_admission_no: admission_no.to_string(),
            student_name: name.to_string(),
            class_name: class_name.to_string(),
            amount_due: 0.0,
            amount_paid: 0.0,
            last_payment_date: None,
            payment_history: Vec::new(),
        }
    }

    pub fn outstanding(&self) -> f64 {
        (self.amount_due - self.amount_paid).max(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    Event,
    Notice,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub path: String,
    #[serde(rename = "type", default)]
    pub mime: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventNotice {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub target_audience: Vec<String>,
    pub publish_date: String,
    #[serde(default)]
    pub event_date: Option<String>,
    #[serde(default)]
    pub event_time: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub attachment: Option<Attachment>,
}

impl EventNotice {
    /// Date used for newest-first listing.
    pub fn sort_date(&self) -> &str {
        self.event_date.as_deref().unwrap_or(&self.publish_date)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub items: BTreeMap<String, u32>,
    pub total_cost: f64,
    #[serde(default)]
    pub status: ApprovalStatus,
    #[serde(default)]
    pub order_date: String,
}
