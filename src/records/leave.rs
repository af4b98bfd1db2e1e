use super::{new_id, today, trimmed};
use crate::error::{DomainError, DomainResult};
use crate::schema::collections::{LeaveApplications, Students, Teachers};
use crate::schema::validate::{check_date_range, require_fields};
use crate::schema::{LeaveApplication, LeaveTarget};
use crate::store::DocumentStore;
use crate::workflow::{Actor, ApprovalStatus};
use serde::Deserialize;
use tracing::info;

/// Partition holding every parent-initiated (student) leave application.
pub const STUDENT_LEAVES_BUCKET: &str = "student_leaves";

#[derive(Debug, Clone)]
pub enum Applicant {
    Teacher { teacher_id: String },
    Parent { student_id: String },
}

impl Applicant {
    fn partition(&self) -> &str {
        match self {
            Self::Teacher { teacher_id } => teacher_id,
            Self::Parent { .. } => STUDENT_LEAVES_BUCKET,
        }
    }

    fn owns(&self, leave: &LeaveApplication) -> bool {
        match self {
            Self::Teacher { teacher_id } => &leave.target_id == teacher_id,
            Self::Parent { student_id } => &leave.target_id == student_id,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LeaveInput {
    #[serde(alias = "type")]
    pub kind: String,
    pub start_date: String,
    pub end_date: String,
    pub reason: String,
    pub supporting_docs: Vec<String>,
}

pub fn apply(store: &mut DocumentStore, applicant: &Applicant, input: LeaveInput) -> DomainResult<LeaveApplication> {
    require_fields(&[
        ("type", &input.kind),
        ("start_date", &input.start_date),
        ("end_date", &input.end_date),
        ("reason", &input.reason),
    ])?;
    let leave_days = check_date_range(&input.start_date, &input.end_date)?;

    let (target_id, target_type, target_name, class_name, applied_by) = match applicant {
        Applicant::Teacher { teacher_id } => {
            let teacher = store
                .get::<Teachers>()?
                .remove(teacher_id)
                .ok_or_else(|| DomainError::not_found("teacher", teacher_id.as_str()))?;
            (teacher.id, LeaveTarget::Teacher, teacher.name.clone(), None, teacher.name)
        }
        Applicant::Parent { student_id } => {
            let student = store
                .get::<Students>()?
                .into_values()
                .flatten()
                .find(|s| &s.id == student_id)
                .ok_or_else(|| DomainError::not_found("student", student_id.as_str()))?;
            (
                student.id,
                LeaveTarget::Student,
                student.name,
                Some(student.class_name),
                student.parent_name,
            )
        }
    };

    let leave = LeaveApplication {
        id: new_id(),
        target_id,
        target_type,
        target_name,
        class_name,
        start_date: trimmed(&input.start_date),
        end_date: trimmed(&input.end_date),
        leave_days,
        kind: trimmed(&input.kind),
        reason: trimmed(&input.reason),
        status: ApprovalStatus::Pending,
        application_date: today(),
        applied_by,
        supporting_docs: input.supporting_docs,
        comments: String::new(),
    };
    let mut book = store.get::<LeaveApplications>()?;
    book.entry(applicant.partition().to_string())
        .or_default()
        .push(leave.clone());
    store.put::<LeaveApplications>(book)?;
    info!(target = %leave.target_name, days = leave.leave_days, "leave applied");
    Ok(leave)
}

#[derive(Debug, Clone, Default)]
pub struct LeaveFilter {
    pub applicant: Option<Applicant>,
    pub status: Option<ApprovalStatus>,
    pub target_type: Option<LeaveTarget>,
}

/// Applications visible under the filter, newest application first.
pub fn list(store: &mut DocumentStore, filter: &LeaveFilter) -> DomainResult<Vec<LeaveApplication>> {
    let book = store.get::<LeaveApplications>()?;
    let mut out: Vec<LeaveApplication> = book
        .into_iter()
        .filter(|(key, _)| filter.applicant.as_ref().map_or(true, |a| a.partition() == key))
        .flat_map(|(_, list)| list)
        .filter(|l| filter.applicant.as_ref().map_or(true, |a| a.owns(l)))
        .filter(|l| filter.status.map_or(true, |s| l.status == s))
        .filter(|l| filter.target_type.map_or(true, |t| l.target_type == t))
        .collect();
    out.sort_by(|a, b| {
        b.application_date
            .cmp(&a.application_date)
            .then_with(|| b.start_date.cmp(&a.start_date))
    });
    Ok(out)
}

fn change_status(
    store: &mut DocumentStore,
    leave_id: &str,
    to: ApprovalStatus,
    actor: Actor,
    applicant: Option<&Applicant>,
    comments: Option<&str>,
) -> DomainResult<LeaveApplication> {
    let mut book = store.get::<LeaveApplications>()?;
    let leave = book
        .iter_mut()
        .filter(|(key, _)| applicant.map_or(true, |a| a.partition() == key.as_str()))
        .flat_map(|(_, list)| list.iter_mut())
        .find(|l| l.id == leave_id && applicant.map_or(true, |a| a.owns(l)))
        .ok_or_else(|| DomainError::not_found("leave application", leave_id))?;
    leave.status = leave.status.transition(to, actor)?;
    if let Some(c) = comments {
        leave.comments = trimmed(c);
    }
    let updated = leave.clone();
    store.put::<LeaveApplications>(book)?;
    Ok(updated)
}

/// Applicant withdraws a pending application.
pub fn cancel(store: &mut DocumentStore, applicant: &Applicant, leave_id: &str) -> DomainResult<LeaveApplication> {
    change_status(store, leave_id, ApprovalStatus::Canceled, Actor::Submitter, Some(applicant), None)
}

/// Approves or rejects a pending application.
pub fn review(
    store: &mut DocumentStore,
    leave_id: &str,
    decision: ApprovalStatus,
    comments: Option<&str>,
) -> DomainResult<LeaveApplication> {
    change_status(store, leave_id, decision, Actor::Reviewer, None, comments)
}
