use super::{non_blank, trimmed};
use crate::auth::hash_password;
use crate::error::{DomainError, DomainResult};
use crate::schema::collections::{
    Assignments, Attendance, Classes, LeaveApplications, Messages, Orders, Performance, Resources,
    Teachers, Timetable,
};
use crate::schema::validate::{check_class, check_unique_username, parse_optional_date, require_fields};
use crate::schema::Teacher;
use crate::store::{Collection, DocumentStore};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::info;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TeacherInput {
    pub username: String,
    /// Required on create; blank on update keeps the current password.
    pub password: String,
    pub name: String,
    pub subject: String,
    pub email: String,
    pub phone: String,
    pub join_date: Option<String>,
    pub designation: String,
    pub resignation_date: Option<String>,
    pub epf_number: String,
    pub esi_number: String,
    pub payroll: f64,
    pub is_admin: bool,
    pub classes: Vec<String>,
}

impl TeacherInput {
    fn validate(&self, creating: bool) -> DomainResult<()> {
        let mut fields = vec![
            ("username", self.username.as_str()),
            ("name", self.name.as_str()),
            ("subject", self.subject.as_str()),
        ];
        if creating {
            fields.push(("password", self.password.as_str()));
        }
        require_fields(&fields)?;
        parse_optional_date("join_date", self.join_date.as_deref())?;
        parse_optional_date("resignation_date", self.resignation_date.as_deref())?;
        for c in &self.classes {
            check_class(c)?;
        }
        if self.payroll < 0.0 {
            return Err(DomainError::invalid("payroll cannot be negative"));
        }
        Ok(())
    }

    fn apply(self, teacher: &mut Teacher) {
        teacher.username = trimmed(&self.username);
        if !self.password.is_empty() {
            teacher.password = hash_password(&self.password);
        }
        teacher.name = trimmed(&self.name);
        teacher.subject = trimmed(&self.subject);
        teacher.email = trimmed(&self.email);
        teacher.phone = trimmed(&self.phone);
        if let Some(d) = non_blank(self.join_date.as_deref()) {
            teacher.join_date = d;
        }
        teacher.designation = trimmed(&self.designation);
        teacher.resignation_date = non_blank(self.resignation_date.as_deref());
        teacher.epf_number = trimmed(&self.epf_number);
        teacher.esi_number = trimmed(&self.esi_number);
        teacher.payroll = self.payroll;
        teacher.is_admin = self.is_admin;
        teacher.classes = self.classes;
    }
}

pub fn list(store: &mut DocumentStore) -> DomainResult<Vec<Teacher>> {
    let mut out: Vec<Teacher> = store.get::<Teachers>()?.into_values().collect();
    out.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(out)
}

pub fn get(store: &mut DocumentStore, teacher_id: &str) -> DomainResult<Teacher> {
    store
        .get::<Teachers>()?
        .remove(teacher_id)
        .ok_or_else(|| DomainError::not_found("teacher", teacher_id))
}

pub fn create(store: &mut DocumentStore, input: TeacherInput) -> DomainResult<Teacher> {
    input.validate(true)?;
    let mut teachers = store.get::<Teachers>()?;
    check_unique_username(&teachers, input.username.trim(), None)?;

    let mut teacher = Teacher {
        id: super::new_id(),
        username: String::new(),
        password: String::new(),
        name: String::new(),
        subject: String::new(),
        email: String::new(),
        phone: String::new(),
        join_date: super::today(),
        designation: String::new(),
        resignation_date: None,
        epf_number: String::new(),
        esi_number: String::new(),
        payroll: 0.0,
        is_admin: false,
        classes: Vec::new(),
    };
    input.apply(&mut teacher);
    teachers.insert(teacher.id.clone(), teacher.clone());
    store.put::<Teachers>(teachers)?;
    info!(username = %teacher.username, "teacher created");
    Ok(teacher)
}

pub fn update(store: &mut DocumentStore, teacher_id: &str, input: TeacherInput) -> DomainResult<Teacher> {
    input.validate(false)?;
    let mut teachers = store.get::<Teachers>()?;
    check_unique_username(&teachers, input.username.trim(), Some(teacher_id))?;
    let demoting_last_admin = !input.is_admin && is_last_admin(&teachers, teacher_id);
    if demoting_last_admin {
        return Err(DomainError::invalid("at least one admin must remain"));
    }
    let teacher = teachers
        .get_mut(teacher_id)
        .ok_or_else(|| DomainError::not_found("teacher", teacher_id))?;
    input.apply(teacher);
    let updated = teacher.clone();
    store.put::<Teachers>(teachers)?;
    Ok(updated)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfileInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

/// Self-service edit of contact details and password.
pub fn update_profile(store: &mut DocumentStore, teacher_id: &str, input: ProfileInput) -> DomainResult<Teacher> {
    let mut teachers = store.get::<Teachers>()?;
    let teacher = teachers
        .get_mut(teacher_id)
        .ok_or_else(|| DomainError::not_found("teacher", teacher_id))?;

    if let Some(new_password) = non_blank(input.new_password.as_deref()) {
        let current = input.current_password.as_deref().unwrap_or_default();
        if hash_password(current) != teacher.password {
            return Err(DomainError::invalid("current password is incorrect"));
        }
        teacher.password = hash_password(&new_password);
    }
    if let Some(name) = non_blank(input.name.as_deref()) {
        teacher.name = name;
    }
    if let Some(email) = input.email {
        teacher.email = trimmed(&email);
    }
    if let Some(phone) = input.phone {
        teacher.phone = trimmed(&phone);
    }
    let updated = teacher.clone();
    store.put::<Teachers>(teachers)?;
    Ok(updated)
}

fn is_last_admin(teachers: &BTreeMap<String, Teacher>, teacher_id: &str) -> bool {
    let is_admin = teachers.get(teacher_id).is_some_and(|t| t.is_admin);
    is_admin && teachers.values().filter(|t| t.is_admin).count() == 1
}

/// Drops the teacher-keyed partition of a collection, saving only when something was removed.
fn drop_partition<C>(store: &mut DocumentStore, teacher_id: &str) -> DomainResult<bool>
where
    C: Collection,
    C::Value: PartitionMap,
{
    let mut value = store.get::<C>()?;
    if !value.drop_key(teacher_id) {
        return Ok(false);
    }
    store.put::<C>(value)?;
    Ok(true)
}

trait PartitionMap {
    fn drop_key(&mut self, key: &str) -> bool;
}

impl<V> PartitionMap for BTreeMap<String, V> {
    fn drop_key(&mut self, key: &str) -> bool {
        self.remove(key).is_some()
    }
}

/// Removes the teacher along with every partition they own and clears head-teacher references.
pub fn delete(store: &mut DocumentStore, teacher_id: &str) -> DomainResult<Teacher> {
    let mut teachers = store.get::<Teachers>()?;
    if is_last_admin(&teachers, teacher_id) {
        return Err(DomainError::invalid("cannot delete the only admin"));
    }
    let removed = teachers
        .remove(teacher_id)
        .ok_or_else(|| DomainError::not_found("teacher", teacher_id))?;
    store.put::<Teachers>(teachers)?;

    let mut cleaned = Vec::new();
    if drop_partition::<Attendance>(store, teacher_id)? {
        cleaned.push("attendance");
    }
    if drop_partition::<Assignments>(store, teacher_id)? {
        cleaned.push("assignments");
    }
    if drop_partition::<Performance>(store, teacher_id)? {
        cleaned.push("performance");
    }
    if drop_partition::<Timetable>(store, teacher_id)? {
        cleaned.push("timetable");
    }
    if drop_partition::<Resources>(store, teacher_id)? {
        cleaned.push("resources");
    }
    if drop_partition::<Orders>(store, teacher_id)? {
        cleaned.push("orders");
    }
    if drop_partition::<LeaveApplications>(store, teacher_id)? {
        cleaned.push("leave_applications");
    }
    if drop_partition::<Messages>(store, teacher_id)? {
        cleaned.push("messages");
    }

    let mut classes = store.get::<Classes>()?;
    let mut cleared = false;
    for info in classes.values_mut() {
        if info.head_teacher_id.as_deref() == Some(teacher_id) {
            info.head_teacher_id = None;
            cleared = true;
        }
    }
    if cleared {
        store.put::<Classes>(classes)?;
        cleaned.push("classes");
    }

    info!(username = %removed.username, cascaded = ?cleaned, "teacher deleted");
    Ok(removed)
}
