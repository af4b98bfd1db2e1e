use super::{new_id, non_blank, trimmed};
use crate::error::{DomainError, DomainResult};
use crate::partition::{delete_where, find_in_partitions, prune_empty};
use crate::records::leave::STUDENT_LEAVES_BUCKET;
use crate::schema::collections::{Assignments, Fees, LeaveApplications, Messages, Students};
use crate::schema::validate::{
    check_class, check_unique_admission_no, parse_date, parse_optional_date, require_fields,
};
use crate::schema::Student;
use crate::store::DocumentStore;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StudentInput {
    pub admission_no: String,
    pub name: String,
    pub roll_no: String,
    #[serde(alias = "class")]
    pub class_name: String,
    pub dob: String,
    pub date_of_joining: String,
    pub date_of_tc: Option<String>,
    pub adhar_number: String,
    pub father_name: String,
    pub mother_name: String,
    pub parent_name: String,
    pub parent_email: String,
    pub parent_phone: String,
    pub address: String,
    pub emergency_contact: String,
    pub contact_number: String,
    pub blood_group: String,
    pub financial_status: String,
    pub passport_photo_path: Option<String>,
}

impl StudentInput {
    fn validate(&self) -> DomainResult<()> {
        require_fields(&[
            ("admission_no", &self.admission_no),
            ("name", &self.name),
            ("class", &self.class_name),
            ("dob", &self.dob),
            ("date_of_joining", &self.date_of_joining),
            ("parent_name", &self.parent_name),
            ("father_name", &self.father_name),
            ("mother_name", &self.mother_name),
            ("parent_email", &self.parent_email),
            ("parent_phone", &self.parent_phone),
            ("emergency_contact", &self.emergency_contact),
        ])?;
        check_class(self.class_name.trim())?;
        parse_date("dob", &self.dob)?;
        parse_date("date_of_joining", &self.date_of_joining)?;
        parse_optional_date("date_of_tc", self.date_of_tc.as_deref())?;
        Ok(())
    }

    fn into_student(self, id: String, parent_password: Option<String>) -> Student {
        Student {
            id,
            admission_no: trimmed(&self.admission_no),
            name: trimmed(&self.name),
            roll_no: trimmed(&self.roll_no),
            class_name: trimmed(&self.class_name),
            dob: trimmed(&self.dob),
            date_of_joining: trimmed(&self.date_of_joining),
            date_of_tc: non_blank(self.date_of_tc.as_deref()),
            adhar_number: trimmed(&self.adhar_number),
            father_name: trimmed(&self.father_name),
            mother_name: trimmed(&self.mother_name),
            parent_name: trimmed(&self.parent_name),
            parent_email: trimmed(&self.parent_email),
            parent_phone: trimmed(&self.parent_phone),
            address: trimmed(&self.address),
            emergency_contact: trimmed(&self.emergency_contact),
            contact_number: trimmed(&self.contact_number),
            blood_group: trimmed(&self.blood_group),
            financial_status: trimmed(&self.financial_status),
            passport_photo_path: non_blank(self.passport_photo_path.as_deref()),
            parent_password,
        }
    }
}

/// Students of one class, or of every class when `class_name` is `None`. Credentials are stripped.
pub fn list(store: &mut DocumentStore, class_name: Option<&str>) -> DomainResult<Vec<Student>> {
    let students = store.get::<Students>()?;
    let mut out: Vec<Student> = match class_name {
        Some(c) => students.get(c).cloned().unwrap_or_default(),
        None => students.into_values().flatten().collect(),
    };
    out.sort_by(|a, b| {
        a.class_name
            .cmp(&b.class_name)
            .then_with(|| a.roll_no.cmp(&b.roll_no))
            .then_with(|| a.name.cmp(&b.name))
    });
    Ok(out.iter().map(Student::redacted).collect())
}

pub fn get(store: &mut DocumentStore, student_id: &str) -> DomainResult<Student> {
    let students = store.get::<Students>()?;
    students
        .values()
        .flatten()
        .find(|s| s.id == student_id)
        .map(Student::redacted)
        .ok_or_else(|| DomainError::not_found("student", student_id))
}

pub fn create(store: &mut DocumentStore, input: StudentInput) -> DomainResult<Student> {
    input.validate()?;
    let mut students = store.get::<Students>()?;
    check_unique_admission_no(&students, input.admission_no.trim(), None)?;

    let student = input.into_student(new_id(), None);
    students
        .entry(student.class_name.clone())
        .or_default()
        .push(student.clone());
    store.put::<Students>(students)?;
    info!(admission_no = %student.admission_no, class = %student.class_name, "student created");
    Ok(student)
}

/// Replaces a student's details. A class change moves the record to the new class partition.
pub fn update(store: &mut DocumentStore, student_id: &str, input: StudentInput) -> DomainResult<Student> {
    input.validate()?;
    let mut students = store.get::<Students>()?;
    let (old_class, idx) = find_in_partitions(&students, |s| s.id == student_id)
        .ok_or_else(|| DomainError::not_found("student", student_id))?;
    check_unique_admission_no(&students, input.admission_no.trim(), Some(student_id))?;

    let parent_password = students[&old_class][idx].parent_password.clone();
    let updated = input.into_student(student_id.to_string(), parent_password);

    if updated.class_name == old_class {
        if let Some(list) = students.get_mut(&old_class) {
            list[idx] = updated.clone();
        }
    } else {
        if let Some(list) = students.get_mut(&old_class) {
            list.remove(idx);
        }
        students
            .entry(updated.class_name.clone())
            .or_default()
            .push(updated.clone());
        prune_empty(&mut students);
    }
    store.put::<Students>(students)?;
    Ok(updated.redacted())
}

/// Removes the student and everything that only makes sense with them: fee record, assignment
/// submissions, student leave entries and their inbox. Each collection is saved on its own.
pub fn delete(store: &mut DocumentStore, student_id: &str) -> DomainResult<Student> {
    let mut students = store.get::<Students>()?;
    let (class_name, idx) = find_in_partitions(&students, |s| s.id == student_id)
        .ok_or_else(|| DomainError::not_found("student", student_id))?;
    let removed = match students.get_mut(&class_name) {
        Some(list) => list.remove(idx),
        None => return Err(DomainError::not_found("student", student_id)),
    };
    prune_empty(&mut students);
    store.put::<Students>(students)?;

    let mut fees = store.get::<Fees>()?;
    if fees.remove(student_id).is_some() {
        store.put::<Fees>(fees)?;
    }

    let mut assignments = store.get::<Assignments>()?;
    let dropped: usize = assignments
        .values_mut()
        .flatten()
        .map(|a| delete_where(&mut a.submissions, |s| s.student_id == student_id))
        .sum();
    if dropped > 0 {
        store.put::<Assignments>(assignments)?;
    }

    let mut leave = store.get::<LeaveApplications>()?;
    if let Some(bucket) = leave.get_mut(STUDENT_LEAVES_BUCKET) {
        if delete_where(bucket, |l| l.target_id == student_id) > 0 {
            prune_empty(&mut leave);
            store.put::<LeaveApplications>(leave)?;
        }
    }

    let mut messages = store.get::<Messages>()?;
    if messages.remove(student_id).is_some() {
        store.put::<Messages>(messages)?;
    }

    info!(admission_no = %removed.admission_no, "student deleted");
    Ok(removed.redacted())
}
