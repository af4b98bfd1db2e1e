//! Credentials, registration and the per-process session.
//!
//! Password digests are plain lowercase SHA-256 hex so existing data directories keep working.

use crate::error::{DomainError, DomainResult};
use crate::schema::collections::{Students, Teachers};
use crate::schema::validate::{check_unique_username, require_fields};
use crate::schema::{Student, Teacher};
use crate::store::DocumentStore;
use chrono::Local;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;
use uuid::Uuid;

pub fn hash_password(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Teacher,
    Parent,
}

impl Role {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Self::Admin),
            "teacher" => Some(Self::Teacher),
            "parent" => Some(Self::Parent),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Teacher => "teacher",
            Self::Parent => "parent",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "camelCase")]
pub enum Principal {
    #[serde(rename_all = "camelCase")]
    Admin { teacher_id: String },
    #[serde(rename_all = "camelCase")]
    Teacher { teacher_id: String },
    #[serde(rename_all = "camelCase")]
    Parent {
        student_id: String,
        admission_no: String,
        class_name: String,
    },
}

impl Principal {
    pub fn role(&self) -> Role {
        match self {
            Self::Admin { .. } => Role::Admin,
            Self::Teacher { .. } => Role::Teacher,
            Self::Parent { .. } => Role::Parent,
        }
    }

    /// The teacher record behind an admin or teacher login.
    pub fn teacher_id(&self) -> Option<&str> {
        match self {
            Self::Admin { teacher_id } | Self::Teacher { teacher_id } => Some(teacher_id),
            Self::Parent { .. } => None,
        }
    }
}

/// At most one logged-in principal per process. No expiry.
#[derive(Debug, Default)]
pub struct Session {
    principal: Option<Principal>,
}

impl Session {
    pub fn login(&mut self, principal: Principal) {
        self.principal = Some(principal);
    }

    pub fn logout(&mut self) -> Option<Principal> {
        self.principal.take()
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }
}

fn find_teacher(store: &mut DocumentStore, username: &str, password: &str) -> DomainResult<Option<Teacher>> {
    let digest = hash_password(password);
    let teachers = store.get::<Teachers>()?;
    Ok(teachers
        .into_values()
        .find(|t| t.username == username && t.password == digest))
}

pub fn authenticate_admin(store: &mut DocumentStore, username: &str, password: &str) -> DomainResult<Option<String>> {
    Ok(find_teacher(store, username, password)?
        .filter(|t| t.is_admin)
        .map(|t| t.id))
}

pub fn authenticate_teacher(store: &mut DocumentStore, username: &str, password: &str) -> DomainResult<Option<String>> {
    Ok(find_teacher(store, username, password)?.map(|t| t.id))
}

/// Scans every class roster for the admission number and checks the parent password.
pub fn authenticate_parent(
    store: &mut DocumentStore,
    admission_no: &str,
    password: &str,
) -> DomainResult<Option<Student>> {
    let digest = hash_password(password);
    let students = store.get::<Students>()?;
    Ok(students
        .into_values()
        .flatten()
        .find(|s| s.admission_no == admission_no && s.parent_password.as_deref() == Some(digest.as_str())))
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdminRegistration {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    pub name: String,
    pub designation: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TeacherRegistration {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    pub name: String,
    pub subject: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParentRegistration {
    pub admission_no: String,
    pub parent_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub confirm_password: String,
}

fn check_passwords_match(password: &str, confirm: &str) -> DomainResult<()> {
    if password != confirm {
        return Err(DomainError::invalid("passwords do not match"));
    }
    Ok(())
}

fn new_teacher(username: &str, password: &str, name: &str, subject: &str) -> Teacher {
    Teacher {
        id: Uuid::new_v4().to_string(),
        username: username.trim().to_string(),
        password: hash_password(password),
        name: name.trim().to_string(),
        subject: subject.trim().to_string(),
        email: String::new(),
        phone: String::new(),
        join_date: Local::now().date_naive().to_string(),
        designation: String::new(),
        resignation_date: None,
        epf_number: String::new(),
        esi_number: String::new(),
        payroll: 0.0,
        is_admin: false,
        classes: Vec::new(),
    }
}

/// Only the first admin registered while no admin exists gets the admin flag.
pub fn register_admin(store: &mut DocumentStore, reg: &AdminRegistration) -> DomainResult<Teacher> {
    require_fields(&[
        ("username", &reg.username),
        ("password", &reg.password),
        ("confirm_password", &reg.confirm_password),
        ("name", &reg.name),
        ("designation", &reg.designation),
    ])?;
    check_passwords_match(&reg.password, &reg.confirm_password)?;

    let mut teachers = store.get::<Teachers>()?;
    check_unique_username(&teachers, reg.username.trim(), None)?;
    let has_admin = teachers.values().any(|t| t.is_admin);

    let mut teacher = new_teacher(&reg.username, &reg.password, &reg.name, "Administration");
    teacher.designation = reg.designation.trim().to_string();
    teacher.email = reg.email.trim().to_string();
    teacher.phone = reg.phone.trim().to_string();
    teacher.is_admin = !has_admin;

    teachers.insert(teacher.id.clone(), teacher.clone());
    store.put::<Teachers>(teachers)?;
    info!(username = %teacher.username, is_admin = teacher.is_admin, "registered admin");
    Ok(teacher)
}

pub fn register_teacher(store: &mut DocumentStore, reg: &TeacherRegistration) -> DomainResult<Teacher> {
    require_fields(&[
        ("username", &reg.username),
        ("password", &reg.password),
        ("confirm_password", &reg.confirm_password),
        ("name", &reg.name),
        ("subject", &reg.subject),
    ])?;
    check_passwords_match(&reg.password, &reg.confirm_password)?;

    let mut teachers = store.get::<Teachers>()?;
    check_unique_username(&teachers, reg.username.trim(), None)?;

    let mut teacher = new_teacher(&reg.username, &reg.password, &reg.name, &reg.subject);
    teacher.email = reg.email.trim().to_string();
    teacher.phone = reg.phone.trim().to_string();
    teacher.designation = "Teacher".to_string();

    teachers.insert(teacher.id.clone(), teacher.clone());
    store.put::<Teachers>(teachers)?;
    info!(username = %teacher.username, "registered teacher");
    Ok(teacher)
}

/// Attaches a parent account to an existing student. Each student admits one parent account.
pub fn register_parent(store: &mut DocumentStore, reg: &ParentRegistration) -> DomainResult<Student> {
    require_fields(&[
        ("admission_no", &reg.admission_no),
        ("parent_name", &reg.parent_name),
        ("password", &reg.password),
        ("confirm_password", &reg.confirm_password),
    ])?;
    check_passwords_match(&reg.password, &reg.confirm_password)?;

    let admission_no = reg.admission_no.trim();
    let mut students = store.get::<Students>()?;
    let student = students
        .values_mut()
        .flatten()
        .find(|s| s.admission_no == admission_no)
        .ok_or_else(|| DomainError::not_found("student", admission_no))?;
    if student.has_parent_account() {
        return Err(DomainError::Duplicate {
            what: "parent account for admission number",
            value: admission_no.to_string(),
        });
    }

    student.parent_name = reg.parent_name.trim().to_string();
    if !reg.email.trim().is_empty() {
        student.parent_email = reg.email.trim().to_string();
    }
    if !reg.phone.trim().is_empty() {
        student.parent_phone = reg.phone.trim().to_string();
    }
    student.parent_password = Some(hash_password(&reg.password));
    let registered = student.clone();

    store.put::<Students>(students)?;
    info!(admission_no, "registered parent");
    Ok(registered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorkspaceConfig;
    use crate::seed;

    fn store(prefix: &str) -> (std::path::PathBuf, DocumentStore) {
        let ws = std::env::temp_dir().join(format!("{prefix}-{}", Uuid::new_v4()));
        let mut store = DocumentStore::open(&ws).expect("open");
        seed::initialize(&mut store, &WorkspaceConfig::default()).expect("seed");
        (ws, store)
    }

    #[test]
    fn hash_is_sha256_hex() {
        assert_eq!(
            hash_password("admin123"),
            "240be518fabd2724ddb6f04eeb1da5967448d7e831c08c8fa822809f74c720a9"
        );
    }

    #[test]
    fn default_admin_logs_in_as_admin_and_teacher() {
        let (ws, mut store) = store("academicd-auth-admin");
        let id = authenticate_admin(&mut store, "admin", "admin123").unwrap();
        assert!(id.is_some());
        assert_eq!(authenticate_teacher(&mut store, "admin", "admin123").unwrap(), id);
        assert!(authenticate_admin(&mut store, "admin", "wrong").unwrap().is_none());
        let _ = std::fs::remove_dir_all(ws);
    }

    #[test]
    fn second_admin_registration_is_not_an_admin() {
        let (ws, mut store) = store("academicd-auth-register");
        let reg = AdminRegistration {
            username: "principal".into(),
            password: "pw".into(),
            confirm_password: "pw".into(),
            name: "Principal".into(),
            designation: "Principal".into(),
            ..Default::default()
        };
        let t = register_admin(&mut store, &reg).unwrap();
        assert!(!t.is_admin);
        assert!(authenticate_admin(&mut store, "principal", "pw").unwrap().is_none());
        assert!(authenticate_teacher(&mut store, "principal", "pw").unwrap().is_some());

        let dup = register_admin(&mut store, &reg).unwrap_err();
        assert_eq!(dup.code(), "duplicate_key");
        let _ = std::fs::remove_dir_all(ws);
    }

    #[test]
    fn teacher_registration_reports_all_missing_fields_and_mismatch() {
        let (ws, mut store) = store("academicd-auth-teacher");
        let err = register_teacher(&mut store, &TeacherRegistration::default()).unwrap_err();
        match err {
            DomainError::MissingFields(f) => assert_eq!(f.len(), 5),
            other => panic!("unexpected {other:?}"),
        }
        let reg = TeacherRegistration {
            username: "jdoe".into(),
            password: "a".into(),
            confirm_password: "b".into(),
            name: "J Doe".into(),
            subject: "Maths".into(),
            ..Default::default()
        };
        assert_eq!(register_teacher(&mut store, &reg).unwrap_err().code(), "validation_failed");
        let _ = std::fs::remove_dir_all(ws);
    }

    #[test]
    fn parent_registers_once_per_student() {
        let (ws, mut store) = store("academicd-auth-parent");
        let reg = ParentRegistration {
            admission_no: "ADM2002".into(),
            parent_name: "P".into(),
            password: "pw".into(),
            confirm_password: "pw".into(),
            ..Default::default()
        };
        let s = register_parent(&mut store, &reg).unwrap();
        assert_eq!(s.class_name, "LKG");

        let found = authenticate_parent(&mut store, "ADM2002", "pw").unwrap().unwrap();
        assert_eq!(found.id, s.id);
        assert!(authenticate_parent(&mut store, "ADM2002", "nope").unwrap().is_none());
        assert_eq!(register_parent(&mut store, &reg).unwrap_err().code(), "duplicate_key");

        let missing = ParentRegistration {
            admission_no: "ADM0000".into(),
            ..reg
        };
        assert_eq!(register_parent(&mut store, &missing).unwrap_err().code(), "not_found");
        let _ = std::fs::remove_dir_all(ws);
    }

    #[test]
    fn session_holds_one_principal() {
        let mut session = Session::default();
        assert!(session.principal().is_none());
        session.login(Principal::Teacher { teacher_id: "t1".into() });
        session.login(Principal::Admin { teacher_id: "a1".into() });
        assert_eq!(session.principal().map(Principal::role), Some(Role::Admin));
        assert!(session.logout().is_some());
        assert!(session.principal().is_none());
    }
}
