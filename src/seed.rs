use crate::auth::hash_password;
use crate::codec::LoadOutcome;
use crate::config::WorkspaceConfig;
use crate::error::StoreError;
use crate::schema::classes::{class_position, full_class_list, PRE_PRIMARY_LEVELS};
use crate::schema::collections::{
    Assignments, Attendance, Classes, EventsNotices, Fees, LeaveApplications, Messages, Orders,
    Performance, Resources, Students, StudentsByClass, TeacherMap, Teachers, Timetable,
};
use crate::schema::{Student, Teacher};
use crate::store::{Collection, CollectionName, DocumentStore};
use chrono::Local;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Default, Clone)]
pub struct SeedReport {
    pub seeded: Vec<CollectionName>,
    pub skipped_corrupt: Vec<CollectionName>,
}

/// Seeds every blank collection. Safe to call on every open: non-empty and corrupt collections are
/// left alone.
pub fn initialize(store: &mut DocumentStore, cfg: &WorkspaceConfig) -> Result<SeedReport, StoreError> {
    let mut report = SeedReport::default();

    seed_if_blank::<Teachers>(store, &mut report, || default_admin(cfg))?;
    seed_if_blank::<Students>(store, &mut report, || {
        if cfg.seed_sample_students {
            sample_students()
        } else {
            StudentsByClass::new()
        }
    })?;
    seed_if_blank::<Classes>(store, &mut report, || Default::default())?;
    seed_if_blank::<Attendance>(store, &mut report, || Default::default())?;
    seed_if_blank::<Assignments>(store, &mut report, || Default::default())?;
    seed_if_blank::<Performance>(store, &mut report, || Default::default())?;
    seed_if_blank::<Timetable>(store, &mut report, || Default::default())?;
    seed_if_blank::<Messages>(store, &mut report, || Default::default())?;
    seed_if_blank::<Resources>(store, &mut report, || Default::default())?;
    seed_if_blank::<LeaveApplications>(store, &mut report, || Default::default())?;
    seed_if_blank::<Fees>(store, &mut report, || Default::default())?;
    seed_if_blank::<EventsNotices>(store, &mut report, || Default::default())?;
    seed_if_blank::<Orders>(store, &mut report, || Default::default())?;

    if !report.seeded.is_empty() {
        info!(
            collections = ?report.seeded.iter().map(|c| c.as_str()).collect::<Vec<_>>(),
            "seeded blank collections"
        );
    }
    Ok(report)
}

fn seed_if_blank<C: Collection>(
    store: &mut DocumentStore,
    report: &mut SeedReport,
    make: impl FnOnce() -> C::Value,
) -> Result<(), StoreError> {
    let (current, outcome) = store.load_fresh::<C>()?;
    let blank_file = matches!(outcome, LoadOutcome::Missing | LoadOutcome::Empty);
    match outcome {
        LoadOutcome::Corrupt(_) => {
            report.skipped_corrupt.push(C::NAME);
            return Ok(());
        }
        _ if !C::is_empty(&current) => return Ok(()),
        _ => {}
    }
    let seeded = make();
    // An existing empty document needs no rewrite unless there is something to put in it.
    if !blank_file && C::is_empty(&seeded) {
        return Ok(());
    }
    store.put::<C>(seeded)?;
    report.seeded.push(C::NAME);
    Ok(())
}

fn default_admin(cfg: &WorkspaceConfig) -> TeacherMap {
    let id = Uuid::new_v4().to_string();
    let admin = Teacher {
        id: id.clone(),
        username: cfg.default_admin.username.clone(),
        password: hash_password(&cfg.default_admin.password),
        name: cfg.default_admin.name.clone(),
        subject: "Administration".to_string(),
        email: "admin@school.com".to_string(),
        phone: String::new(),
        join_date: Local::now().date_naive().to_string(),
        designation: "System Administrator".to_string(),
        resignation_date: None,
        epf_number: String::new(),
        esi_number: String::new(),
        payroll: 0.0,
        is_admin: true,
        classes: Vec::new(),
    };
    TeacherMap::from([(id, admin)])
}

/// Sample admission number for the `i`th (1-based) student of a class. The section digit keeps
/// numbers unique across sections of the same grade.
pub fn sample_admission_no(class_name: &str, i: usize) -> Option<String> {
    let (level, section) = class_position(class_name)?;
    Some(format!("ADM{:04}", (level + 1) * 1000 + section * 10 + i))
}

pub fn sample_students() -> StudentsByClass {
    let mut out = StudentsByClass::new();
    for class_name in full_class_list() {
        let count = if PRE_PRIMARY_LEVELS.contains(&class_name.as_str()) { 2 } else { 3 };
        let mut roster = Vec::with_capacity(count);
        for i in 1..=count {
            let Some(admission_no) = sample_admission_no(&class_name, i) else {
                continue;
            };
            let slug = class_name.replace(' ', "_");
            roster.push(Student {
                id: Uuid::new_v4().to_string(),
                admission_no,
                name: format!("Student {i} {class_name}"),
                roll_no: i.to_string(),
                class_name: class_name.clone(),
                dob: "2010-01-01".to_string(),
                date_of_joining: "2023-09-01".to_string(),
                date_of_tc: None,
                adhar_number: format!("1234567890{i:02}"),
                father_name: format!("Father {i} {class_name}"),
                mother_name: format!("Mother {i} {class_name}"),
                parent_name: format!("Father {i} {class_name}"),
                parent_email: format!("parent{i}_{slug}@example.com"),
                parent_phone: format!("98765432{i:02}"),
                address: format!("{i} School Road, {class_name} City"),
                emergency_contact: format!("99988877{i:02}"),
                contact_number: format!("91234567{i:02}"),
                blood_group: "O+".to_string(),
                financial_status: "Paid".to_string(),
                passport_photo_path: None,
                parent_password: None,
            });
        }
        out.insert(class_name, roster);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn temp_dir(prefix: &str) -> std::path::PathBuf {
        let p = std::env::temp_dir().join(format!("{prefix}-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&p).expect("create temp dir");
        p
    }

    #[test]
    fn sample_roster_has_unique_admission_numbers() {
        let roster = sample_students();
        assert_eq!(roster.len(), 43);
        assert_eq!(roster["Nursery"].len(), 2);
        assert_eq!(roster["Grade 5B"].len(), 3);
        let all: Vec<&str> = roster.values().flatten().map(|s| s.admission_no.as_str()).collect();
        let unique: HashSet<&str> = all.iter().copied().collect();
        assert_eq!(all.len(), unique.len());
        assert_eq!(roster["Nursery"][0].admission_no, "ADM1001");
        assert_eq!(roster["Grade 1A"][0].admission_no, "ADM4001");
        assert_eq!(roster["Grade 1B"][0].admission_no, "ADM4011");
    }

    #[test]
    fn initialize_is_idempotent() {
        let ws = temp_dir("academicd-seed");
        let cfg = WorkspaceConfig::default();
        let mut store = DocumentStore::open(&ws).unwrap();

        let first = initialize(&mut store, &cfg).unwrap();
        assert_eq!(first.seeded.len(), CollectionName::ALL.len());
        for name in CollectionName::ALL {
            assert!(store.path_of(name).is_file(), "{} written", name.as_str());
        }
        let teachers = store.get::<Teachers>().unwrap();
        assert_eq!(teachers.len(), 1);
        let admin = teachers.values().next().unwrap();
        assert!(admin.is_admin);
        assert_eq!(admin.password, hash_password("admin123"));

        let before = std::fs::read(store.path_of(CollectionName::Students)).unwrap();
        store.reload();
        let second = initialize(&mut store, &cfg).unwrap();
        assert!(second.seeded.is_empty());
        assert_eq!(store.get::<Teachers>().unwrap().len(), 1);
        let after = std::fs::read(store.path_of(CollectionName::Students)).unwrap();
        assert_eq!(before, after);

        let _ = std::fs::remove_dir_all(ws);
    }

    #[test]
    fn corrupt_collection_is_never_seeded_over() {
        let ws = temp_dir("academicd-seed-corrupt");
        let mut store = DocumentStore::open(&ws).unwrap();
        let path = store.path_of(CollectionName::Teachers);
        std::fs::write(&path, b"[[[").unwrap();

        let report = initialize(&mut store, &WorkspaceConfig::default()).unwrap();
        assert_eq!(report.skipped_corrupt, vec![CollectionName::Teachers]);
        assert_eq!(std::fs::read(&path).unwrap(), b"[[[");

        let _ = std::fs::remove_dir_all(ws);
    }

    #[test]
    fn sample_students_can_be_turned_off() {
        let ws = temp_dir("academicd-seed-nosample");
        let mut store = DocumentStore::open(&ws).unwrap();
        let cfg = WorkspaceConfig {
            seed_sample_students: false,
            ..Default::default()
        };
        initialize(&mut store, &cfg).unwrap();
        assert!(store.get::<Students>().unwrap().is_empty());
        let _ = std::fs::remove_dir_all(ws);
    }
}
