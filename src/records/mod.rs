//! Domain operations over the collections. Each operation runs one load, mutate, save cycle per
//! collection it touches and validates before writing anything.

pub mod assignments;
pub mod attendance;
pub mod classes;
pub mod fees;
pub mod leave;
pub mod messages;
pub mod notices;
pub mod orders;
pub mod performance;
pub mod reports;
pub mod resources;
pub mod students;
pub mod teachers;
pub mod timetable;

use chrono::Local;
use uuid::Uuid;

pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub(crate) fn today() -> String {
    Local::now().date_naive().format("%Y-%m-%d").to_string()
}

pub(crate) fn now_time() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

pub(crate) fn trimmed(s: &str) -> String {
    s.trim().to_string()
}

/// Blank strings become `None`.
pub(crate) fn non_blank(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::config::WorkspaceConfig;
    use crate::seed;
    use crate::store::DocumentStore;
    use std::path::PathBuf;

    /// A seeded workspace without the sample roster.
    pub fn workspace(prefix: &str) -> (PathBuf, DocumentStore) {
        let ws = std::env::temp_dir().join(format!("{prefix}-{}", uuid::Uuid::new_v4()));
        let mut store = DocumentStore::open(&ws).expect("open store");
        let cfg = WorkspaceConfig {
            seed_sample_students: false,
            ..Default::default()
        };
        seed::initialize(&mut store, &cfg).expect("seed");
        (ws, store)
    }
}
