use crate::codec::{self, LoadOutcome, Revision};
use crate::error::StoreError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const DATA_DIR: &str = "data";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CollectionName {
    Teachers,
    Students,
    Classes,
    Attendance,
    Assignments,
    Performance,
    Timetable,
    Messages,
    Resources,
    LeaveApplications,
    Fees,
    EventsNotices,
    Orders,
}

impl CollectionName {
    pub const ALL: [CollectionName; 13] = [
        Self::Teachers,
        Self::Students,
        Self::Classes,
        Self::Attendance,
        Self::Assignments,
        Self::Performance,
        Self::Timetable,
        Self::Messages,
        Self::Resources,
        Self::LeaveApplications,
        Self::Fees,
        Self::EventsNotices,
        Self::Orders,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Teachers => "teachers",
            Self::Students => "students",
            Self::Classes => "classes",
            Self::Attendance => "attendance",
            Self::Assignments => "assignments",
            Self::Performance => "performance",
            Self::Timetable => "timetable",
            Self::Messages => "messages",
            Self::Resources => "resources",
            Self::LeaveApplications => "leave_applications",
            Self::Fees => "fees",
            Self::EventsNotices => "events_notices",
            Self::Orders => "orders",
        }
    }

    /// Backing file name inside the data directory. These match existing data directories.
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Teachers => "teacher_data.json",
            Self::Students => "student_data.json",
            Self::Classes => "class_data.json",
            Self::Attendance => "attendance_data.json",
            Self::Assignments => "assignments_data.json",
            Self::Performance => "performance_data.json",
            Self::Timetable => "timetable_data.json",
            Self::Messages => "messages_data.json",
            Self::Resources => "resources_data.json",
            Self::LeaveApplications => "leave_data.json",
            Self::Fees => "fee_data.json",
            Self::EventsNotices => "event_notice_data.json",
            Self::Orders => "orders_data.json",
        }
    }
}

/// A named collection and the typed document stored for it.
pub trait Collection {
    const NAME: CollectionName;
    type Value: Serialize + DeserializeOwned + Default + Clone + 'static;

    fn is_empty(value: &Self::Value) -> bool;
}

struct Slot {
    value: Box<dyn Any>,
    revision: Option<Revision>,
}

#[derive(Debug, Clone)]
pub struct CollectionStatus {
    pub name: CollectionName,
    pub path: PathBuf,
    pub cached: bool,
    pub revision: Option<String>,
    pub corrupt: Option<String>,
}

/// Session-scoped view of the collection files under `<workspace>/data`.
///
/// Reads are served from a per-session cache. Writes are checked against the revision the session
/// last saw, so a put never silently overwrites a snapshot written by another session.
pub struct DocumentStore {
    data_dir: PathBuf,
    slots: HashMap<CollectionName, Slot>,
    corrupt: BTreeMap<CollectionName, String>,
}

impl DocumentStore {
    pub fn open(workspace: &Path) -> Result<Self, StoreError> {
        let data_dir = workspace.join(DATA_DIR);
        std::fs::create_dir_all(&data_dir).map_err(|source| StoreError::Write {
            path: data_dir.clone(),
            source,
        })?;
        Ok(Self {
            data_dir,
            slots: HashMap::new(),
            corrupt: BTreeMap::new(),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn path_of(&self, name: CollectionName) -> PathBuf {
        self.data_dir.join(name.file_name())
    }

    pub fn get<C: Collection>(&mut self) -> Result<C::Value, StoreError> {
        if let Some(v) = self
            .slots
            .get(&C::NAME)
            .and_then(|slot| slot.value.downcast_ref::<C::Value>())
        {
            return Ok(v.clone());
        }
        self.load_fresh::<C>().map(|(value, _)| value)
    }

    /// Bypasses the cache and reports how the backing file looked.
    pub fn load_fresh<C: Collection>(&mut self) -> Result<(C::Value, LoadOutcome), StoreError> {
        let path = self.path_of(C::NAME);
        let loaded = codec::load(&path, C::Value::default())?;
        if let LoadOutcome::Corrupt(reason) = &loaded.outcome {
            if !self.corrupt.contains_key(&C::NAME) {
                warn!(
                    collection = C::NAME.as_str(),
                    path = %path.display(),
                    %reason,
                    "collection file is corrupt; using an empty collection"
                );
            }
            self.corrupt.insert(C::NAME, reason.clone());
        } else if self.corrupt.remove(&C::NAME).is_some() {
            info!(collection = C::NAME.as_str(), "collection file readable again");
        }
        debug!(collection = C::NAME.as_str(), outcome = ?loaded.outcome, "collection loaded");
        self.slots.insert(
            C::NAME,
            Slot {
                value: Box::new(loaded.value.clone()),
                revision: loaded.revision,
            },
        );
        Ok((loaded.value, loaded.outcome))
    }

    pub fn put<C: Collection>(&mut self, value: C::Value) -> Result<(), StoreError> {
        let path = self.path_of(C::NAME);
        let on_disk = codec::current_revision(&path)?;
        if let Some(slot) = self.slots.get(&C::NAME) {
            if slot.revision != on_disk {
                self.slots.remove(&C::NAME);
                warn!(
                    collection = C::NAME.as_str(),
                    "rejected write: collection changed on disk since it was loaded"
                );
                return Err(StoreError::StaleWrite {
                    collection: C::NAME.as_str(),
                });
            }
        }

        if self.corrupt.contains_key(&C::NAME) {
            if let Some(kept) = codec::preserve_corrupt(&path)? {
                warn!(collection = C::NAME.as_str(), kept = %kept.display(), "preserved corrupt file");
            }
        }

        let revision = codec::save(&path, &value)?;
        self.corrupt.remove(&C::NAME);
        self.slots.insert(
            C::NAME,
            Slot {
                value: Box::new(value),
                revision: Some(revision),
            },
        );
        Ok(())
    }

    /// Drops every cached collection; the next `get` rereads from disk.
    pub fn reload(&mut self) {
        self.slots.clear();
    }

    pub fn status(&self) -> Vec<CollectionStatus> {
        CollectionName::ALL
            .iter()
            .map(|&name| {
                let slot = self.slots.get(&name);
                CollectionStatus {
                    name,
                    path: self.path_of(name),
                    cached: slot.is_some(),
                    revision: slot
                        .and_then(|s| s.revision.as_ref())
                        .map(|r| r.as_str().to_string()),
                    corrupt: self.corrupt.get(&name).cloned(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::collections::{Fees, Orders};
    use crate::schema::{FeeRecord, Order};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(prefix: &str) -> PathBuf {
        let p = std::env::temp_dir().join(format!(
            "{}-{}",
            prefix,
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("clock")
                .as_nanos()
        ));
        std::fs::create_dir_all(&p).expect("create temp dir");
        p
    }

    fn order(id: &str) -> Order {
        Order {
            id: id.to_string(),
            items: BTreeMap::from([("Pencil Box".to_string(), 2)]),
            total_cost: 60.0,
            status: Default::default(),
            order_date: "2026-10-19".to_string(),
        }
    }

    #[test]
    fn get_serves_cached_copy_until_reload() {
        let ws = temp_dir("academicd-store-cache");
        let mut store = DocumentStore::open(&ws).expect("open");

        let mut orders = store.get::<Orders>().expect("get");
        orders.insert("t1".to_string(), vec![order("o1")]);
        store.put::<Orders>(orders).expect("put");

        std::fs::write(store.path_of(CollectionName::Orders), b"{}").expect("external write");
        assert_eq!(store.get::<Orders>().expect("cached").len(), 1);

        store.reload();
        assert!(store.get::<Orders>().expect("reloaded").is_empty());

        let _ = std::fs::remove_dir_all(ws);
    }

    #[test]
    fn put_rejects_stale_snapshot_from_another_session() {
        let ws = temp_dir("academicd-store-stale");
        let mut first = DocumentStore::open(&ws).expect("open first");
        let mut second = DocumentStore::open(&ws).expect("open second");

        let mut a = first.get::<Orders>().expect("first get");
        let mut b = second.get::<Orders>().expect("second get");

        a.insert("t1".to_string(), vec![order("o1")]);
        first.put::<Orders>(a).expect("first put wins");

        b.insert("t2".to_string(), vec![order("o2")]);
        let err = second.put::<Orders>(b).expect_err("second put is stale");
        assert!(matches!(err, StoreError::StaleWrite { collection: "orders" }));

        // After reloading, the second session sees the first write and can retry.
        let mut b = second.get::<Orders>().expect("reload");
        assert!(b.contains_key("t1"));
        b.insert("t2".to_string(), vec![order("o2")]);
        second.put::<Orders>(b).expect("retry");

        first.reload();
        assert_eq!(first.get::<Orders>().expect("final").len(), 2);

        let _ = std::fs::remove_dir_all(ws);
    }

    #[test]
    fn corrupt_file_is_reported_and_preserved_on_next_write() {
        let ws = temp_dir("academicd-store-corrupt");
        let mut store = DocumentStore::open(&ws).expect("open");
        let path = store.path_of(CollectionName::Fees);
        std::fs::write(&path, b"{not json").expect("write corrupt");

        let fees = store.get::<Fees>().expect("get");
        assert!(fees.is_empty());
        let status = store
            .status()
            .into_iter()
            .find(|s| s.name == CollectionName::Fees)
            .expect("fees status");
        assert!(status.corrupt.is_some());

        let mut fees = fees;
        fees.insert("s1".to_string(), FeeRecord::for_student("s1", "ADM1", "A", "Grade 1A"));
        store.put::<Fees>(fees).expect("put");

        let kept = ws.join(DATA_DIR).join("fee_data.json.corrupt");
        assert_eq!(std::fs::read(kept).expect("kept"), b"{not json");
        assert!(store.status().iter().all(|s| s.corrupt.is_none()));

        let _ = std::fs::remove_dir_all(ws);
    }

    #[test]
    fn repaired_file_clears_corrupt_flag_after_reload() {
        let ws = temp_dir("academicd-store-repaired");
        let mut store = DocumentStore::open(&ws).expect("open");
        let path = store.path_of(CollectionName::Fees);
        std::fs::write(&path, b"{not json").expect("write corrupt");
        assert!(store.get::<Fees>().expect("get").is_empty());

        let mut repaired = BTreeMap::new();
        repaired.insert("s1".to_string(), FeeRecord::for_student("s1", "ADM1", "A", "Grade 1A"));
        codec::save(&path, &repaired).expect("repair on disk");

        store.reload();
        assert_eq!(store.get::<Fees>().expect("reread").len(), 1);
        assert!(store.status().iter().all(|s| s.corrupt.is_none()));

        let fees = store.get::<Fees>().expect("cached");
        store.put::<Fees>(fees).expect("put");
        assert!(!ws.join(DATA_DIR).join("fee_data.json.corrupt").exists());

        let _ = std::fs::remove_dir_all(ws);
    }
}
