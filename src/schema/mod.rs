//! Record types for every collection, plus the validation and class-list rules that guard writes.
//!
//! Field names are the storage contract: existing data directories must keep loading, so structs
//! use the on-disk snake_case names and default anything older files may lack.

pub mod academics;
pub mod classes;
pub mod collections;
pub mod office;
pub mod people;
pub mod validate;

pub use academics::{
    Assignment, AttendanceStatus, ClassInfo, PerformanceEntry, Submission, SubmissionStatus,
    TimetableSlot,
};
pub use office::{
    Attachment, EntryKind, EventNotice, FeeRecord, LeaveApplication, LeaveTarget, Message,
    Order, Party, Payment, Resource,
};
pub use people::{Student, Teacher};
