//! The thirteen named collections and the document shape each one persists.

use super::{
    Assignment, AttendanceStatus, ClassInfo, EventNotice, FeeRecord, LeaveApplication, Message,
    Order, PerformanceEntry, Resource, Student, Teacher, TimetableSlot,
};
use crate::store::{Collection, CollectionName};
use std::collections::BTreeMap;

/// teacher id → teacher
pub type TeacherMap = BTreeMap<String, Teacher>;
/// class name → students of that class
pub type StudentsByClass = BTreeMap<String, Vec<Student>>;
/// class name → class metadata
pub type ClassMap = BTreeMap<String, ClassInfo>;
/// student id → status
pub type AttendanceSheet = BTreeMap<String, AttendanceStatus>;
/// teacher id → date → class name → sheet
pub type AttendanceBook = BTreeMap<String, BTreeMap<String, BTreeMap<String, AttendanceSheet>>>;
/// teacher id → assignments
pub type AssignmentsByTeacher = BTreeMap<String, Vec<Assignment>>;
/// teacher id → class name → score entries
pub type PerformanceBook = BTreeMap<String, BTreeMap<String, Vec<PerformanceEntry>>>;
/// teacher id → slots
pub type TimetableByTeacher = BTreeMap<String, Vec<TimetableSlot>>;
/// recipient id → messages
pub type Inboxes = BTreeMap<String, Vec<Message>>;
/// teacher id → resources
pub type ResourcesByTeacher = BTreeMap<String, Vec<Resource>>;
/// teacher id (or the student bucket) → applications
pub type LeaveBook = BTreeMap<String, Vec<LeaveApplication>>;
/// student id → fee record
pub type FeeLedger = BTreeMap<String, FeeRecord>;
/// entry id → event or notice
pub type NoticeBoard = BTreeMap<String, EventNotice>;
/// teacher id → orders
pub type OrdersByTeacher = BTreeMap<String, Vec<Order>>;

macro_rules! collection {
    ($marker:ident, $name:expr, $value:ty) => {
        pub struct $marker;

        impl Collection for $marker {
            const NAME: CollectionName = $name;
            type Value = $value;

            fn is_empty(value: &Self::Value) -> bool {
                value.is_empty()
            }
        }
    };
}

collection!(Teachers, CollectionName::Teachers, TeacherMap);
collection!(Students, CollectionName::Students, StudentsByClass);
collection!(Classes, CollectionName::Classes, ClassMap);
collection!(Attendance, CollectionName::Attendance, AttendanceBook);
collection!(Assignments, CollectionName::Assignments, AssignmentsByTeacher);
collection!(Performance, CollectionName::Performance, PerformanceBook);
collection!(Timetable, CollectionName::Timetable, TimetableByTeacher);
collection!(Messages, CollectionName::Messages, Inboxes);
collection!(Resources, CollectionName::Resources, ResourcesByTeacher);
collection!(LeaveApplications, CollectionName::LeaveApplications, LeaveBook);
collection!(Fees, CollectionName::Fees, FeeLedger);
collection!(EventsNotices, CollectionName::EventsNotices, NoticeBoard);
collection!(Orders, CollectionName::Orders, OrdersByTeacher);
