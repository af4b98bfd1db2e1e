pub mod assignments;
pub mod attachments;
pub mod attendance;
pub mod auth;
pub mod backup;
pub mod classes;
pub mod core;
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
