//! Relational export: writes the JSON collections into an SQLite file whose tables follow the
//! school's relational schema, for reporting tools that expect SQL.

use crate::schema::classes::full_class_list;
use crate::schema::collections::{
    Assignments, Attendance, Classes, LeaveApplications, Messages, Performance, Resources,
    Students, Teachers, Timetable,
};
use crate::store::DocumentStore;
use anyhow::Context;
use rusqlite::{params, Connection, Transaction};
use std::collections::BTreeMap;
use std::path::Path;

const SCHEMA: &[&str] = &[
    "CREATE TABLE teachers(
        teacher_id TEXT PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        email TEXT,
        phone TEXT,
        subject TEXT,
        join_date DATE,
        designation TEXT,
        is_admin INTEGER NOT NULL
    )",
    "CREATE TABLE classes(
        class_id TEXT PRIMARY KEY,
        class_name TEXT NOT NULL UNIQUE,
        academic_year TEXT,
        head_teacher_id TEXT,
        capacity INTEGER,
        FOREIGN KEY(head_teacher_id) REFERENCES teachers(teacher_id)
    )",
    "CREATE TABLE teacher_classes(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        teacher_id TEXT NOT NULL,
        class_id TEXT NOT NULL,
        FOREIGN KEY(teacher_id) REFERENCES teachers(teacher_id),
        FOREIGN KEY(class_id) REFERENCES classes(class_id),
        UNIQUE(teacher_id, class_id)
    )",
    "CREATE TABLE parents(
        parent_id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT,
        phone TEXT,
        address TEXT
    )",
    "CREATE TABLE students(
        student_id TEXT PRIMARY KEY,
        admission_no TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        roll_no TEXT,
        class_id TEXT NOT NULL,
        dob DATE,
        parent_id TEXT,
        FOREIGN KEY(class_id) REFERENCES classes(class_id),
        FOREIGN KEY(parent_id) REFERENCES parents(parent_id)
    )",
    "CREATE TABLE attendance(
        attendance_id INTEGER PRIMARY KEY AUTOINCREMENT,
        student_id TEXT NOT NULL,
        class_id TEXT NOT NULL,
        date DATE NOT NULL,
        status TEXT CHECK(status IN ('Present', 'Absent', 'Late', 'Excused')),
        teacher_id TEXT NOT NULL,
        FOREIGN KEY(student_id) REFERENCES students(student_id),
        FOREIGN KEY(class_id) REFERENCES classes(class_id),
        FOREIGN KEY(teacher_id) REFERENCES teachers(teacher_id),
        UNIQUE(student_id, date, class_id, teacher_id)
    )",
    "CREATE TABLE assignments(
        assignment_id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT,
        due_date DATE,
        class_id TEXT,
        teacher_id TEXT,
        max_score INTEGER,
        assignment_type TEXT,
        created_at DATE,
        FOREIGN KEY(class_id) REFERENCES classes(class_id),
        FOREIGN KEY(teacher_id) REFERENCES teachers(teacher_id)
    )",
    "CREATE TABLE submissions(
        submission_id TEXT PRIMARY KEY,
        assignment_id TEXT NOT NULL,
        student_id TEXT NOT NULL,
        submission_text TEXT,
        submission_date DATE,
        status TEXT,
        grade REAL,
        feedback TEXT,
        FOREIGN KEY(assignment_id) REFERENCES assignments(assignment_id),
        FOREIGN KEY(student_id) REFERENCES students(student_id)
    )",
    "CREATE TABLE timetable(
        timetable_id INTEGER PRIMARY KEY AUTOINCREMENT,
        day TEXT NOT NULL,
        period INTEGER NOT NULL,
        subject TEXT NOT NULL,
        class_id TEXT,
        teacher_id TEXT,
        FOREIGN KEY(class_id) REFERENCES classes(class_id),
        FOREIGN KEY(teacher_id) REFERENCES teachers(teacher_id),
        UNIQUE(day, period, class_id)
    )",
    "CREATE TABLE messages(
        message_id TEXT PRIMARY KEY,
        sender_id TEXT,
        sender_type TEXT,
        recipient_id TEXT,
        recipient_type TEXT,
        student_id TEXT,
        subject TEXT,
        message TEXT,
        sent_date TEXT,
        status TEXT,
        is_read INTEGER NOT NULL
    )",
    "CREATE TABLE resources(
        resource_id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT,
        resource_type TEXT,
        class_id TEXT,
        teacher_id TEXT,
        filename TEXT,
        upload_date DATE,
        FOREIGN KEY(teacher_id) REFERENCES teachers(teacher_id)
    )",
    "CREATE TABLE leave_applications(
        leave_id TEXT PRIMARY KEY,
        applicant_id TEXT,
        applicant_type TEXT,
        leave_type TEXT,
        start_date DATE,
        end_date DATE,
        leave_days INTEGER,
        reason TEXT,
        status TEXT,
        application_date DATE
    )",
    "CREATE TABLE performance(
        performance_id TEXT PRIMARY KEY,
        student_id TEXT NOT NULL,
        teacher_id TEXT,
        class_id TEXT,
        exam_name TEXT,
        subject TEXT,
        marks REAL,
        max_marks REAL,
        average REAL,
        date_recorded DATE,
        FOREIGN KEY(student_id) REFERENCES students(student_id)
    )",
];

/// Rows written per table, in schema order.
#[derive(Debug, Clone, Default)]
pub struct SnapshotSummary {
    pub rows: BTreeMap<&'static str, usize>,
}

/// Builds a fresh SQLite file at `out_path` from the current collections. An existing file at
/// that path is replaced only after the new one is complete.
pub fn export_relational_snapshot(store: &mut DocumentStore, out_path: &Path) -> anyhow::Result<SnapshotSummary> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }
    let tmp = out_path.with_extension("sqlite3.exporting");
    if tmp.exists() {
        std::fs::remove_file(&tmp)
            .with_context(|| format!("failed to remove stale {}", tmp.to_string_lossy()))?;
    }

    let mut conn = Connection::open(&tmp)
        .with_context(|| format!("failed to create {}", tmp.to_string_lossy()))?;
    for ddl in SCHEMA {
        conn.execute(ddl, []).context("failed to create snapshot schema")?;
    }
    let tx = conn.transaction().context("failed to begin snapshot transaction")?;
    let summary = fill(&tx, store)?;
    tx.commit().context("failed to commit snapshot")?;
    drop(conn);

    std::fs::rename(&tmp, out_path).with_context(|| {
        format!("failed to move snapshot to {}", out_path.to_string_lossy())
    })?;
    Ok(summary)
}

fn fill(tx: &Transaction<'_>, store: &mut DocumentStore) -> anyhow::Result<SnapshotSummary> {
    let mut summary = SnapshotSummary::default();
    let mut bump = |table: &'static str, n: usize| *summary.rows.entry(table).or_insert(0) += n;

    let teachers = store.get::<Teachers>()?;
    for t in teachers.values() {
        bump(
            "teachers",
            tx.execute(
                "INSERT INTO teachers(teacher_id, username, name, email, phone, subject, join_date, designation, is_admin)
                 VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![t.id, t.username, t.name, t.email, t.phone, t.subject, t.join_date, t.designation, t.is_admin],
            )?,
        );
    }

    let classes = store.get::<Classes>()?;
    for name in full_class_list() {
        let info = classes.get(&name);
        bump(
            "classes",
            tx.execute(
                "INSERT INTO classes(class_id, class_name, academic_year, head_teacher_id, capacity)
                 VALUES(?, ?, ?, ?, ?)",
                params![
                    name,
                    name,
                    info.and_then(|i| i.academic_year.clone()),
                    info.and_then(|i| i.head_teacher_id.clone()),
                    info.and_then(|i| i.capacity),
                ],
            )?,
        );
    }
    for t in teachers.values() {
        for c in &t.classes {
            bump(
                "teacher_classes",
                tx.execute(
                    "INSERT OR IGNORE INTO teacher_classes(teacher_id, class_id) VALUES(?, ?)",
                    params![t.id, c],
                )?,
            );
        }
    }

    let students = store.get::<Students>()?;
    for s in students.values().flatten() {
        let parent_id = if s.parent_name.is_empty() && s.parent_email.is_empty() {
            None
        } else {
            bump(
                "parents",
                tx.execute(
                    "INSERT INTO parents(parent_id, name, email, phone, address) VALUES(?, ?, ?, ?, ?)",
                    params![s.id, s.parent_name, s.parent_email, s.parent_phone, s.address],
                )?,
            );
            Some(s.id.clone())
        };
        bump(
            "students",
            tx.execute(
                "INSERT OR IGNORE INTO students(student_id, admission_no, name, roll_no, class_id, dob, parent_id)
                 VALUES(?, ?, ?, ?, ?, ?, ?)",
                params![s.id, s.admission_no, s.name, s.roll_no, s.class_name, s.dob, parent_id],
            )?,
        );
    }

    for (teacher_id, by_date) in store.get::<Attendance>()? {
        for (date, by_class) in by_date {
            for (class_name, sheet) in by_class {
                for (student_id, status) in sheet {
                    bump(
                        "attendance",
                        tx.execute(
                            "INSERT OR IGNORE INTO attendance(student_id, class_id, date, status, teacher_id)
                             VALUES(?, ?, ?, ?, ?)",
                            params![student_id, class_name, date, format!("{status:?}"), teacher_id],
                        )?,
                    );
                }
            }
        }
    }

    for (teacher_id, list) in store.get::<Assignments>()? {
        for a in list {
            bump(
                "assignments",
                tx.execute(
                    "INSERT OR IGNORE INTO assignments(assignment_id, title, description, due_date, class_id, teacher_id, max_score, assignment_type, created_at)
                     VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?)",
                    params![a.id, a.title, a.description, a.due_date, a.assigned_class, teacher_id, a.max_score, a.kind, a.created_date],
                )?,
            );
            for s in &a.submissions {
                let status = serde_json::to_value(s.status)?;
                bump(
                    "submissions",
                    tx.execute(
                        "INSERT OR IGNORE INTO submissions(submission_id, assignment_id, student_id, submission_text, submission_date, status, grade, feedback)
                         VALUES(?, ?, ?, ?, ?, ?, ?, ?)",
                        params![s.id, a.id, s.student_id, s.submission_text, s.submission_date, status.as_str(), s.grade, s.feedback],
                    )?,
                );
            }
        }
    }

    for (teacher_id, slots) in store.get::<Timetable>()? {
        for slot in slots {
            bump(
                "timetable",
                tx.execute(
                    "INSERT OR IGNORE INTO timetable(day, period, subject, class_id, teacher_id) VALUES(?, ?, ?, ?, ?)",
                    params![slot.day, slot.period, slot.subject, slot.class_name, teacher_id],
                )?,
            );
        }
    }

    for m in store.get::<Messages>()?.into_values().flatten() {
        let sender_type = serde_json::to_value(m.sender_type)?;
        let recipient_type = serde_json::to_value(m.recipient_type)?;
        bump(
            "messages",
            tx.execute(
                "INSERT OR IGNORE INTO messages(message_id, sender_id, sender_type, recipient_id, recipient_type, student_id, subject, message, sent_date, status, is_read)
                 VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    m.id,
                    m.sender_id,
                    sender_type.as_str(),
                    m.recipient_id,
                    recipient_type.as_str(),
                    m.related_student_id,
                    m.subject,
                    m.content,
                    format!("{} {}", m.date, m.time).trim().to_string(),
                    m.status,
                    m.read,
                ],
            )?,
        );
    }

    for (teacher_id, list) in store.get::<Resources>()? {
        for r in list {
            bump(
                "resources",
                tx.execute(
                    "INSERT OR IGNORE INTO resources(resource_id, title, description, resource_type, class_id, teacher_id, filename, upload_date)
                     VALUES(?, ?, ?, ?, ?, ?, ?, ?)",
                    params![r.id, r.title, r.description, r.kind, r.class_name, teacher_id, r.file_name, r.upload_date],
                )?,
            );
        }
    }

    for l in store.get::<LeaveApplications>()?.into_values().flatten() {
        let applicant_type = serde_json::to_value(l.target_type)?;
        bump(
            "leave_applications",
            tx.execute(
                "INSERT OR IGNORE INTO leave_applications(leave_id, applicant_id, applicant_type, leave_type, start_date, end_date, leave_days, reason, status, application_date)
                 VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    l.id,
                    l.target_id,
                    applicant_type.as_str(),
                    l.kind,
                    l.start_date,
                    l.end_date,
                    l.leave_days,
                    l.reason,
                    l.status.as_str(),
                    l.application_date,
                ],
            )?,
        );
    }

    for (teacher_id, by_class) in store.get::<Performance>()? {
        for (class_name, entries) in by_class {
            for e in entries {
                bump(
                    "performance",
                    tx.execute(
                        "INSERT OR IGNORE INTO performance(performance_id, student_id, teacher_id, class_id, exam_name, subject, marks, max_marks, average, date_recorded)
                         VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                        params![
                            e.id,
                            e.student_id,
                            teacher_id,
                            class_name,
                            e.exam_name,
                            e.subject,
                            e.marks,
                            e.max_marks,
                            e.percentage(),
                            e.date_recorded,
                        ],
                    )?,
                );
            }
        }
    }

    Ok(summary)
}
