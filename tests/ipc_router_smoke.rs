use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
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

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_academicd");
    let mut child = Command::new(exe)
        .env_remove("ACADEMICD_WORKSPACE")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn academicd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(true),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or(serde_json::Value::Null)
}

fn error_code(value: &serde_json::Value) -> &str {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
}

fn call(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert_ne!(
        error_code(&value),
        "not_implemented",
        "unexpected unknown method for {}",
        method
    );
    value
}

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let workspace = temp_dir("academicd-router-smoke");
    let bundle_out = workspace.join("exports").join("smoke.academicd.zip");
    let sqlite_out = workspace.join("exports").join("smoke.sqlite3");
    let upload = workspace.join("worksheet.pdf");
    std::fs::write(&upload, b"%PDF-1.4 smoke").expect("write upload");

    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let s = &mut stdin;
    let r = &mut reader;

    call(s, r, "1", "health", json!({}));
    request_ok(s, r, "2", "workspace.select", json!({ "path": workspace.to_string_lossy() }));
    let status = request_ok(s, r, "3", "store.status", json!({}));
    assert_eq!(status["collections"].as_array().map(|c| c.len()), Some(13));
    call(s, r, "4", "store.reload", json!({}));

    request_ok(
        s,
        r,
        "5",
        "auth.registerAdmin",
        json!({
            "username": "office2",
            "password": "pw",
            "confirmPassword": "pw",
            "name": "Second Office",
            "designation": "Clerk"
        }),
    );
    request_ok(
        s,
        r,
        "6",
        "auth.registerTeacher",
        json!({
            "username": "smoke",
            "password": "pw",
            "confirmPassword": "pw",
            "name": "Smoke Teacher",
            "subject": "English"
        }),
    );
    request_ok(
        s,
        r,
        "7",
        "auth.registerParent",
        json!({
            "admissionNo": "ADM8021",
            "parentName": "Smoke Parent",
            "password": "pw",
            "confirmPassword": "pw"
        }),
    );

    // Admin surface.
    request_ok(
        s,
        r,
        "10",
        "auth.login",
        json!({ "role": "admin", "username": "admin", "password": "admin123" }),
    );
    call(s, r, "11", "auth.whoami", json!({}));
    let teachers = request_ok(s, r, "12", "teachers.list", json!({}));
    let smoke_id = teachers["teachers"]
        .as_array()
        .expect("teachers")
        .iter()
        .find(|t| t["username"].as_str() == Some("smoke"))
        .and_then(|t| t["id"].as_str())
        .expect("smoke teacher")
        .to_string();
    let extra = call(
        s,
        r,
        "13",
        "teachers.create",
        json!({
            "username": "temp",
            "password": "pw",
            "name": "Temp Teacher",
            "subject": "Art"
        }),
    );
    let extra_id = extra["result"]["teacher"]["id"].as_str().unwrap_or("").to_string();
    call(
        s,
        r,
        "14",
        "teachers.update",
        json!({ "teacherId": smoke_id, "username": "smoke", "name": "Smoke Teacher", "subject": "English", "classes": ["Grade 5C"] }),
    );
    call(s, r, "15", "teachers.delete", json!({ "teacherId": extra_id }));
    call(s, r, "16", "teachers.updateProfile", json!({ "phone": "9000012345" }));
    call(s, r, "17", "classes.list", json!({}));
    call(s, r, "18", "classes.upsert", json!({ "name": "Grade 5C", "headTeacherId": smoke_id, "capacity": 40 }));
    call(s, r, "19", "classes.get", json!({ "className": "Grade 5C" }));
    let roster = request_ok(s, r, "20", "students.list", json!({ "className": "Grade 5C" }));
    let student_id = roster["students"][0]["id"].as_str().expect("sample student").to_string();
    let created = call(
        s,
        r,
        "21",
        "students.create",
        json!({
            "admissionNo": "SMOKE-1",
            "name": "Smoke Student",
            "className": "Grade 5C",
            "dob": "2012-01-01",
            "dateOfJoining": "2024-01-01",
            "fatherName": "F",
            "motherName": "M",
            "parentName": "F",
            "parentEmail": "f@example.com",
            "parentPhone": "1",
            "emergencyContact": "2"
        }),
    );
    let temp_student = created["result"]["student"]["id"].as_str().unwrap_or("").to_string();
    call(s, r, "22", "students.get", json!({ "studentId": temp_student }));
    call(
        s,
        r,
        "23",
        "students.update",
        json!({
            "studentId": temp_student,
            "admissionNo": "SMOKE-1",
            "name": "Smoke Student",
            "className": "Grade 5D",
            "dob": "2012-01-01",
            "dateOfJoining": "2024-01-01",
            "fatherName": "F",
            "motherName": "M",
            "parentName": "F",
            "parentEmail": "f@example.com",
            "parentPhone": "1",
            "emergencyContact": "2"
        }),
    );
    call(s, r, "24", "students.delete", json!({ "studentId": temp_student }));
    call(s, r, "25", "fees.setDue", json!({ "studentId": student_id, "amountDue": 900.0 }));
    call(s, r, "26", "fees.recordPayment", json!({ "studentId": student_id, "amount": 100.0 }));
    call(s, r, "27", "fees.get", json!({ "studentId": student_id }));
    call(s, r, "28", "fees.list", json!({}));
    let notice = call(
        s,
        r,
        "29",
        "notices.create",
        json!({ "type": "Notice", "title": "Smoke", "content": "Drill", "targetAudience": ["All"] }),
    );
    call(s, r, "30", "notices.list", json!({}));
    let notice_id = notice["result"]["entry"]["id"].as_str().unwrap_or("").to_string();
    call(s, r, "31", "notices.delete", json!({ "entryId": notice_id }));
    call(s, r, "32", "reports.overview", json!({}));
    call(s, r, "33", "orders.catalog", json!({}));
    call(s, r, "34", "attendance.studentHistory", json!({ "studentId": student_id }));
    call(s, r, "35", "timetable.forTeacher", json!({ "teacherId": smoke_id }));

    // Teacher surface.
    request_ok(s, r, "40", "auth.login", json!({ "role": "teacher", "username": "smoke", "password": "pw" }));
    call(s, r, "41", "attendance.open", json!({ "date": "2030-01-06", "className": "Grade 5C" }));
    call(
        s,
        r,
        "42",
        "attendance.save",
        json!({ "date": "2030-01-06", "className": "Grade 5C", "marks": { (student_id.as_str()): "Late" } }),
    );
    let assignment = call(
        s,
        r,
        "43",
        "assignments.create",
        json!({ "title": "Essay", "dueDate": "2030-02-01", "assignedClass": "Grade 5C", "maxScore": 10 }),
    );
    let assignment_id = assignment["result"]["assignment"]["id"].as_str().unwrap_or("").to_string();
    call(s, r, "44", "assignments.list", json!({}));
    call(
        s,
        r,
        "45",
        "assignments.submit",
        json!({ "assignmentId": assignment_id, "studentId": student_id, "text": "Essay text" }),
    );
    call(
        s,
        r,
        "46",
        "assignments.grade",
        json!({ "assignmentId": assignment_id, "studentId": student_id, "grade": 8 }),
    );
    call(s, r, "47", "assignments.forStudent", json!({ "studentId": student_id }));
    call(
        s,
        r,
        "48",
        "performance.record",
        json!({
            "className": "Grade 5C",
            "examName": "Unit 1",
            "subject": "English",
            "maxMarks": 50,
            "scores": [{ "studentId": student_id, "marks": 41 }]
        }),
    );
    call(s, r, "49", "performance.classReport", json!({ "className": "Grade 5C" }));
    call(s, r, "50", "performance.studentReport", json!({ "studentId": student_id }));
    call(
        s,
        r,
        "51",
        "timetable.set",
        json!({ "day": "Monday", "period": 1, "subject": "English", "className": "Grade 5C" }),
    );
    call(s, r, "52", "timetable.forTeacher", json!({}));
    call(s, r, "53", "timetable.forClass", json!({ "className": "Grade 5C" }));
    call(s, r, "54", "timetable.clear", json!({ "day": "Monday", "period": 1 }));
    let stored = request_ok(
        s,
        r,
        "55",
        "attachments.import",
        json!({ "kind": "resources", "sourcePath": upload.to_string_lossy() }),
    );
    let stored_path = stored["path"].as_str().expect("stored path").to_string();
    let checked = request_ok(s, r, "56", "attachments.check", json!({ "path": stored_path }));
    assert_eq!(checked["exists"].as_bool(), Some(true));
    let resource = call(
        s,
        r,
        "57",
        "resources.add",
        json!({ "title": "Worksheet", "className": "Grade 5C", "fileName": "worksheet.pdf", "filePath": stored_path }),
    );
    call(s, r, "58", "resources.list", json!({}));
    call(s, r, "59", "resources.forClass", json!({ "className": "Grade 5C" }));
    let resource_id = resource["result"]["resource"]["id"].as_str().unwrap_or("").to_string();
    call(s, r, "60", "resources.delete", json!({ "resourceId": resource_id }));
    call(
        s,
        r,
        "61",
        "messages.send",
        json!({ "recipientType": "admin", "subject": "Supplies", "content": "Need chalk" }),
    );
    call(s, r, "62", "messages.sent", json!({}));
    let order = call(s, r, "63", "orders.place", json!({ "items": { "Pencil Box": 3 } }));
    let order_id = order["result"]["order"]["id"].as_str().unwrap_or("").to_string();
    call(s, r, "64", "orders.list", json!({}));
    call(s, r, "65", "orders.cancel", json!({ "orderId": order_id }));
    let leave = call(
        s,
        r,
        "66",
        "leave.apply",
        json!({ "type": "Casual", "startDate": "2030-06-01", "endDate": "2030-06-01", "reason": "Errand" }),
    );
    let leave_id = leave["result"]["leave"]["id"].as_str().unwrap_or("").to_string();
    call(s, r, "67", "leave.list", json!({}));
    call(s, r, "68", "leave.cancel", json!({ "leaveId": leave_id }));
    call(s, r, "69", "assignments.delete", json!({ "assignmentId": assignment_id }));

    // Parent surface.
    request_ok(
        s,
        r,
        "70",
        "auth.login",
        json!({ "role": "parent", "admissionNo": "ADM8021", "password": "pw" }),
    );
    let inbox_owner = request_ok(s, r, "71", "auth.whoami", json!({}));
    assert_eq!(inbox_owner["principal"]["className"].as_str(), Some("Grade 5C"));
    call(
        s,
        r,
        "72",
        "messages.send",
        json!({ "recipientType": "teacher", "recipientId": smoke_id, "subject": "Hello", "content": "Thanks" }),
    );
    call(s, r, "73", "messages.inbox", json!({}));
    call(s, r, "74", "notices.list", json!({ "type": "Notice" }));

    // Teacher reads and clears the parent's message.
    request_ok(s, r, "80", "auth.login", json!({ "role": "teacher", "username": "smoke", "password": "pw" }));
    let inbox = request_ok(s, r, "81", "messages.inbox", json!({}));
    assert_eq!(inbox["unread"].as_u64(), Some(1));
    let message_id = inbox["messages"][0]["id"].as_str().expect("message id").to_string();
    call(s, r, "82", "messages.markRead", json!({ "messageId": message_id }));
    call(s, r, "83", "messages.delete", json!({ "messageId": message_id }));

    // Admin reviews and exports.
    request_ok(
        s,
        r,
        "90",
        "auth.login",
        json!({ "role": "admin", "username": "admin", "password": "admin123" }),
    );
    call(s, r, "91", "leave.review", json!({ "leaveId": leave_id, "decision": "Approved" }));
    call(s, r, "92", "orders.review", json!({ "orderId": order_id, "decision": "Rejected" }));
    let exported = request_ok(
        s,
        r,
        "93",
        "backup.exportWorkspaceBundle",
        json!({ "outPath": bundle_out.to_string_lossy() }),
    );
    assert!(exported["entryCount"].as_u64().unwrap_or(0) > 1);
    let snapshot = request_ok(
        s,
        r,
        "94",
        "export.relationalSnapshot",
        json!({ "outPath": sqlite_out.to_string_lossy() }),
    );
    assert_eq!(snapshot["rows"]["classes"].as_u64(), Some(43));
    assert!(sqlite_out.is_file());
    let imported = request_ok(
        s,
        r,
        "95",
        "backup.importWorkspaceBundle",
        json!({ "inPath": bundle_out.to_string_lossy() }),
    );
    assert_eq!(imported["loggedOut"].as_bool(), Some(true));
    let after = request(s, r, "96", "reports.overview", json!({}));
    assert_eq!(error_code(&after), "unauthenticated");

    let unknown = request(s, r, "97", "nope.nothing", json!({}));
    assert_eq!(error_code(&unknown), "not_implemented");

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn malformed_lines_get_bad_json() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    writeln!(stdin, "{{not json").expect("write garbage");
    stdin.flush().expect("flush");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("response json");
    assert_eq!(error_code(&value), "bad_json");

    // The loop keeps serving after a bad line.
    let health = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    assert!(health["workspacePath"].is_null());

    drop(stdin);
    let _ = child.wait();
}
