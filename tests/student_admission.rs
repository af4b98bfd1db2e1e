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

fn workspace_without_samples(prefix: &str) -> PathBuf {
    let ws = temp_dir(prefix);
    std::fs::write(ws.join("academicd.toml"), "seed_sample_students = false\n").expect("write config");
    ws
}

fn grade_5b_student(admission_no: &str) -> serde_json::Value {
    json!({
        "admissionNo": admission_no,
        "name": "Asha Verma",
        "rollNo": "12",
        "className": "Grade 5B",
        "dob": "2015-04-12",
        "dateOfJoining": "2024-06-01",
        "fatherName": "Ravi Verma",
        "motherName": "Meena Verma",
        "parentName": "Ravi Verma",
        "parentEmail": "ravi@example.com",
        "parentPhone": "9876500011",
        "emergencyContact": "9876500012"
    })
}

#[test]
fn admin_admits_student_into_grade_5b() {
    let workspace = workspace_without_samples("academicd-admission");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let before = request(&mut stdin, &mut reader, "0", "students.list", json!({}));
    assert_eq!(error_code(&before), "no_workspace");

    let selected = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let seeded: Vec<&str> = selected["seeded"]
        .as_array()
        .expect("seeded")
        .iter()
        .filter_map(|v| v.as_str())
        .collect();
    assert!(seeded.contains(&"teachers"));

    let anon = request(&mut stdin, &mut reader, "2", "students.list", json!({}));
    assert_eq!(error_code(&anon), "unauthenticated");

    request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "auth.login",
        json!({ "role": "admin", "username": "admin", "password": "admin123" }),
    );

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "students.create",
        grade_5b_student("ADM1001"),
    );
    assert_eq!(created["student"]["admission_no"].as_str(), Some("ADM1001"));
    assert_eq!(created["student"]["class"].as_str(), Some("Grade 5B"));
    let student_id = created["student"]["id"].as_str().expect("student id").to_string();

    let listed = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "students.list",
        json!({ "className": "Grade 5B" }),
    );
    let roster = listed["students"].as_array().expect("students");
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0]["id"].as_str(), Some(student_id.as_str()));

    let dup = request(
        &mut stdin,
        &mut reader,
        "6",
        "students.create",
        {
            let mut s = grade_5b_student("ADM1001");
            s["className"] = json!("Grade 6A");
            s
        },
    );
    assert_eq!(error_code(&dup), "duplicate_key");

    let missing = request(
        &mut stdin,
        &mut reader,
        "7",
        "students.create",
        json!({ "admissionNo": "ADM1002", "className": "Grade 5B" }),
    );
    assert_eq!(error_code(&missing), "validation_failed");
    let fields: Vec<&str> = missing["error"]["details"]["fields"]
        .as_array()
        .expect("fields")
        .iter()
        .filter_map(|v| v.as_str())
        .collect();
    assert!(fields.contains(&"name"));
    assert!(fields.contains(&"dob"));
    assert!(fields.contains(&"parent_email"));

    let bad_class = request(
        &mut stdin,
        &mut reader,
        "8",
        "students.create",
        {
            let mut s = grade_5b_student("ADM1003");
            s["className"] = json!("Grade 11A");
            s
        },
    );
    assert_eq!(error_code(&bad_class), "validation_failed");

    // Moving classes re-partitions the record.
    let mut moved = grade_5b_student("ADM1001");
    moved["studentId"] = json!(student_id);
    moved["className"] = json!("Grade 5C");
    request_ok(&mut stdin, &mut reader, "9", "students.update", moved);
    let old = request_ok(
        &mut stdin,
        &mut reader,
        "10",
        "students.list",
        json!({ "className": "Grade 5B" }),
    );
    assert!(old["students"].as_array().expect("students").is_empty());
    let detail = request_ok(
        &mut stdin,
        &mut reader,
        "11",
        "classes.get",
        json!({ "className": "Grade 5C" }),
    );
    assert_eq!(detail["class"]["students"].as_array().map(|a| a.len()), Some(1));

    let on_disk = std::fs::read_to_string(workspace.join("data").join("student_data.json"))
        .expect("read student file");
    let parsed: serde_json::Value = serde_json::from_str(&on_disk).expect("student file json");
    assert!(parsed.get("Grade 5B").is_none());
    assert_eq!(parsed["Grade 5C"][0]["admission_no"].as_str(), Some("ADM1001"));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn malformed_config_is_reported() {
    let workspace = temp_dir("academicd-bad-config");
    std::fs::write(workspace.join("academicd.toml"), "seed_sample_students = [").expect("write config");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let resp = request(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert_eq!(error_code(&resp), "config_invalid");
    assert!(!workspace.join("data").exists());

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
