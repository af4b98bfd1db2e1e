use crate::auth::{self, AdminRegistration, ParentRegistration, Principal, Role, TeacherRegistration};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{get_required_str, parse_params, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::store::DocumentStore;
use serde_json::json;
use tracing::info;

fn store_of<'a>(state: &'a mut AppState) -> Result<&'a mut DocumentStore, HandlerErr> {
    state
        .store
        .as_mut()
        .ok_or_else(|| HandlerErr::new("no_workspace", "select a workspace first"))
}

fn register_admin(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let reg: AdminRegistration = parse_params(params)?;
    let teacher = auth::register_admin(store_of(state)?, &reg)?;
    Ok(json!({ "teacher": teacher.redacted() }))
}

fn register_teacher(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let reg: TeacherRegistration = parse_params(params)?;
    let teacher = auth::register_teacher(store_of(state)?, &reg)?;
    Ok(json!({ "teacher": teacher.redacted() }))
}

fn register_parent(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let reg: ParentRegistration = parse_params(params)?;
    let student = auth::register_parent(store_of(state)?, &reg)?;
    Ok(json!({
        "studentId": student.id,
        "admissionNo": student.admission_no,
        "studentName": student.name,
    }))
}

fn login(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let role_str = get_required_str(params, "role")?;
    let Some(role) = Role::parse(&role_str) else {
        return Err(HandlerErr::bad_params(format!("unknown role: {}", role_str)));
    };
    let password = params
        .get("password")
        .and_then(|v| v.as_str())
        .ok_or_else(|| HandlerErr::bad_params("missing password"))?
        .to_string();
    let store = store_of(state)?;

    let principal = match role {
        Role::Admin => {
            let username = get_required_str(params, "username")?;
            auth::authenticate_admin(store, &username, &password)?
                .map(|teacher_id| Principal::Admin { teacher_id })
        }
        Role::Teacher => {
            let username = get_required_str(params, "username")?;
            auth::authenticate_teacher(store, &username, &password)?
                .map(|teacher_id| Principal::Teacher { teacher_id })
        }
        Role::Parent => {
            let admission_no = get_required_str(params, "admissionNo")?;
            auth::authenticate_parent(store, &admission_no, &password)?.map(|s| Principal::Parent {
                student_id: s.id,
                admission_no: s.admission_no,
                class_name: s.class_name,
            })
        }
    };
    let Some(principal) = principal else {
        info!(role = role.as_str(), "login rejected");
        return Err(HandlerErr::new("unauthenticated", "invalid credentials"));
    };

    info!(role = role.as_str(), "logged in");
    state.session.login(principal.clone());
    Ok(json!({ "principal": principal }))
}

fn handle<F>(state: &mut AppState, req: &Request, f: F) -> serde_json::Value
where
    F: FnOnce(&mut AppState, &serde_json::Value) -> Result<serde_json::Value, HandlerErr>,
{
    match f(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_logout(state: &mut AppState, req: &Request) -> serde_json::Value {
    let was = state.session.logout();
    ok(&req.id, json!({ "loggedOut": was.is_some() }))
}

fn handle_whoami(state: &mut AppState, req: &Request) -> serde_json::Value {
    match state.session.principal() {
        Some(p) => ok(&req.id, json!({ "principal": p })),
        None => err(&req.id, "unauthenticated", "log in first", None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "auth.registerAdmin" => Some(handle(state, req, register_admin)),
        "auth.registerTeacher" => Some(handle(state, req, register_teacher)),
        "auth.registerParent" => Some(handle(state, req, register_parent)),
        "auth.login" => Some(handle(state, req, login)),
        "auth.logout" => Some(handle_logout(state, req)),
        "auth.whoami" => Some(handle_whoami(state, req)),
        _ => None,
    }
}
