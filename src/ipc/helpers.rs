use crate::auth::Principal;
use crate::error::{DomainError, StoreError};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::DocumentStore;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::path::Path;

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }

    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_params(message: impl Into<String>) -> Self {
        Self::new("bad_params", message)
    }
}

impl From<DomainError> for HandlerErr {
    fn from(e: DomainError) -> Self {
        let details = match &e {
            DomainError::MissingFields(fields) => Some(json!({ "fields": fields })),
            DomainError::Duplicate { what, value } => Some(json!({ "what": what, "value": value })),
            DomainError::NotFound { what, key } => Some(json!({ "what": what, "key": key })),
            DomainError::InvalidTransition { from, to } => Some(json!({ "from": from, "to": to })),
            DomainError::Store(StoreError::StaleWrite { collection }) => {
                Some(json!({ "collection": collection }))
            }
            _ => None,
        };
        Self {
            code: e.code(),
            message: e.to_string(),
            details,
        }
    }
}

impl From<StoreError> for HandlerErr {
    fn from(e: StoreError) -> Self {
        DomainError::from(e).into()
    }
}

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn get_optional_str(params: &serde_json::Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Deserializes the whole params object into a typed input. Absent params count as `{}`.
pub fn parse_params<T: DeserializeOwned>(params: &serde_json::Value) -> Result<T, HandlerErr> {
    let value = if params.is_null() {
        json!({})
    } else {
        params.clone()
    };
    serde_json::from_value(value).map_err(|e| HandlerErr::bad_params(e.to_string()))
}

fn forbidden(principal: &Principal) -> HandlerErr {
    HandlerErr::new(
        "forbidden",
        format!("not allowed for role {}", principal.role().as_str()),
    )
}

/// What a store-backed handler gets: the open store and the session's principal, if any.
pub struct Ctx<'a> {
    pub store: &'a mut DocumentStore,
    pub workspace: &'a Path,
    pub principal: Option<Principal>,
}

impl Ctx<'_> {
    pub fn principal(&self) -> Result<&Principal, HandlerErr> {
        self.principal
            .as_ref()
            .ok_or_else(|| HandlerErr::new("unauthenticated", "log in first"))
    }

    /// The admin's teacher ID.
    pub fn admin(&self) -> Result<String, HandlerErr> {
        match self.principal()? {
            Principal::Admin { teacher_id } => Ok(teacher_id.clone()),
            other => Err(forbidden(other)),
        }
    }

    pub fn teacher(&self) -> Result<String, HandlerErr> {
        match self.principal()? {
            Principal::Teacher { teacher_id } => Ok(teacher_id.clone()),
            other => Err(forbidden(other)),
        }
    }

    /// Admin or teacher; returns the teacher record ID behind the login.
    pub fn staff(&self) -> Result<String, HandlerErr> {
        let p = self.principal()?;
        p.teacher_id().map(str::to_string).ok_or_else(|| forbidden(p))
    }

    /// Staff may read any student; a parent only their own child.
    pub fn student_access(&self, student_id: &str) -> Result<(), HandlerErr> {
        match self.principal()? {
            Principal::Admin { .. } | Principal::Teacher { .. } => Ok(()),
            Principal::Parent { student_id: own, .. } if own == student_id => Ok(()),
            other => Err(forbidden(other)),
        }
    }
}

/// Runs `f` against the open workspace and wraps its outcome in a response.
pub fn with_store<F>(state: &mut AppState, req: &Request, f: F) -> serde_json::Value
where
    F: FnOnce(&mut Ctx<'_>, &serde_json::Value) -> Result<serde_json::Value, HandlerErr>,
{
    let principal = state.session.principal().cloned();
    let (Some(store), Some(workspace)) = (state.store.as_mut(), state.workspace.as_deref()) else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let mut ctx = Ctx {
        store,
        workspace,
        principal,
    };
    match f(&mut ctx, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}
