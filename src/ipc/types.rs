use std::path::PathBuf;

use crate::auth::Session;
use crate::store::DocumentStore;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Everything one front-end session holds: the open workspace, its store and who is logged in.
#[derive(Default)]
pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub store: Option<DocumentStore>,
    pub session: Session,
}
