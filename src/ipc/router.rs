use super::handlers;
use super::types::{AppState, Request};
use crate::ipc::error::err;
use tracing::debug;

type Handler = fn(&mut AppState, &Request) -> Option<serde_json::Value>;

const HANDLERS: &[Handler] = &[
    handlers::core::try_handle,
    handlers::auth::try_handle,
    handlers::students::try_handle,
    handlers::teachers::try_handle,
    handlers::classes::try_handle,
    handlers::attendance::try_handle,
    handlers::assignments::try_handle,
    handlers::performance::try_handle,
    handlers::timetable::try_handle,
    handlers::messages::try_handle,
    handlers::resources::try_handle,
    handlers::leave::try_handle,
    handlers::fees::try_handle,
    handlers::notices::try_handle,
    handlers::orders::try_handle,
    handlers::attachments::try_handle,
    handlers::reports::try_handle,
    handlers::backup::try_handle,
];

pub fn handle_request(state: &mut AppState, req: Request) -> serde_json::Value {
    debug!(id = %req.id, method = %req.method, "dispatch");
    for handler in HANDLERS {
        if let Some(resp) = handler(state, &req) {
            return resp;
        }
    }

    err(
        &req.id,
        "not_implemented",
        format!("unknown method: {}", req.method),
        None,
    )
}
