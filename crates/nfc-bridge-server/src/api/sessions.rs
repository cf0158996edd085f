//! Session selection API handlers.

use actix_web::{get, post, web, HttpResponse, Responder};

use crate::api::{redirect_home, require_fields, ValidationError};
use crate::models::{MediaKind, SessionRef, SessionsResponse, SetActiveSessionForm};
use crate::session_registry::PersistOutcome;
use crate::state::AppState;

fn parse_slot(value: &str) -> Result<MediaKind, ValidationError> {
    MediaKind::from_slot(value).ok_or_else(|| ValidationError::invalid("type", "expected 'movie' or 'music'"))
}

/// Redirect when the change is durable, otherwise tell the operator it may be lost.
fn mutation_response(kind: MediaKind, outcome: PersistOutcome) -> HttpResponse {
    match outcome {
        PersistOutcome::Durable => redirect_home(),
        PersistOutcome::Uncertain(_) => HttpResponse::Ok().body(format!(
            "Active {} device updated, but the change could not be saved and may not survive a restart.",
            kind.slot()
        )),
    }
}

#[utoipa::path(
    get,
    path = "/sessions",
    responses(
        (status = 200, description = "Sessions connected to the media server", body = SessionsResponse),
        (status = 500, description = "Media server failure")
    )
)]
#[get("/sessions")]
/// List playback sessions currently connected to the media server.
pub async fn sessions_list(state: web::Data<AppState>) -> impl Responder {
    match state.directory.list_sessions().await {
        Ok(sessions) => HttpResponse::Ok().json(SessionsResponse { sessions }),
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "failed to fetch sessions");
            HttpResponse::InternalServerError()
                .body("Error connecting to Jellyfin. Check the server log for details.")
        }
    }
}

#[utoipa::path(
    post,
    path = "/set-active-session",
    request_body(content = SetActiveSessionForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Device selected"),
        (status = 200, description = "Device selected but not saved"),
        (status = 400, description = "Missing fields or unknown type")
    )
)]
#[post("/set-active-session")]
/// Select the device that receives play commands for a media kind.
pub async fn set_active_session(
    state: web::Data<AppState>,
    form: web::Form<SetActiveSessionForm>,
) -> impl Responder {
    let form = form.into_inner();
    let [session_id, device_name, client, slot] = match require_fields([
        ("sessionId", form.session_id.as_deref()),
        ("deviceName", form.device_name.as_deref()),
        ("client", form.client.as_deref()),
        ("type", form.kind.as_deref()),
    ]) {
        Ok(values) => values,
        Err(err) => return err.into_response(),
    };
    let kind = match parse_slot(slot) {
        Ok(kind) => kind,
        Err(err) => {
            tracing::warn!(slot, "invalid type for set active session");
            return err.into_response();
        }
    };
    let session = SessionRef {
        id: session_id.to_string(),
        device_name: device_name.to_string(),
        client_name: client.to_string(),
    };
    tracing::info!(slot = kind.slot(), device = %session.device_name, session_id = %session.id, "active session set");
    mutation_response(kind, state.sessions.select(kind, session))
}

#[utoipa::path(
    post,
    path = "/clear-active-session/{kind}",
    params(("kind" = String, Path, description = "`movie` or `music`")),
    responses(
        (status = 303, description = "Device cleared"),
        (status = 200, description = "Device cleared but not saved"),
        (status = 400, description = "Unknown type")
    )
)]
#[post("/clear-active-session/{kind}")]
/// Clear the selected device for a media kind.
pub async fn clear_active_session(
    state: web::Data<AppState>,
    slot: web::Path<String>,
) -> impl Responder {
    let kind = match parse_slot(slot.as_str()) {
        Ok(kind) => kind,
        Err(err) => {
            tracing::warn!(slot = %slot.as_str(), "invalid type for clear active session");
            return err.into_response();
        }
    };
    tracing::info!(slot = kind.slot(), "active session cleared");
    mutation_response(kind, state.sessions.clear(kind))
}
