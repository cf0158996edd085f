//! Trigger endpoint hit by NFC tag scans.

use actix_web::{get, web, HttpResponse, Responder};

use crate::dispatcher::dispatch;
use crate::resolver::resolve;
use crate::state::AppState;

const COMMAND_SENT_PAGE: &str = "<!DOCTYPE html><html><head><title>Command Sent</title></head>\
<body><p>Playback command sent. This window will now close.</p>\
<script>window.close();</script></body></html>";

#[utoipa::path(
    get,
    path = "/{trigger_word}",
    params(
        ("trigger_word" = String, Path, description = "Trigger word, matched case-insensitively")
    ),
    responses(
        (status = 200, description = "Play command sent"),
        (status = 400, description = "No active device for the resolved kind"),
        (status = 404, description = "Unknown trigger word"),
        (status = 500, description = "Media server failure")
    )
)]
#[get("/{trigger_word}")]
/// Resolve a trigger word and start playback on the active device for its kind.
pub async fn trigger_play(
    state: web::Data<AppState>,
    trigger_word: web::Path<String>,
) -> impl Responder {
    let token = trigger_word.into_inner().to_lowercase();
    let resolved = match resolve(&state.catalog, &token) {
        Ok(Some(resolved)) => resolved,
        Ok(None) => {
            tracing::info!(trigger = %token, "unknown trigger");
            return HttpResponse::NotFound()
                .body(format!("No item found with the trigger word: {token}"));
        }
        Err(err) => {
            tracing::error!(trigger = %token, error = %format!("{err:#}"), "catalog lookup failed");
            return HttpResponse::InternalServerError().body("catalog unavailable");
        }
    };

    match dispatch(
        &state.sessions,
        state.directory.as_ref(),
        &resolved.entry,
        resolved.kind,
    )
    .await
    {
        Ok(_) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(COMMAND_SENT_PAGE),
        Err(err) => err.into_response(),
    }
}
