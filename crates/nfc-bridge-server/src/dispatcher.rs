//! Playback dispatch to the active device of a media kind.

use actix_web::HttpResponse;

use crate::jellyfin::MediaDirectory;
use crate::models::{CatalogEntry, MediaKind, SessionRef};
use crate::session_registry::ActiveSessionRegistry;

/// Why a play command was not delivered.
#[derive(Debug)]
pub enum DispatchError {
    /// No device selected for the entry's kind; the upstream was not contacted.
    NoActiveDevice { kind: MediaKind },
    /// The media server call failed. `detail` is for logs only.
    UpstreamFailure { detail: String },
}

impl DispatchError {
    /// Convert a dispatch error into an HTTP response.
    pub fn into_response(self) -> HttpResponse {
        match self {
            DispatchError::NoActiveDevice { kind } => HttpResponse::BadRequest().body(format!(
                "No active {slot} device has been selected. Open /sessions and select a device for {slot} playback.",
                slot = kind.slot()
            )),
            DispatchError::UpstreamFailure { .. } => HttpResponse::InternalServerError()
                .body("Failed to send playback command. Check the server log for details."),
        }
    }
}

/// Send `entry` to the device selected for `kind`.
///
/// Failures are reported once and never retried; the user can scan again.
pub async fn dispatch(
    registry: &ActiveSessionRegistry,
    directory: &dyn MediaDirectory,
    entry: &CatalogEntry,
    kind: MediaKind,
) -> Result<SessionRef, DispatchError> {
    let Some(session) = registry.get(kind) else {
        tracing::warn!(kind = %kind, trigger = %entry.trigger_word, "no active device for kind");
        return Err(DispatchError::NoActiveDevice { kind });
    };

    tracing::info!(
        kind = %kind,
        item = %entry.display_name,
        device = %session.device_name,
        session_id = %session.id,
        "sending play command"
    );
    match directory.play_now(&session.id, &entry.item_id).await {
        Ok(()) => Ok(session),
        Err(err) => {
            let detail = format!("{err:#}");
            tracing::error!(
                kind = %kind,
                session_id = %session.id,
                item_id = %entry.item_id,
                error = %detail,
                "play command failed"
            );
            Err(DispatchError::UpstreamFailure { detail })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActiveSessions;
    use crate::test_support::FakeDirectory;

    fn entry() -> CatalogEntry {
        CatalogEntry {
            id: 1,
            display_name: "Example Album (Artist)".to_string(),
            trigger_word: "examplealbum".to_string(),
            item_id: "abcdef".to_string(),
        }
    }

    fn speaker() -> SessionRef {
        SessionRef {
            id: "S9".to_string(),
            device_name: "Kitchen".to_string(),
            client_name: "Finamp".to_string(),
        }
    }

    #[actix_web::test]
    async fn missing_device_never_calls_upstream() {
        let registry = ActiveSessionRegistry::new(ActiveSessions::default(), None);
        let directory = FakeDirectory::default();
        let err = dispatch(&registry, &directory, &entry(), MediaKind::Album)
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::NoActiveDevice { kind: MediaKind::Album }));
        assert!(directory.play_calls().is_empty());
    }

    #[actix_web::test]
    async fn sends_item_to_selected_session() {
        let registry = ActiveSessionRegistry::new(
            ActiveSessions { movie: None, music: Some(speaker()) },
            None,
        );
        let directory = FakeDirectory::default();
        let session = dispatch(&registry, &directory, &entry(), MediaKind::Album)
            .await
            .unwrap();
        assert_eq!(session, speaker());
        assert_eq!(directory.play_calls(), vec![("S9".to_string(), "abcdef".to_string())]);
    }

    #[actix_web::test]
    async fn upstream_error_is_classified_once() {
        let registry = ActiveSessionRegistry::new(
            ActiveSessions { movie: None, music: Some(speaker()) },
            None,
        );
        let directory = FakeDirectory {
            fail_play: true,
            ..FakeDirectory::default()
        };
        let err = dispatch(&registry, &directory, &entry(), MediaKind::Album)
            .await
            .unwrap_err();
        let DispatchError::UpstreamFailure { detail } = err else {
            panic!("expected upstream failure");
        };
        assert!(detail.contains("session offline"));
        assert_eq!(directory.play_calls().len(), 1);
    }

    #[actix_web::test]
    async fn upstream_failure_response_hides_detail() {
        let resp = DispatchError::UpstreamFailure {
            detail: "http://jellyfin.lan:8096/Sessions api_key=secret".to_string(),
        }
        .into_response();
        assert_eq!(resp.status(), actix_web::http::StatusCode::INTERNAL_SERVER_ERROR);
        let body = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
        assert!(!String::from_utf8_lossy(&body).contains("jellyfin.lan"));
    }
}
