use utoipa::OpenApi;

use crate::api;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::health::health,
        api::catalog::overview,
        api::catalog::search_movie,
        api::catalog::search_music,
        api::catalog::add_movie,
        api::catalog::add_album,
        api::catalog::delete_movie,
        api::catalog::delete_album,
        api::sessions::sessions_list,
        api::sessions::set_active_session,
        api::sessions::clear_active_session,
        api::trigger::trigger_play,
    ),
    components(
        schemas(
            models::MediaKind,
            models::CatalogEntry,
            models::Candidate,
            models::Session,
            models::SessionRef,
            models::ActiveSessions,
            models::OverviewResponse,
            models::SessionsResponse,
            models::SearchResponse,
            models::SearchMovieForm,
            models::SearchAlbumForm,
            models::AddMovieForm,
            models::AddAlbumForm,
            models::SetActiveSessionForm,
            api::health::HealthResponse,
        )
    ),
    tags(
        (name = "nfc-bridge-server", description = "NFC trigger to Jellyfin playback bridge")
    )
)]
pub struct ApiDoc;
