//! Catalog API handlers: overview, search, add and delete bindings.

use actix_web::{get, post, web, HttpResponse, Responder};

use crate::api::{redirect_home, require_fields, ValidationError};
use crate::ingestion::{self, CommitOutcome, RejectReason};
use crate::models::{
    AddAlbumForm,
    AddMovieForm,
    Candidate,
    MediaKind,
    OverviewResponse,
    SearchAlbumForm,
    SearchMovieForm,
    SearchResponse,
};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Catalog and active devices", body = OverviewResponse),
        (status = 500, description = "Catalog unavailable")
    )
)]
#[get("/")]
/// List both catalogs and the active device per kind.
pub async fn overview(state: web::Data<AppState>) -> impl Responder {
    let listed = state
        .catalog
        .list(MediaKind::Movie)
        .and_then(|movies| Ok((movies, state.catalog.list(MediaKind::Album)?)));
    match listed {
        Ok((movies, albums)) => HttpResponse::Ok().json(OverviewResponse {
            movies,
            albums,
            active_sessions: state.sessions.snapshot(),
        }),
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "catalog list failed");
            HttpResponse::InternalServerError().body("catalog unavailable")
        }
    }
}

async fn search_kind(state: &AppState, kind: MediaKind, query: &str) -> HttpResponse {
    match ingestion::search(state.directory.as_ref(), &state.target_username, kind, query).await {
        Ok(candidates) => HttpResponse::Ok().json(SearchResponse {
            kind,
            query: query.to_string(),
            candidates,
        }),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/search-movie",
    request_body(content = SearchMovieForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Movie candidates (may be empty)", body = SearchResponse),
        (status = 400, description = "Missing search text"),
        (status = 404, description = "Target user not found"),
        (status = 500, description = "Media server failure")
    )
)]
#[post("/search-movie")]
/// Search the media server for movies.
pub async fn search_movie(
    state: web::Data<AppState>,
    form: web::Form<SearchMovieForm>,
) -> impl Responder {
    let form = form.into_inner();
    let [query] = match require_fields([("movieName", form.movie_name.as_deref())]) {
        Ok(values) => values,
        Err(err) => return err.into_response(),
    };
    search_kind(&state, MediaKind::Movie, query).await
}

#[utoipa::path(
    post,
    path = "/search-music",
    request_body(content = SearchAlbumForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Album candidates (may be empty)", body = SearchResponse),
        (status = 400, description = "Missing search text"),
        (status = 404, description = "Target user not found"),
        (status = 500, description = "Media server failure")
    )
)]
#[post("/search-music")]
/// Search the media server for albums.
pub async fn search_music(
    state: web::Data<AppState>,
    form: web::Form<SearchAlbumForm>,
) -> impl Responder {
    let form = form.into_inner();
    let [query] = match require_fields([("albumName", form.album_name.as_deref())]) {
        Ok(values) => values,
        Err(err) => return err.into_response(),
    };
    search_kind(&state, MediaKind::Album, query).await
}

fn commit_kind(state: &AppState, kind: MediaKind, candidate: Candidate, trigger: &str) -> HttpResponse {
    match ingestion::commit(&state.catalog, kind, &candidate, trigger) {
        Ok(CommitOutcome::Committed { .. })
        | Ok(CommitOutcome::Rejected(RejectReason::AlreadyExists)) => redirect_home(),
        Ok(CommitOutcome::Rejected(RejectReason::Unroutable)) => ValidationError::invalid(
            "trigger",
            "must be a single path segment and not a reserved route name",
        )
        .into_response(),
        Err(err) => {
            tracing::error!(kind = %kind, error = %format!("{err:#}"), "catalog insert failed");
            HttpResponse::InternalServerError().body(format!("Failed to add {kind} to the database."))
        }
    }
}

#[utoipa::path(
    post,
    path = "/add-movie",
    request_body(content = AddMovieForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Binding stored, or already present"),
        (status = 400, description = "Missing fields or unusable trigger word"),
        (status = 500, description = "Catalog failure")
    )
)]
#[post("/add-movie")]
/// Bind a movie to a trigger word.
pub async fn add_movie(state: web::Data<AppState>, form: web::Form<AddMovieForm>) -> impl Responder {
    let form = form.into_inner();
    let [name, item_id, trigger] = match require_fields([
        ("movie", form.movie.as_deref()),
        ("jellyfinId", form.jellyfin_id.as_deref()),
        ("trigger", form.trigger.as_deref()),
    ]) {
        Ok(values) => values,
        Err(err) => return err.into_response(),
    };
    let candidate = Candidate {
        display_name: name.to_string(),
        item_id: item_id.to_string(),
    };
    commit_kind(&state, MediaKind::Movie, candidate, trigger)
}

#[utoipa::path(
    post,
    path = "/add-album",
    request_body(content = AddAlbumForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Binding stored, or already present"),
        (status = 400, description = "Missing fields or unusable trigger word"),
        (status = 500, description = "Catalog failure")
    )
)]
#[post("/add-album")]
/// Bind an album to a trigger word.
pub async fn add_album(state: web::Data<AppState>, form: web::Form<AddAlbumForm>) -> impl Responder {
    let form = form.into_inner();
    let [name, item_id, trigger] = match require_fields([
        ("album", form.album.as_deref()),
        ("jellyfinId", form.jellyfin_id.as_deref()),
        ("trigger", form.trigger.as_deref()),
    ]) {
        Ok(values) => values,
        Err(err) => return err.into_response(),
    };
    let candidate = Candidate {
        display_name: name.to_string(),
        item_id: item_id.to_string(),
    };
    commit_kind(&state, MediaKind::Album, candidate, trigger)
}

fn delete_kind(state: &AppState, kind: MediaKind, raw_id: &str) -> HttpResponse {
    let Ok(id) = raw_id.parse::<i64>() else {
        tracing::debug!(kind = %kind, id = raw_id, "ignoring delete for non-numeric id");
        return redirect_home();
    };
    match state.catalog.delete(kind, id) {
        Ok(removed) => {
            tracing::info!(kind = %kind, id, removed, "delete binding");
            redirect_home()
        }
        Err(err) => {
            tracing::error!(kind = %kind, id, error = %format!("{err:#}"), "catalog delete failed");
            HttpResponse::InternalServerError().body("catalog unavailable")
        }
    }
}

#[utoipa::path(
    post,
    path = "/delete-movie/{id}",
    params(("id" = String, Path, description = "Movie binding id")),
    responses((status = 303, description = "Binding removed (or already absent)"))
)]
#[post("/delete-movie/{id}")]
/// Remove a movie binding.
pub async fn delete_movie(state: web::Data<AppState>, id: web::Path<String>) -> impl Responder {
    delete_kind(&state, MediaKind::Movie, &id)
}

#[utoipa::path(
    post,
    path = "/delete-album/{id}",
    params(("id" = String, Path, description = "Album binding id")),
    responses((status = 303, description = "Binding removed (or already absent)"))
)]
#[post("/delete-album/{id}")]
/// Remove an album binding.
pub async fn delete_album(state: web::Data<AppState>, id: web::Path<String>) -> impl Responder {
    delete_kind(&state, MediaKind::Album, &id)
}
