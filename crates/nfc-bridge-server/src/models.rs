//! API models and OpenAPI schemas.
//!
//! Defines the catalog, session and form structures shared by the bridge.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Classification of a catalog entry; selects the collection and the active-session slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Movie,
    Album,
}

impl MediaKind {
    /// Resolution order for trigger lookups: movies win ties.
    pub const ALL: [MediaKind; 2] = [MediaKind::Movie, MediaKind::Album];

    /// Active-session slot name used on the wire and in the config file.
    pub fn slot(self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Album => "music",
        }
    }

    /// Parse an active-session slot name (`movie` or `music`).
    pub fn from_slot(value: &str) -> Option<Self> {
        match value {
            "movie" => Some(MediaKind::Movie),
            "music" => Some(MediaKind::Album),
            _ => None,
        }
    }

    /// Jellyfin item type used to scope searches.
    pub fn item_type(self) -> &'static str {
        match self {
            MediaKind::Movie => "Movie",
            MediaKind::Album => "MusicAlbum",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Movie => f.write_str("movie"),
            MediaKind::Album => f.write_str("album"),
        }
    }
}

/// A stored binding between a trigger word and a media server item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CatalogEntry {
    /// Row id within the kind's collection.
    pub id: i64,
    /// Human readable label captured at commit time.
    pub display_name: String,
    /// Lowercased trigger word.
    pub trigger_word: String,
    /// Jellyfin item id.
    pub item_id: String,
}

/// Search result from the media directory, not yet bound to a trigger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Candidate {
    pub display_name: String,
    pub item_id: String,
}

/// Playback session reported live by the media server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Session {
    pub id: String,
    pub device_name: String,
    pub client_name: String,
    pub user_name: String,
}

/// Device selected to receive play commands for one media kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SessionRef {
    /// Jellyfin session id.
    pub id: String,
    /// Device name shown to the operator.
    pub device_name: String,
    /// Client application name.
    pub client_name: String,
}

/// One optional device per media kind.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ActiveSessions {
    #[serde(default)]
    pub movie: Option<SessionRef>,
    #[serde(default)]
    pub music: Option<SessionRef>,
}

impl ActiveSessions {
    pub fn get(&self, kind: MediaKind) -> Option<&SessionRef> {
        match kind {
            MediaKind::Movie => self.movie.as_ref(),
            MediaKind::Album => self.music.as_ref(),
        }
    }

    pub fn set(&mut self, kind: MediaKind, value: Option<SessionRef>) {
        match kind {
            MediaKind::Movie => self.movie = value,
            MediaKind::Album => self.music = value,
        }
    }
}

/// Overview returned by `GET /`.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct OverviewResponse {
    pub movies: Vec<CatalogEntry>,
    pub albums: Vec<CatalogEntry>,
    pub active_sessions: ActiveSessions,
}

/// Live session listing returned by `GET /sessions`.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionsResponse {
    pub sessions: Vec<Session>,
}

/// Candidate list returned by the search endpoints.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SearchResponse {
    pub kind: MediaKind,
    pub query: String,
    pub candidates: Vec<Candidate>,
}

/// `POST /search-movie` form.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct SearchMovieForm {
    #[serde(rename = "movieName")]
    pub movie_name: Option<String>,
}

/// `POST /search-music` form.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct SearchAlbumForm {
    #[serde(rename = "albumName")]
    pub album_name: Option<String>,
}

/// `POST /add-movie` form.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct AddMovieForm {
    pub movie: Option<String>,
    #[serde(rename = "jellyfinId")]
    pub jellyfin_id: Option<String>,
    pub trigger: Option<String>,
}

/// `POST /add-album` form.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct AddAlbumForm {
    pub album: Option<String>,
    #[serde(rename = "jellyfinId")]
    pub jellyfin_id: Option<String>,
    pub trigger: Option<String>,
}

/// `POST /set-active-session` form.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct SetActiveSessionForm {
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
    #[serde(rename = "deviceName")]
    pub device_name: Option<String>,
    pub client: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_names_round_trip_through_from_slot() {
        for kind in MediaKind::ALL {
            assert_eq!(MediaKind::from_slot(kind.slot()), Some(kind));
        }
        assert_eq!(MediaKind::from_slot("album"), None);
        assert_eq!(MediaKind::from_slot("MOVIE"), None);
    }

    #[test]
    fn active_sessions_set_only_touches_one_slot() {
        let mut sessions = ActiveSessions::default();
        let tv = SessionRef {
            id: "S1".to_string(),
            device_name: "TV".to_string(),
            client_name: "Jellyfin App".to_string(),
        };
        sessions.set(MediaKind::Album, Some(tv.clone()));
        assert_eq!(sessions.get(MediaKind::Album), Some(&tv));
        assert_eq!(sessions.get(MediaKind::Movie), None);
    }
}
