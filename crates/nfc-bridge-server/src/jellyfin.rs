//! Jellyfin media directory client.
//!
//! Looks up users, searches a user's library, lists connected playback sessions
//! and sends "play now" commands. Every request carries the API key header.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::config::MediaServerSettings;
use crate::models::{Candidate, MediaKind, Session};

const TOKEN_HEADER: &str = "X-Emby-Token";

/// Capabilities the bridge needs from the remote media server.
#[async_trait]
pub trait MediaDirectory: Send + Sync {
    /// Resolve a username to its user id; `None` when no such user exists.
    async fn user_id(&self, username: &str) -> Result<Option<String>>;
    /// Recursive free-text search of one kind within a user's library.
    async fn search_items(&self, user_id: &str, text: &str, kind: MediaKind) -> Result<Vec<Candidate>>;
    /// Currently connected playback sessions.
    async fn list_sessions(&self) -> Result<Vec<Session>>;
    /// Ask a session to start playing an item immediately.
    async fn play_now(&self, session_id: &str, item_id: &str) -> Result<()>;
}

pub struct JellyfinClient {
    base_url: String,
    api_key: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UserDto {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ItemsDto {
    #[serde(default)]
    items: Vec<ItemDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ItemDto {
    id: String,
    name: String,
    production_year: Option<i32>,
    album_artist: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SessionDto {
    id: String,
    #[serde(default)]
    device_name: Option<String>,
    #[serde(default)]
    client: Option<String>,
    #[serde(default)]
    user_name: Option<String>,
}

impl JellyfinClient {
    pub fn new(settings: &MediaServerSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .context("build jellyfin http client")?;
        Ok(Self {
            base_url: settings.base_url.clone(),
            api_key: settings.api_key.clone(),
            client,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .get(&url)
            .header(TOKEN_HEADER, &self.api_key)
            .query(query)
            .send()
            .await
            .with_context(|| format!("GET {path}"))?;
        if !resp.status().is_success() {
            return Err(anyhow!("GET {path} failed with status {}", resp.status()));
        }
        resp.json::<T>()
            .await
            .with_context(|| format!("decode {path} response"))
    }
}

/// Label a search hit the way the Jellyfin UI does.
fn candidate_label(item: &ItemDto, kind: MediaKind) -> String {
    let suffix = match kind {
        MediaKind::Movie => item.production_year.map(|year| year.to_string()),
        MediaKind::Album => item.album_artist.clone().filter(|a| !a.trim().is_empty()),
    };
    format!("{} ({})", item.name, suffix.as_deref().unwrap_or("N/A"))
}

#[async_trait]
impl MediaDirectory for JellyfinClient {
    async fn user_id(&self, username: &str) -> Result<Option<String>> {
        let users: Vec<UserDto> = self.get_json("/Users", &[]).await?;
        Ok(users
            .into_iter()
            .find(|user| user.name == username)
            .map(|user| user.id))
    }

    async fn search_items(&self, user_id: &str, text: &str, kind: MediaKind) -> Result<Vec<Candidate>> {
        let path = format!("/Users/{}/Items", urlencoding::encode(user_id));
        let items: ItemsDto = self
            .get_json(
                &path,
                &[
                    ("SearchTerm", text),
                    ("IncludeItemTypes", kind.item_type()),
                    ("Recursive", "true"),
                ],
            )
            .await?;
        Ok(items
            .items
            .iter()
            .map(|item| Candidate {
                display_name: candidate_label(item, kind),
                item_id: item.id.clone(),
            })
            .collect())
    }

    async fn list_sessions(&self) -> Result<Vec<Session>> {
        let sessions: Vec<SessionDto> = self.get_json("/Sessions", &[]).await?;
        Ok(sessions
            .into_iter()
            .map(|s| Session {
                id: s.id,
                device_name: s.device_name.unwrap_or_default(),
                client_name: s.client.unwrap_or_default(),
                user_name: s.user_name.unwrap_or_default(),
            })
            .collect())
    }

    async fn play_now(&self, session_id: &str, item_id: &str) -> Result<()> {
        let path = format!("/Sessions/{}/Playing", urlencoding::encode(session_id));
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .post(&url)
            .header(TOKEN_HEADER, &self.api_key)
            .query(&[("PlayCommand", "PlayNow"), ("ItemIds", item_id)])
            .send()
            .await
            .with_context(|| format!("POST {path}"))?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("POST {path} failed with status {status}: {body}"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(production_year: Option<i32>, album_artist: Option<&str>) -> ItemDto {
        ItemDto {
            id: "id".to_string(),
            name: "Inception".to_string(),
            production_year,
            album_artist: album_artist.map(str::to_string),
        }
    }

    #[test]
    fn movie_label_uses_production_year() {
        assert_eq!(candidate_label(&item(Some(2010), None), MediaKind::Movie), "Inception (2010)");
        assert_eq!(candidate_label(&item(None, Some("x")), MediaKind::Movie), "Inception (N/A)");
    }

    #[test]
    fn album_label_uses_album_artist() {
        assert_eq!(
            candidate_label(&item(Some(1973), Some("Pink Floyd")), MediaKind::Album),
            "Inception (Pink Floyd)"
        );
        assert_eq!(candidate_label(&item(None, Some(" ")), MediaKind::Album), "Inception (N/A)");
    }

    #[test]
    fn items_payload_decodes_pascal_case() {
        let raw = r#"{"Items":[{"Id":"abc","Name":"Up","ProductionYear":2009}],"TotalRecordCount":1}"#;
        let items: ItemsDto = serde_json::from_str(raw).unwrap();
        assert_eq!(items.items.len(), 1);
        assert_eq!(items.items[0].production_year, Some(2009));
        assert_eq!(items.items[0].album_artist, None);
    }

    #[test]
    fn sessions_payload_tolerates_missing_fields() {
        let raw = r#"[{"Id":"S1","DeviceName":"TV","Client":"Jellyfin Android TV"},{"Id":"S2"}]"#;
        let sessions: Vec<SessionDto> = serde_json::from_str(raw).unwrap();
        assert_eq!(sessions[0].client.as_deref(), Some("Jellyfin Android TV"));
        assert_eq!(sessions[1].device_name, None);
    }
}
