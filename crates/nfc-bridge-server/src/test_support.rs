//! In-process media server stand-in for tests.

use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::jellyfin::MediaDirectory;
use crate::models::{Candidate, MediaKind, Session};

#[derive(Default)]
pub(crate) struct FakeDirectory {
    /// `(name, id)` pairs returned by the user lookup.
    pub users: Vec<(String, String)>,
    pub items: Vec<Candidate>,
    pub sessions: Vec<Session>,
    pub fail_play: bool,
    pub fail_requests: bool,
    pub plays: Mutex<Vec<(String, String)>>,
    pub searches: Mutex<Vec<(String, String, MediaKind)>>,
}

impl FakeDirectory {
    pub(crate) fn with_user(name: &str, id: &str) -> Self {
        Self {
            users: vec![(name.to_string(), id.to_string())],
            ..Self::default()
        }
    }

    pub(crate) fn play_calls(&self) -> Vec<(String, String)> {
        self.plays.lock().unwrap().clone()
    }

    pub(crate) fn search_calls(&self) -> Vec<(String, String, MediaKind)> {
        self.searches.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaDirectory for FakeDirectory {
    async fn user_id(&self, username: &str) -> Result<Option<String>> {
        if self.fail_requests {
            return Err(anyhow!("connection refused"));
        }
        Ok(self
            .users
            .iter()
            .find(|(name, _)| name == username)
            .map(|(_, id)| id.clone()))
    }

    async fn search_items(&self, user_id: &str, text: &str, kind: MediaKind) -> Result<Vec<Candidate>> {
        if self.fail_requests {
            return Err(anyhow!("connection refused"));
        }
        self.searches
            .lock()
            .unwrap()
            .push((user_id.to_string(), text.to_string(), kind));
        Ok(self.items.clone())
    }

    async fn list_sessions(&self) -> Result<Vec<Session>> {
        if self.fail_requests {
            return Err(anyhow!("connection refused"));
        }
        Ok(self.sessions.clone())
    }

    async fn play_now(&self, session_id: &str, item_id: &str) -> Result<()> {
        self.plays
            .lock()
            .unwrap()
            .push((session_id.to_string(), item_id.to_string()));
        if self.fail_play {
            return Err(anyhow!("POST /Sessions/{session_id}/Playing failed: session offline"));
        }
        Ok(())
    }
}
