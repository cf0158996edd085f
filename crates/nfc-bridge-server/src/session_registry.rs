//! Active session registry.
//!
//! Holds at most one selected playback device per media kind and writes the
//! selection back to the config file after every change.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Result;

use crate::config::{self, ServerConfig};
use crate::models::{ActiveSessions, MediaKind, SessionRef};

/// Durability of a registry mutation. The in-memory change is applied either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    Durable,
    /// The change may not survive a restart.
    Uncertain(String),
}

pub struct ActiveSessionRegistry {
    slots: Mutex<ActiveSessions>,
    config_path: Option<PathBuf>,
}

impl ActiveSessionRegistry {
    pub fn new(initial: ActiveSessions, config_path: Option<PathBuf>) -> Self {
        Self {
            slots: Mutex::new(initial),
            config_path,
        }
    }

    /// Build the registry from an already parsed config.
    pub fn from_config(cfg: &ServerConfig, config_path: &Path) -> Self {
        let initial = cfg.active_sessions.clone().unwrap_or_default();
        for kind in MediaKind::ALL {
            if let Some(session) = initial.get(kind) {
                tracing::info!(
                    slot = kind.slot(),
                    session_id = %session.id,
                    device = %session.device_name,
                    client = %session.client_name,
                    "restored active session"
                );
            }
        }
        Self::new(initial, Some(config_path.to_path_buf()))
    }

    /// Read the config file and restore the persisted selections.
    pub fn load(config_path: &Path) -> Result<Self> {
        let cfg = ServerConfig::load(config_path)?;
        Ok(Self::from_config(&cfg, config_path))
    }

    pub fn get(&self, kind: MediaKind) -> Option<SessionRef> {
        self.lock().get(kind).cloned()
    }

    pub fn snapshot(&self) -> ActiveSessions {
        self.lock().clone()
    }

    /// Make `session` the device for `kind`, replacing any previous selection.
    pub fn select(&self, kind: MediaKind, session: SessionRef) -> PersistOutcome {
        self.apply(kind, Some(session))
    }

    pub fn clear(&self, kind: MediaKind) -> PersistOutcome {
        self.apply(kind, None)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ActiveSessions> {
        self.slots.lock().unwrap_or_else(|err| err.into_inner())
    }

    // The write happens while the lock is held so no reader sees memory and
    // disk disagree between two requests.
    fn apply(&self, kind: MediaKind, value: Option<SessionRef>) -> PersistOutcome {
        let mut slots = self.lock();
        slots.set(kind, value);
        self.persist(&slots)
    }

    fn persist(&self, sessions: &ActiveSessions) -> PersistOutcome {
        let Some(path) = self.config_path.as_ref() else {
            tracing::warn!("config path unavailable; active sessions kept in memory only");
            return PersistOutcome::Uncertain("config path unavailable".to_string());
        };
        match config::update_active_sessions(path, sessions) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "active sessions saved");
                PersistOutcome::Durable
            }
            Err(err) => {
                tracing::error!(path = %path.display(), error = %format!("{err:#}"), "failed to save active sessions");
                PersistOutcome::Uncertain(format!("{err:#}"))
            }
        }
    }
}
