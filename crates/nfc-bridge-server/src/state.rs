//! Shared application state.
//!
//! Holds the catalog store, the active session registry and the media server
//! client handed to every request handler.

use std::sync::Arc;

use crate::catalog_db::CatalogDb;
use crate::jellyfin::MediaDirectory;
use crate::session_registry::ActiveSessionRegistry;

pub struct AppState {
    pub catalog: CatalogDb,
    pub sessions: ActiveSessionRegistry,
    pub directory: Arc<dyn MediaDirectory>,
    /// Jellyfin user whose library backs catalog searches.
    pub target_username: String,
}

impl AppState {
    pub fn new(
        catalog: CatalogDb,
        sessions: ActiveSessionRegistry,
        directory: Arc<dyn MediaDirectory>,
        target_username: String,
    ) -> Self {
        Self {
            catalog,
            sessions,
            directory,
            target_username,
        }
    }
}
