//! Trigger resolution.

use anyhow::Result;

use crate::catalog_db::CatalogDb;
use crate::models::{CatalogEntry, MediaKind};

/// A trigger token matched to its catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub entry: CatalogEntry,
    pub kind: MediaKind,
}

/// Lowercase the token and look it up in each collection in [`MediaKind::ALL`]
/// order, so a word bound to both a movie and an album resolves to the movie.
pub fn resolve(catalog: &CatalogDb, token: &str) -> Result<Option<Resolved>> {
    let trigger_word = token.to_lowercase();
    for kind in MediaKind::ALL {
        if let Some(entry) = catalog.find_by_trigger(kind, &trigger_word)? {
            return Ok(Some(Resolved { entry, kind }));
        }
    }
    Ok(None)
}
