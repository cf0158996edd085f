//! SQLite catalog store for trigger bindings.
//!
//! Provides pooled connections, schema bootstrap, and per-kind collections of
//! movies and albums with unique trigger words and item ids.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{CatalogEntry, MediaKind};

const SCHEMA_VERSION: i32 = 1;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const EXAMPLE_MOVIE: (&str, &str, &str) = (
    "Example Movie (2000)",
    "examplemovie",
    "1234567890abcdef1234567890abcdef",
);
const EXAMPLE_ALBUM: (&str, &str, &str) = (
    "Example Album (Artist)",
    "examplealbum",
    "abcdef1234567890abcdef1234567890",
);

/// Result of an insert attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(i64),
    /// Trigger word or item id already bound in this kind's collection.
    AlreadyExists,
}

#[derive(Clone)]
pub struct CatalogDb {
    pool: Pool<SqliteConnectionManager>,
}

fn table_for(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Movie => "movies",
        MediaKind::Album => "albums",
    }
}

fn map_entry_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CatalogEntry> {
    Ok(CatalogEntry {
        id: row.get(0)?,
        display_name: row.get(1)?,
        trigger_word: row.get(2)?,
        item_id: row.get(3)?,
    })
}

impl CatalogDb {
    pub fn new(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create catalog dir {:?}", parent))?;
        }

        let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
            conn.busy_timeout(BUSY_TIMEOUT)?;
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
            Ok(())
        });
        let pool = Pool::builder()
            .max_size(4)
            .build(manager)
            .context("create catalog db pool")?;

        {
            let conn = pool.get().context("open catalog db")?;
            init_schema(&conn)?;
        }

        Ok(Self { pool })
    }

    /// Insert a binding unless its trigger word or item id is already taken.
    ///
    /// The existing binding always wins; the caller learns about the conflict
    /// through [`InsertOutcome::AlreadyExists`].
    pub fn insert(
        &self,
        kind: MediaKind,
        display_name: &str,
        trigger_word: &str,
        item_id: &str,
    ) -> Result<InsertOutcome> {
        let conn = self.pool.get().context("open catalog db")?;
        insert_entry(&conn, kind, display_name, trigger_word, item_id)
    }

    pub fn find_by_trigger(&self, kind: MediaKind, trigger_word: &str) -> Result<Option<CatalogEntry>> {
        let conn = self.pool.get().context("open catalog db")?;
        let sql = format!(
            "SELECT id, display_name, trigger_word, item_id FROM {} WHERE trigger_word = ?1",
            table_for(kind)
        );
        conn.query_row(&sql, params![trigger_word], map_entry_row)
            .optional()
            .with_context(|| format!("lookup {kind} trigger"))
    }

    /// All bindings of a kind ordered by display name.
    pub fn list(&self, kind: MediaKind) -> Result<Vec<CatalogEntry>> {
        let conn = self.pool.get().context("open catalog db")?;
        let sql = format!(
            "SELECT id, display_name, trigger_word, item_id FROM {} ORDER BY display_name",
            table_for(kind)
        );
        let mut stmt = conn.prepare(&sql).context("prepare catalog list")?;
        let rows = stmt
            .query_map([], map_entry_row)
            .context("query catalog list")?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.context("read catalog row")?);
        }
        Ok(entries)
    }

    pub fn count(&self, kind: MediaKind) -> Result<i64> {
        let conn = self.pool.get().context("open catalog db")?;
        let sql = format!("SELECT COUNT(*) FROM {}", table_for(kind));
        conn.query_row(&sql, [], |row| row.get(0))
            .with_context(|| format!("count {kind} entries"))
    }

    /// Remove a binding by row id. Returns false when nothing matched.
    pub fn delete(&self, kind: MediaKind, id: i64) -> Result<bool> {
        let conn = self.pool.get().context("open catalog db")?;
        let sql = format!("DELETE FROM {} WHERE id = ?1", table_for(kind));
        let removed = conn
            .execute(&sql, params![id])
            .with_context(|| format!("delete {kind} entry"))?;
        Ok(removed > 0)
    }

    /// Insert the example movie and album into empty collections.
    pub fn seed_examples(&self) -> Result<()> {
        for (kind, (name, trigger, item_id)) in [
            (MediaKind::Movie, EXAMPLE_MOVIE),
            (MediaKind::Album, EXAMPLE_ALBUM),
        ] {
            if self.count(kind)? > 0 {
                continue;
            }
            if let InsertOutcome::Inserted(id) = self.insert(kind, name, trigger, item_id)? {
                tracing::info!(kind = %kind, id, trigger, "seeded example entry");
            }
        }
        Ok(())
    }
}

fn insert_entry(
    conn: &Connection,
    kind: MediaKind,
    display_name: &str,
    trigger_word: &str,
    item_id: &str,
) -> Result<InsertOutcome> {
    let sql = format!(
        "INSERT OR IGNORE INTO {} (display_name, trigger_word, item_id) VALUES (?1, ?2, ?3)",
        table_for(kind)
    );
    let changed = conn
        .execute(&sql, params![display_name, trigger_word, item_id])
        .with_context(|| format!("insert {kind} entry"))?;
    if changed == 0 {
        return Ok(InsertOutcome::AlreadyExists);
    }
    Ok(InsertOutcome::Inserted(conn.last_insert_rowid()))
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS movies (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            display_name TEXT NOT NULL,
            trigger_word TEXT NOT NULL UNIQUE,
            item_id TEXT NOT NULL UNIQUE
        );
        CREATE TABLE IF NOT EXISTS albums (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            display_name TEXT NOT NULL,
            trigger_word TEXT NOT NULL UNIQUE,
            item_id TEXT NOT NULL UNIQUE
        );
        "#,
    )
    .context("create catalog schema")?;

    let version: Option<String> = conn
        .query_row(
            "SELECT value FROM meta WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()
        .context("read schema version")?;
    if version.is_none() {
        conn.execute(
            "INSERT INTO meta (key, value) VALUES ('schema_version', ?1)",
            params![SCHEMA_VERSION.to_string()],
        )
        .context("write schema version")?;
    }
    Ok(())
}
