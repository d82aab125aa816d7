//! Persistent lyrics cache.
//!
//! SQLite table keyed by the folded (title, artist) of a normalized query.
//! Only found lyrics are stored, so a row that missed is asked again on the
//! next run.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::NormalizedQuery;
use crate::normalize::fold_key;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS lyrics_cache (
        title_key  TEXT NOT NULL,
        artist_key TEXT NOT NULL,
        lyrics     TEXT NOT NULL,
        fetched_at INTEGER NOT NULL,
        PRIMARY KEY (title_key, artist_key)
    );
";

pub struct LyricsCache {
    conn: Connection,
}

/// Cache key for a query: folded title and artist.
pub fn cache_key(query: &NormalizedQuery) -> (String, String) {
    (fold_key(&query.search_title), fold_key(&query.search_artist))
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

impl LyricsCache {
    /// Open (or create) a cache database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open lyrics cache {}", path.display()))?;
        Self::from_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)
            .context("Failed to create lyrics cache schema")?;
        Ok(Self { conn })
    }

    pub fn get(&self, query: &NormalizedQuery) -> rusqlite::Result<Option<String>> {
        let (title_key, artist_key) = cache_key(query);
        self.conn
            .query_row(
                "SELECT lyrics FROM lyrics_cache WHERE title_key = ?1 AND artist_key = ?2",
                params![title_key, artist_key],
                |row| row.get(0),
            )
            .optional()
    }

    pub fn put(&self, query: &NormalizedQuery, lyrics: &str) -> rusqlite::Result<()> {
        let (title_key, artist_key) = cache_key(query);
        self.conn.execute(
            "INSERT OR REPLACE INTO lyrics_cache (title_key, artist_key, lyrics, fetched_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![title_key, artist_key, lyrics, unix_now()],
        )?;
        Ok(())
    }

    pub fn len(&self) -> rusqlite::Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM lyrics_cache", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
