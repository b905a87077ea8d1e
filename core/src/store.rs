//! SQLite persistence layer for out-of-session state.
//!
//! RULE: Only store.rs talks to the database.
//! The case manager and the theme preference go through these methods —
//! no other module executes SQL.
//!
//! The layout is a single key-value table: the case list lives as a
//! JSON array under CASE_LIST_KEY, the theme under THEME_KEY.

use crate::error::EngineResult;
use rusqlite::{params, Connection, OptionalExtension};

/// Fixed key holding the serialized case list.
pub const CASE_LIST_KEY: &str = "fraud_cases";
/// Fixed key holding the persisted theme preference.
pub const THEME_KEY: &str = "theme";

pub struct KvStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl KvStore {
    pub fn open(path: &str) -> EngineResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        let store = Self {
            conn,
            path: Some(path.to_string()),
        };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> EngineResult<Self> {
        let conn = Connection::open(":memory:")?;
        let store = Self { conn, path: None };
        store.migrate()?;
        Ok(store)
    }

    /// Reopen a new connection to the same database.
    /// For in-memory databases, this returns a new isolated database.
    pub fn reopen(&self) -> EngineResult<Self> {
        match &self.path {
            Some(p) => Self::open(p),
            None => Self::in_memory(),
        }
    }

    fn migrate(&self) -> EngineResult<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> EngineResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn put(&self, key: &str, value: &str) -> EngineResult<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn delete(&self, key: &str) -> EngineResult<()> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    // ── Theme preference ───────────────────────────────────────

    pub fn theme(&self) -> EngineResult<Option<String>> {
        self.get(THEME_KEY)
    }

    pub fn set_theme(&self, theme: &str) -> EngineResult<()> {
        self.put(THEME_KEY, theme)
    }
}
