//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! The loader, engine and persister call store methods; they never execute
//! SQL directly.

mod reference;
mod results;
mod seed;

use crate::error::BonusResult;
use rusqlite::Connection;

pub struct BonusStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl BonusStore {
    pub fn open(path: &str) -> BonusResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> BonusResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn, path: None })
    }

    /// Open whatever `database_path` names; `:memory:` gives a private
    /// in-memory database.
    pub fn open_configured(database_path: &str) -> BonusResult<Self> {
        if database_path == ":memory:" {
            Self::in_memory()
        } else {
            Self::open(database_path)
        }
    }

    /// File backing this store, None for in-memory databases.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> BonusResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_reference_data.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_bonus_results.sql"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_can_be_applied_twice() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bonus.db");
        let store = BonusStore::open(path.to_str().unwrap()).unwrap();
        store.migrate().unwrap();
        store.migrate().unwrap();
        assert_eq!(store.path(), path.to_str());
    }

    #[test]
    fn memory_path_opens_private_database() {
        let store = BonusStore::open_configured(":memory:").unwrap();
        store.migrate().unwrap();
        assert_eq!(store.path(), None);
        assert!(store.billing_entries().unwrap().is_empty());
    }
}
