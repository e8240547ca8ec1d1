use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{Connection, OptionalExtension, params};

/// Expiring string key-value store, standing in for the site's cookie jar.
/// Favorites live under the `favorites` key, custom link overrides under
/// `link_<id>`; the store treats every value as an opaque string.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create store directory {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open store at {}", path.display()))?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    pub fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                expires_at TEXT NOT NULL
            );
            "#,
        )?;
        self.purge_expired(Utc::now())?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        self.get_at(key, Utc::now())
    }

    fn get_at(&self, key: &str, now: DateTime<Utc>) -> Result<Option<String>> {
        let row: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT value, expires_at FROM kv_store WHERE key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((value, expires_at)) = row else {
            return Ok(None);
        };
        match DateTime::parse_from_rfc3339(&expires_at) {
            Ok(expiry) if expiry > now => Ok(Some(value)),
            // Expired or unreadable expiry both read as absent.
            _ => Ok(None),
        }
    }

    pub fn set(&self, key: &str, value: &str, ttl_days: i64) -> Result<()> {
        self.set_at(key, value, ttl_days, Utc::now())
    }

    fn set_at(&self, key: &str, value: &str, ttl_days: i64, now: DateTime<Utc>) -> Result<()> {
        let expires_at = (now + Duration::days(ttl_days)).to_rfc3339();
        self.conn.execute(
            r#"
            INSERT INTO kv_store (key, value, expires_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                expires_at = excluded.expires_at
            "#,
            params![key, value, expires_at],
        )?;
        Ok(())
    }

    pub fn delete(&self, key: &str) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(deleted > 0)
    }

    fn purge_expired(&self, now: DateTime<Utc>) -> Result<()> {
        self.conn.execute(
            "DELETE FROM kv_store WHERE expires_at <= ?1",
            params![now.to_rfc3339()],
        )?;
        Ok(())
    }
}
