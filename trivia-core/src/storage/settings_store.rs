use super::{KeyValueStore, Storage};
use crate::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use std::sync::Arc;

/// SQLite-backed settings table.
pub struct SettingsStore {
    storage: Arc<Storage>,
}

impl SettingsStore {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub async fn list(&self) -> Result<Vec<(String, String)>> {
        let conn = self.storage.get_connection().await;

        let mut stmt = conn.prepare("SELECT key, value FROM settings ORDER BY key")?;
        let settings = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(settings)
    }
}

#[async_trait]
impl KeyValueStore for SettingsStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.storage.get_connection().await;

        let value = conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.storage.get_connection().await;

        conn.execute(
            "INSERT OR REPLACE INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)",
            params![key, value, Utc::now().timestamp()],
        )?;

        Ok(())
    }
}
