pub mod memory;
pub mod settings_store;
pub mod transaction_store;

pub use memory::MemoryStore;
pub use settings_store::SettingsStore;
pub use transaction_store::TransactionStore;

use crate::error::Result;
use async_trait::async_trait;
use rusqlite::Connection;
use std::path::Path;
use tokio::sync::Mutex;

/// String key/value persistence for operator settings.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

pub struct Storage {
    conn: Mutex<Connection>,
}

impl Storage {
    pub async fn new(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let conn = Connection::open(db_path)?;
        Self::from_connection(conn).await
    }

    pub async fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn).await
    }

    async fn from_connection(conn: Connection) -> Result<Self> {
        let storage = Self {
            conn: Mutex::new(conn),
        };

        storage.init_schema().await?;
        Ok(storage)
    }

    async fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().await;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS transactions (
                id TEXT NOT NULL,
                reference TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                amount INTEGER NOT NULL,
                phone_number TEXT NOT NULL,
                external_reference TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_transactions_created
             ON transactions (created_at DESC)",
            [],
        )?;

        Ok(())
    }

    pub async fn get_connection(&self) -> tokio::sync::MutexGuard<'_, Connection> {
        self.conn.lock().await
    }
}
