use super::Storage;
use crate::error::{PaymentError, Result};
use crate::poller::StatusSink;
use crate::types::{TransactionRecord, TransactionReference, TransactionStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use std::sync::Arc;

/// Ledger of transactions initiated through this client.
#[derive(Clone)]
pub struct TransactionStore {
    storage: Arc<Storage>,
}

impl TransactionStore {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub async fn record(&self, record: &TransactionRecord) -> Result<()> {
        let conn = self.storage.get_connection().await;

        conn.execute(
            "INSERT OR REPLACE INTO transactions
             (id, reference, kind, amount, phone_number, external_reference, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                record.id,
                record.reference.as_str(),
                record.kind.as_str(),
                record.amount as i64,
                record.phone_number,
                record.external_reference,
                record.status.as_str(),
                record.created_at.timestamp_millis(),
                record.updated_at.timestamp_millis(),
            ],
        )?;

        Ok(())
    }

    /// Returns false when the reference was never recorded locally.
    pub async fn update_status(
        &self,
        reference: &TransactionReference,
        status: TransactionStatus,
    ) -> Result<bool> {
        let conn = self.storage.get_connection().await;

        let updated = conn.execute(
            "UPDATE transactions SET status = ?1, updated_at = ?2 WHERE reference = ?3",
            params![
                status.as_str(),
                Utc::now().timestamp_millis(),
                reference.as_str()
            ],
        )?;

        Ok(updated > 0)
    }

    pub async fn get(&self, reference: &TransactionReference) -> Result<TransactionRecord> {
        let conn = self.storage.get_connection().await;

        let mut stmt = conn.prepare(
            "SELECT id, reference, kind, amount, phone_number, external_reference, status, created_at, updated_at
             FROM transactions WHERE reference = ?1",
        )?;

        match stmt.query_row(params![reference.as_str()], row_to_record) {
            Ok(record) => Ok(record),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(PaymentError::TransactionNotFound {
                reference: reference.to_string(),
            }),
            Err(e) => Err(PaymentError::Storage(e)),
        }
    }

    /// Newest first.
    pub async fn list(&self, limit: usize) -> Result<Vec<TransactionRecord>> {
        let conn = self.storage.get_connection().await;

        let mut stmt = conn.prepare(
            "SELECT id, reference, kind, amount, phone_number, external_reference, status, created_at, updated_at
             FROM transactions ORDER BY created_at DESC LIMIT ?1",
        )?;

        let records = stmt
            .query_map(params![limit as i64], row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }
}

/// Poll results are mirrored into the ledger. A failed write is logged so the
/// poll itself keeps going.
#[async_trait]
impl StatusSink for TransactionStore {
    async fn record_status(&self, reference: &TransactionReference, status: TransactionStatus) {
        if let Err(e) = self.update_status(reference, status).await {
            tracing::warn!("Failed to record status {} for {}: {}", status, reference, e);
        }
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<TransactionRecord> {
    let kind: String = row.get(2)?;
    let status: String = row.get(6)?;

    Ok(TransactionRecord {
        id: row.get(0)?,
        reference: TransactionReference::new(row.get::<_, String>(1)?),
        kind: kind.parse().map_err(|_| {
            rusqlite::Error::InvalidColumnType(2, "kind".to_string(), rusqlite::types::Type::Text)
        })?,
        amount: row.get::<_, i64>(3)? as u64,
        phone_number: row.get(4)?,
        external_reference: row.get(5)?,
        status: status.parse().map_err(|_| {
            rusqlite::Error::InvalidColumnType(6, "status".to_string(), rusqlite::types::Type::Text)
        })?,
        created_at: millis_to_datetime(row.get(7)?),
        updated_at: millis_to_datetime(row.get(8)?),
    })
}

fn millis_to_datetime(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransactionKind;
    use chrono::Duration;

    fn record(reference: &str, kind: TransactionKind, age_secs: i64) -> TransactionRecord {
        let created_at = Utc::now() - Duration::seconds(age_secs);
        TransactionRecord {
            id: uuid::Uuid::new_v4().to_string(),
            reference: TransactionReference::new(reference),
            kind,
            amount: 20,
            phone_number: "254712345678".to_string(),
            external_reference: format!("trivia_{}", created_at.timestamp_millis()),
            status: TransactionStatus::Queued,
            created_at,
            updated_at: created_at,
        }
    }

    #[tokio::test]
    async fn test_record_and_update() {
        let store = TransactionStore::new(Arc::new(Storage::in_memory().await.unwrap()));
        let reference = TransactionReference::new("ref-1");

        store
            .record(&record("ref-1", TransactionKind::Deposit, 0))
            .await
            .unwrap();
        assert!(store
            .update_status(&reference, TransactionStatus::Success)
            .await
            .unwrap());

        let loaded = store.get(&reference).await.unwrap();
        assert_eq!(loaded.status, TransactionStatus::Success);
        assert_eq!(loaded.kind, TransactionKind::Deposit);
        assert_eq!(loaded.amount, 20);
    }

    #[tokio::test]
    async fn test_unknown_reference() {
        let store = TransactionStore::new(Arc::new(Storage::in_memory().await.unwrap()));
        let reference = TransactionReference::new("missing");

        assert!(!store
            .update_status(&reference, TransactionStatus::Failed)
            .await
            .unwrap());
        assert!(matches!(
            store.get(&reference).await,
            Err(PaymentError::TransactionNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let store = TransactionStore::new(Arc::new(Storage::in_memory().await.unwrap()));

        store
            .record(&record("old", TransactionKind::Deposit, 120))
            .await
            .unwrap();
        store
            .record(&record("new", TransactionKind::Withdrawal, 0))
            .await
            .unwrap();

        let records = store.list(10).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].reference.as_str(), "new");
        assert_eq!(records[1].reference.as_str(), "old");

        assert_eq!(store.list(1).await.unwrap().len(), 1);
    }
}
