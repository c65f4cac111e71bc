use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

use crate::error::ApiError;
use crate::review::Critique;

/// What was paid for a review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMetadata {
    pub transaction_id: String,
    pub payer_address: String,
    pub network: String,
    /// microSTX, decimal string
    pub amount: String,
    pub pay_to: String,
}

/// A stored review. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    pub id: String,
    pub filename: String,
    pub review: Critique,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentMetadata>,
    /// RFC 3339
    pub created_at: String,
}

/// SQLite-backed review store
#[derive(Clone)]
pub struct ReviewStore {
    conn: Arc<Mutex<Connection>>,
}

const SELECT_COLUMNS: &str = "id, filename, review, payer_address, transaction_id, network, \
                              amount, pay_to, created_at";

impl ReviewStore {
    pub fn new(path: &str) -> Result<Self, ApiError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, ApiError> {
        self.conn
            .lock()
            .map_err(|_| ApiError::Internal("database lock poisoned".to_string()))
    }

    fn init_schema(&self) -> Result<(), ApiError> {
        let conn = self.lock()?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS reviews (
                id TEXT PRIMARY KEY,
                filename TEXT NOT NULL,
                review TEXT NOT NULL,
                payer_address TEXT,
                transaction_id TEXT,
                network TEXT,
                amount TEXT,
                pay_to TEXT,
                created_at TEXT NOT NULL
            )
            "#,
            [],
        )?;

        // Payer history lookups
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_reviews_payer ON reviews(payer_address, created_at)",
            [],
        )?;

        Ok(())
    }

    pub fn insert(&self, record: &ReviewRecord) -> Result<(), ApiError> {
        let review_json = serde_json::to_string(&record.review)
            .map_err(|e| ApiError::Internal(format!("failed to encode review: {e}")))?;
        let payment = record.payment.as_ref();

        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO reviews (id, filename, review, payer_address, transaction_id,
                                 network, amount, pay_to, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                record.id,
                record.filename,
                review_json,
                payment.map(|p| &p.payer_address),
                payment.map(|p| &p.transaction_id),
                payment.map(|p| &p.network),
                payment.map(|p| &p.amount),
                payment.map(|p| &p.pay_to),
                record.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Option<ReviewRecord>, ApiError> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                &format!("SELECT {SELECT_COLUMNS} FROM reviews WHERE id = ?1"),
                [id],
                row_to_raw,
            )
            .optional()?;
        row.map(RawRecord::into_record).transpose()
    }

    /// Reviews paid by `payer`, newest first.
    pub fn list_by_payer(&self, payer: &str, limit: u32) -> Result<Vec<ReviewRecord>, ApiError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM reviews WHERE payer_address = ?1 \
             ORDER BY created_at DESC, rowid DESC LIMIT ?2"
        ))?;
        let rows = stmt
            .query_map(params![payer, limit], row_to_raw)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(RawRecord::into_record).collect()
    }
}

struct RawRecord {
    id: String,
    filename: String,
    review: String,
    payer_address: Option<String>,
    transaction_id: Option<String>,
    network: Option<String>,
    amount: Option<String>,
    pay_to: Option<String>,
    created_at: String,
}

fn row_to_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRecord> {
    Ok(RawRecord {
        id: row.get(0)?,
        filename: row.get(1)?,
        review: row.get(2)?,
        payer_address: row.get(3)?,
        transaction_id: row.get(4)?,
        network: row.get(5)?,
        amount: row.get(6)?,
        pay_to: row.get(7)?,
        created_at: row.get(8)?,
    })
}

impl RawRecord {
    fn into_record(self) -> Result<ReviewRecord, ApiError> {
        let review: Critique = serde_json::from_str(&self.review)
            .map_err(|e| ApiError::Internal(format!("corrupt review {}: {e}", self.id)))?;

        let payment = match (self.transaction_id, self.payer_address) {
            (Some(transaction_id), Some(payer_address)) => Some(PaymentMetadata {
                transaction_id,
                payer_address,
                network: self.network.unwrap_or_default(),
                amount: self.amount.unwrap_or_default(),
                pay_to: self.pay_to.unwrap_or_default(),
            }),
            _ => None,
        };

        Ok(ReviewRecord {
            id: self.id,
            filename: self.filename,
            review,
            payment,
            created_at: self.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, payer: Option<&str>, created_at: &str) -> ReviewRecord {
        ReviewRecord {
            id: id.to_string(),
            filename: "cv.pdf".to_string(),
            review: Critique::placeholder(),
            payment: payer.map(|p| PaymentMetadata {
                transaction_id: format!("0x{id}"),
                payer_address: p.to_string(),
                network: "testnet".to_string(),
                amount: "100000".to_string(),
                pay_to: "ST_SERVER".to_string(),
            }),
            created_at: created_at.to_string(),
        }
    }

    fn store() -> (tempfile::TempDir, ReviewStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reviews.db");
        let store = ReviewStore::new(path.to_str().unwrap()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_insert_and_get() {
        let (_dir, store) = store();
        let r = record("a1", Some("ST_PAYER"), "2026-01-01T00:00:00Z");
        store.insert(&r).unwrap();

        assert_eq!(store.get("a1").unwrap(), Some(r));
        assert_eq!(store.get("missing").unwrap(), None);
    }

    #[test]
    fn test_unpaid_record_has_no_payment() {
        let (_dir, store) = store();
        store
            .insert(&record("free", None, "2026-01-01T00:00:00Z"))
            .unwrap();
        assert!(store.get("free").unwrap().unwrap().payment.is_none());
    }

    #[test]
    fn test_list_by_payer_newest_first() {
        let (_dir, store) = store();
        store
            .insert(&record("old", Some("ST_A"), "2026-01-01T00:00:00Z"))
            .unwrap();
        store
            .insert(&record("new", Some("ST_A"), "2026-02-01T00:00:00Z"))
            .unwrap();
        store
            .insert(&record("other", Some("ST_B"), "2026-03-01T00:00:00Z"))
            .unwrap();

        let ids: Vec<_> = store
            .list_by_payer("ST_A", 10)
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["new", "old"]);
        assert_eq!(store.list_by_payer("ST_A", 1).unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let (_dir, store) = store();
        let r = record("dup", None, "2026-01-01T00:00:00Z");
        store.insert(&r).unwrap();
        assert!(store.insert(&r).is_err());
    }
}
