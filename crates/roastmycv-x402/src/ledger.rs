//! Replay ledger for direct-transfer proofs.
//!
//! A Stacks transaction pays for exactly one gated action. The gate claims
//! the transaction id before accepting; the claim is permanent unless the
//! downstream action fails and the caller releases it.

use dashmap::DashMap;
use std::sync::Mutex;
use std::time::Instant;

/// Normalize a transaction id so `0xABC`, `abc` and ` 0xabc ` collide.
pub fn normalize_txid(txid: &str) -> String {
    let t = txid.trim().to_ascii_lowercase();
    t.strip_prefix("0x").map(String::from).unwrap_or(t)
}

/// Storage backend for claimed transaction ids.
///
/// Implementations must be thread-safe (`Send + Sync`).
pub trait ProofLedger: Send + Sync {
    /// Has this transaction already paid for something?
    fn is_claimed(&self, txid: &str) -> bool;

    /// Atomically claim an unused transaction id.
    /// Returns `false` if it was already claimed (replay attempt).
    fn try_claim(&self, txid: &str) -> bool;

    /// Give a claimed id back so the payer can retry after a downstream failure.
    fn release(&self, txid: &str);
}

/// In-memory ledger backed by DashMap. Lost on restart.
pub struct InMemoryLedger {
    claims: DashMap<String, Instant>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            claims: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl ProofLedger for InMemoryLedger {
    fn is_claimed(&self, txid: &str) -> bool {
        self.claims.contains_key(&normalize_txid(txid))
    }

    fn try_claim(&self, txid: &str) -> bool {
        use dashmap::mapref::entry::Entry;
        match self.claims.entry(normalize_txid(txid)) {
            Entry::Occupied(_) => false,
            Entry::Vacant(v) => {
                v.insert(Instant::now());
                true
            }
        }
    }

    fn release(&self, txid: &str) {
        self.claims.remove(&normalize_txid(txid));
    }
}

/// Persistent ledger backed by SQLite. Survives restarts.
pub struct SqliteLedger {
    conn: Mutex<rusqlite::Connection>,
}

impl SqliteLedger {
    /// Open (or create) the ledger table in the database at `path`.
    pub fn open(path: &str) -> Result<Self, rusqlite::Error> {
        let conn = rusqlite::Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
            CREATE TABLE IF NOT EXISTS claimed_transactions (
                txid TEXT PRIMARY KEY,
                claimed_at INTEGER NOT NULL
            );",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// `Ok(false)` on a replay, `Err` when the database itself failed.
    fn claim(&self, txid: &str) -> Result<bool, rusqlite::Error> {
        let conn = self.lock();
        // PRIMARY KEY makes the insert the atomic check.
        match conn.execute(
            "INSERT INTO claimed_transactions (txid, claimed_at) VALUES (?1, ?2)",
            rusqlite::params![normalize_txid(txid), unix_now()],
        ) {
            Ok(_) => Ok(true),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, rusqlite::Connection> {
        match self.conn.lock() {
            Ok(c) => c,
            Err(poisoned) => {
                tracing::error!("ledger mutex poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

impl ProofLedger for SqliteLedger {
    fn is_claimed(&self, txid: &str) -> bool {
        let conn = self.lock();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM claimed_transactions WHERE txid = ?1",
                [normalize_txid(txid)],
                |row| row.get(0),
            )
            // Database error = treat as claimed.
            .unwrap_or(1);
        count > 0
    }

    fn try_claim(&self, txid: &str) -> bool {
        match self.claim(txid) {
            Ok(claimed) => claimed,
            Err(e) => {
                // Fail closed.
                tracing::error!(txid = %txid, error = %e, "ledger write failed, refusing claim");
                false
            }
        }
    }

    fn release(&self, txid: &str) {
        let conn = self.lock();
        if let Err(e) = conn.execute(
            "DELETE FROM claimed_transactions WHERE txid = ?1",
            [normalize_txid(txid)],
        ) {
            tracing::error!(error = %e, "failed to release transaction claim; it stays consumed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_txid() {
        assert_eq!(normalize_txid(" 0xABC "), "abc");
        assert_eq!(normalize_txid("abc"), "abc");
    }

    #[test]
    fn test_in_memory_try_claim_atomic() {
        let ledger = InMemoryLedger::new();
        assert!(ledger.try_claim("0xabc"));
        assert!(!ledger.try_claim("0xABC"));
        assert!(!ledger.try_claim("abc"));
        assert!(ledger.is_claimed("abc"));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_in_memory_release_allows_retry() {
        let ledger = InMemoryLedger::new();
        assert!(ledger.try_claim("0x01"));
        ledger.release("0x01");
        assert!(!ledger.is_claimed("0x01"));
        assert!(ledger.try_claim("0x01"));
    }

    #[test]
    fn test_sqlite_try_claim_atomic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");
        let ledger = SqliteLedger::open(path.to_str().unwrap()).unwrap();

        assert!(!ledger.is_claimed("0x99"));
        assert!(ledger.try_claim("0x99"));
        assert!(!ledger.try_claim("0x99"));
        assert!(ledger.is_claimed("99"));
    }

    #[test]
    fn test_sqlite_claims_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");

        {
            let ledger = SqliteLedger::open(path.to_str().unwrap()).unwrap();
            assert!(ledger.try_claim("0xaa"));
        }

        {
            let ledger = SqliteLedger::open(path.to_str().unwrap()).unwrap();
            assert!(ledger.is_claimed("0xaa"));
            assert!(!ledger.try_claim("0xaa"));
        }
    }

    #[test]
    fn test_sqlite_release() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");
        let ledger = SqliteLedger::open(path.to_str().unwrap()).unwrap();

        assert!(ledger.try_claim("0xbb"));
        ledger.release("0xbb");
        assert!(ledger.try_claim("0xbb"));
    }

    #[test]
    fn test_sqlite_storage_fault_is_not_a_replay() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");
        let ledger = SqliteLedger::open(path.to_str().unwrap()).unwrap();

        assert!(ledger.claim("0xcc").unwrap());
        assert!(!ledger.claim("0xcc").unwrap());

        ledger
            .lock()
            .execute("DROP TABLE claimed_transactions", [])
            .unwrap();
        assert!(ledger.claim("0xdd").is_err());
        assert!(!ledger.try_claim("0xdd"));
    }
}
