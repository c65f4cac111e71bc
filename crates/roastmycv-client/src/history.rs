//! Local copy of completed reviews, one JSON file per review.
//!
//! Files are named `cv-review-<id>.json` so the directory mirrors the keys
//! the web UI keeps in browser storage.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

const FILE_PREFIX: &str = "cv-review-";
const FILE_SUFFIX: &str = ".json";

/// What the client paid for a review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    pub tx_id: String,
    /// Amount in microSTX.
    pub amount: u64,
    pub recipient: String,
}

/// A review as kept on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredReview {
    pub id: String,
    pub filename: String,
    pub review: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentReceipt>,
    pub created_at: String,
}

/// The verdict scores inside a critique.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub clarity: u8,
    pub impact: u8,
    pub hireability: u8,
    #[serde(default)]
    pub critical_change: String,
}

impl StoredReview {
    pub fn verdict(&self) -> Option<Verdict> {
        let verdict = self.review.get("finalVerdict")?;
        serde_json::from_value(verdict.clone()).ok()
    }

    /// Mean of the three verdict scores.
    pub fn average_score(&self) -> Option<f64> {
        self.verdict().map(|v| {
            (f64::from(v.clarity) + f64::from(v.impact) + f64::from(v.hireability)) / 3.0
        })
    }

    fn sort_key(&self) -> Option<chrono::DateTime<chrono::FixedOffset>> {
        chrono::DateTime::parse_from_rfc3339(&self.created_at).ok()
    }
}

/// Directory-backed review history.
#[derive(Debug, Clone)]
pub struct LocalHistory {
    dir: PathBuf,
}

impl LocalHistory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path a review with `id` is stored at.
    pub fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{FILE_PREFIX}{id}{FILE_SUFFIX}"))
    }

    pub fn save(&self, review: &StoredReview) -> Result<PathBuf, ClientError> {
        if !is_valid_id(&review.id) {
            return Err(ClientError::InvalidResponse(format!(
                "unusable review id: {:?}",
                review.id
            )));
        }
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(&review.id);
        std::fs::write(&path, serde_json::to_vec_pretty(review)?)?;
        tracing::debug!(path = %path.display(), "saved review");
        Ok(path)
    }

    pub fn get(&self, id: &str) -> Result<Option<StoredReview>, ClientError> {
        if !is_valid_id(id) {
            return Ok(None);
        }
        match std::fs::read(self.path_for(id)) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// All saved reviews, newest first. Unreadable files are skipped.
    pub fn list(&self) -> Result<Vec<StoredReview>, ClientError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut reviews = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_review = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with(FILE_PREFIX) && n.ends_with(FILE_SUFFIX))
                .unwrap_or(false);
            if !is_review {
                continue;
            }
            let parsed = std::fs::read(&path)
                .map_err(ClientError::from)
                .and_then(|bytes| serde_json::from_slice::<StoredReview>(&bytes).map_err(Into::into));
            match parsed {
                Ok(review) => reviews.push(review),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping unreadable review"),
            }
        }

        reviews.sort_by(|a, b| {
            b.sort_key()
                .cmp(&a.sort_key())
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(reviews)
    }
}

fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn review(id: &str, created_at: &str, scores: (u8, u8, u8)) -> StoredReview {
        StoredReview {
            id: id.to_string(),
            filename: "cv.pdf".to_string(),
            review: json!({
                "hardTruth": "Generic.",
                "finalVerdict": {
                    "clarity": scores.0,
                    "impact": scores.1,
                    "hireability": scores.2,
                    "criticalChange": "Quantify results"
                }
            }),
            payment: Some(PaymentReceipt {
                tx_id: "0xabc".to_string(),
                amount: 100_000,
                recipient: "ST1RECIPIENT".to_string(),
            }),
            created_at: created_at.to_string(),
        }
    }

    #[test]
    fn test_save_and_get() {
        let dir = tempfile::tempdir().unwrap();
        let history = LocalHistory::new(dir.path());
        let stored = review("abc-123", "2026-01-02T03:04:05.000Z", (6, 4, 5));

        let path = history.save(&stored).unwrap();
        assert_eq!(path.file_name().unwrap(), "cv-review-abc-123.json");
        assert_eq!(history.get("abc-123").unwrap(), Some(stored));
        assert_eq!(history.get("missing").unwrap(), None);
        assert_eq!(history.get("../etc/passwd").unwrap(), None);
    }

    #[test]
    fn test_list_newest_first_and_skips_junk() {
        let dir = tempfile::tempdir().unwrap();
        let history = LocalHistory::new(dir.path());
        history
            .save(&review("old", "2026-01-01T00:00:00.000Z", (1, 1, 1)))
            .unwrap();
        history
            .save(&review("new", "2026-03-01T00:00:00.000Z", (9, 9, 9)))
            .unwrap();
        std::fs::write(dir.path().join("cv-review-broken.json"), b"{").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"ignore me").unwrap();

        let ids: Vec<_> = history.list().unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["new", "old"]);
    }

    #[test]
    fn test_list_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let history = LocalHistory::new(dir.path().join("nope"));
        assert!(history.list().unwrap().is_empty());
    }

    #[test]
    fn test_average_score() {
        let r = review("a", "2026-01-01T00:00:00Z", (6, 4, 5));
        assert_eq!(r.average_score(), Some(5.0));
        assert_eq!(r.verdict().unwrap().critical_change, "Quantify results");

        let mut shapeless = r.clone();
        shapeless.review = json!({"hardTruth": "x"});
        assert_eq!(shapeless.average_score(), None);
    }
}
