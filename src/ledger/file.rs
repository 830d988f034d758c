//! Durable file-backed ledger.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::{Ledger, ViolationRecord};
use crate::error::{GuardError, Result};

/// Ledger backed by an append-only JSON Lines file.
///
/// One record per line. The file is only ever opened for append, so
/// existing entries are never rewritten; records survive process
/// restarts. Queries re-read the file from the start, which keeps the
/// write path free of any index state.
pub struct FileLedger {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileLedger {
    /// Open (or create) a ledger file at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        info!(path = %path.display(), "Opened violation ledger");

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Path of the underlying ledger file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Ledger for FileLedger {
    async fn append(&self, record: &ViolationRecord) -> Result<()> {
        let line = serde_json::to_string(record)
            .map_err(|e| GuardError::Ledger(format!("Failed to encode record: {}", e)))?;

        let mut file = self.file.lock();
        writeln!(file, "{}", line)?;
        file.flush()?;
        Ok(())
    }

    async fn query(
        &self,
        actor_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ViolationRecord>> {
        let reader = BufReader::new(File::open(&self.path)?);
        let mut records = Vec::new();

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            // A torn final line from a crash must not block audit review
            let record: ViolationRecord = match serde_json::from_str(&line) {
                Ok(record) => record,
                Err(e) => {
                    warn!(
                        path = %self.path.display(),
                        line = line_no + 1,
                        error = %e,
                        "Skipping unreadable ledger line"
                    );
                    continue;
                }
            };

            if record.actor_id == actor_id && record.timestamp >= from && record.timestamp <= to {
                records.push(record);
            }
        }

        records.sort_by_key(|r| r.timestamp);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::{ActionKind, ActorKey, Decision, DenyReason};
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("actionguard-{}-{}.jsonl", name, uuid::Uuid::new_v4()))
    }

    fn deny_record(actor: &str, at: DateTime<Utc>) -> ViolationRecord {
        let key = ActorKey::new(actor, ActionKind::Login);
        ViolationRecord::from_decision(&key, Decision::Deny(DenyReason::Locked), 0, at).unwrap()
    }

    #[tokio::test]
    async fn test_append_and_query() {
        let path = temp_path("append");
        let ledger = FileLedger::open(&path).unwrap();

        ledger.append(&deny_record("alice", t0())).await.unwrap();
        ledger
            .append(&deny_record("alice", t0() + chrono::Duration::seconds(10)))
            .await
            .unwrap();
        ledger.append(&deny_record("bob", t0())).await.unwrap();

        let records = ledger
            .query("alice", t0(), t0() + chrono::Duration::seconds(60))
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));

        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let path = temp_path("reopen");
        {
            let ledger = FileLedger::open(&path).unwrap();
            ledger.append(&deny_record("alice", t0())).await.unwrap();
        }

        let ledger = FileLedger::open(&path).unwrap();
        ledger
            .append(&deny_record("alice", t0() + chrono::Duration::seconds(5)))
            .await
            .unwrap();

        let records = ledger
            .query("alice", t0(), t0() + chrono::Duration::seconds(60))
            .await
            .unwrap();
        assert_eq!(records.len(), 2);

        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn test_query_range_is_inclusive() {
        let path = temp_path("range");
        let ledger = FileLedger::open(&path).unwrap();

        ledger.append(&deny_record("alice", t0())).await.unwrap();
        ledger
            .append(&deny_record("alice", t0() + chrono::Duration::seconds(30)))
            .await
            .unwrap();
        ledger
            .append(&deny_record("alice", t0() + chrono::Duration::seconds(90)))
            .await
            .unwrap();

        let records = ledger
            .query("alice", t0(), t0() + chrono::Duration::seconds(30))
            .await
            .unwrap();
        assert_eq!(records.len(), 2);

        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn test_query_skips_corrupt_lines() {
        let path = temp_path("corrupt");
        let ledger = FileLedger::open(&path).unwrap();

        ledger.append(&deny_record("alice", t0())).await.unwrap();
        {
            let mut file = ledger.file.lock();
            writeln!(file, "{{\"truncated").unwrap();
        }
        ledger
            .append(&deny_record("alice", t0() + chrono::Duration::seconds(1)))
            .await
            .unwrap();

        let records = ledger
            .query("alice", t0(), t0() + chrono::Duration::seconds(60))
            .await
            .unwrap();
        assert_eq!(records.len(), 2);

        std::fs::remove_file(&path).ok();
    }
}
