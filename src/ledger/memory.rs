//! In-memory ledger.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::{Ledger, ViolationRecord};
use crate::error::Result;

/// Volatile ledger holding records in memory.
///
/// Loses everything on restart, so it is only suitable for tests and for
/// deployments that accept audit loss. Appends never fail.
#[derive(Default)]
pub struct MemoryLedger {
    records: RwLock<Vec<ViolationRecord>>,
}

impl MemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of records held.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the ledger holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn append(&self, record: &ViolationRecord) -> Result<()> {
        self.records.write().push(record.clone());
        Ok(())
    }

    async fn query(
        &self,
        actor_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ViolationRecord>> {
        let records = self.records.read();
        let mut matched: Vec<ViolationRecord> = records
            .iter()
            .filter(|r| r.actor_id == actor_id && r.timestamp >= from && r.timestamp <= to)
            .cloned()
            .collect();
        matched.sort_by_key(|r| r.timestamp);
        Ok(matched)
    }
}
