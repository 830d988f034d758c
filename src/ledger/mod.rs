//! Append-only audit trail of denied and escalated attempts.

mod file;
mod memory;
mod record;
mod writer;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;

pub use file::FileLedger;
pub use memory::MemoryLedger;
pub use record::{ViolationOutcome, ViolationRecord};
pub use writer::LedgerWriter;

/// Trait for violation ledger backends.
///
/// Implementations must treat appended records as immutable: no
/// overwrites, no deletions. Retention is an external concern.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Append a violation record.
    async fn append(&self, record: &ViolationRecord) -> Result<()>;

    /// Fetch the records for an actor within `[from, to]`, ordered by
    /// ascending timestamp.
    async fn query(
        &self,
        actor_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ViolationRecord>>;
}
