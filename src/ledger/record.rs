//! Violation record type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::guard::{ActionKind, ActorKey, Decision};

/// The recorded outcome of a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationOutcome {
    /// The attempt was denied during an active lockout
    Deny,
    /// The attempt breached the threshold and started a lockout
    Escalate,
}

/// One denied or escalated attempt, immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationRecord {
    /// Unique record id
    pub id: Uuid,
    /// The actor whose attempt was refused
    pub actor_id: String,
    /// The kind of action attempted
    pub kind: ActionKind,
    /// When the decision was made
    pub timestamp: DateTime<Utc>,
    /// The decision that triggered this record
    pub outcome: ViolationOutcome,
    /// Counter value at the time of the violation
    pub count: u64,
    /// Lockout duration in seconds, present for escalations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lockout_secs: Option<u64>,
}

impl ViolationRecord {
    /// Build a record from a decision.
    ///
    /// Returns `None` for [`Decision::Allow`]; allowed attempts are not
    /// violations and leave no trace in the ledger.
    pub fn from_decision(
        key: &ActorKey,
        decision: Decision,
        count: u64,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        let (outcome, lockout_secs) = match decision {
            Decision::Allow => return None,
            Decision::Deny(_) => (ViolationOutcome::Deny, None),
            Decision::Escalate(lockout) => (ViolationOutcome::Escalate, Some(lockout.as_secs())),
        };

        Some(Self {
            id: Uuid::new_v4(),
            actor_id: key.actor_id.clone(),
            kind: key.kind,
            timestamp: now,
            outcome,
            count,
            lockout_secs,
        })
    }
}
