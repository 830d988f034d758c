//! Core guard implementation.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, trace};

use super::counter::CounterStore;
use super::key::{ActionKind, ActorKey};
use super::policy::{self, Decision, DenyReason, LockoutState};
use crate::clock::Clock;
use crate::config::LimitsConfig;
use crate::error::Result;
use crate::ledger::{Ledger, LedgerWriter, ViolationRecord};

/// Position of a key in the guard's state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardStatus {
    /// No attempts in the current window, no active lockout
    Clear,
    /// Attempts recorded but still under the threshold
    Warned,
    /// Inside an active lockout interval
    Locked,
}

/// The admin action guard.
///
/// Single entry point for rate limiting sensitive administrative
/// operations: counts attempts per actor and action kind, escalates
/// lockouts on threshold breaches, and records every refusal in the
/// violation ledger. Thread-safe and intended to be shared behind an
/// `Arc` across request handlers.
///
/// Counter and lockout state are in-memory; a restart resets throttling
/// but never audit history, which lives in the ledger.
pub struct ActionGuard {
    /// Per-action-kind limit rules
    config: LimitsConfig,
    /// Time source, injectable for tests
    clock: Arc<dyn Clock>,
    /// Sliding-window attempt counters
    counters: CounterStore,
    /// Lockout state indexed by actor key
    lockouts: DashMap<ActorKey, LockoutState>,
    /// Ledger backend, queried directly for audit review
    ledger: Arc<dyn Ledger>,
    /// Deferred append queue feeding the ledger
    writer: LedgerWriter,
}

impl ActionGuard {
    /// Create a new guard.
    ///
    /// Validates the configuration and spawns the ledger writer task, so
    /// this must run inside a tokio runtime. Fails on invalid limit
    /// tuning rather than guarding with bad numbers.
    pub fn new(config: LimitsConfig, clock: Arc<dyn Clock>, ledger: Arc<dyn Ledger>) -> Result<Self> {
        config.validate()?;
        let writer = LedgerWriter::spawn(Arc::clone(&ledger));
        info!("Action guard initialized");

        Ok(Self {
            config,
            clock,
            counters: CounterStore::new(),
            lockouts: DashMap::new(),
            ledger,
            writer,
        })
    }

    /// Check whether an actor may perform a sensitive action.
    ///
    /// Counts the attempt against the actor's window unless the key is
    /// already locked out; a locked key is denied without the attempt
    /// counting. Denials and escalations are recorded in the ledger
    /// without blocking the returned decision.
    #[instrument(skip(self), fields(actor_id = %actor_id, kind = %kind))]
    pub async fn check(&self, actor_id: &str, kind: ActionKind) -> Decision {
        let now = self.clock.now();
        let key = ActorKey::new(actor_id, kind);
        let rule = self.config.rule(kind);

        // Active lockout short-circuits before anything counts as an attempt
        if let Some(state) = self.lockouts.get(&key) {
            if state.is_locked(now) {
                drop(state);
                debug!(key = %key, "Attempt denied during active lockout");
                let decision = Decision::Deny(DenyReason::Locked);
                let count = self.counters.peek(&key, now, rule.window()).unwrap_or(0);
                self.record_violation(&key, decision, count, now);
                return decision;
            }
        }

        let count = self.counters.increment_and_get(&key, now, rule.window());
        let decision = {
            let mut state = self.lockouts.entry(key.clone()).or_default();
            policy::evaluate(count, &mut state, rule, now)
        };

        match decision {
            Decision::Allow => {
                trace!(key = %key, count, "Attempt allowed");
            }
            Decision::Deny(reason) => {
                debug!(key = %key, count, reason = %reason, "Attempt denied");
                self.record_violation(&key, decision, count, now);
            }
            Decision::Escalate(lockout) => {
                info!(
                    key = %key,
                    count,
                    lockout_secs = lockout.as_secs(),
                    "Threshold breached, lockout escalated"
                );
                self.record_violation(&key, decision, count, now);
            }
        }

        decision
    }

    fn record_violation(&self, key: &ActorKey, decision: Decision, count: u64, now: DateTime<Utc>) {
        if let Some(record) = ViolationRecord::from_decision(key, decision, count, now) {
            self.writer.record(record);
        }
    }

    /// Administratively reset a key after verified human intervention.
    ///
    /// Clears the escalation level, any active lockout, and the attempt
    /// counter. The only way the escalation level ever decreases. A key
    /// with no state is a logged no-op, not an error. Idempotent.
    pub fn reset(&self, actor_id: &str, kind: ActionKind) {
        let key = ActorKey::new(actor_id, kind);
        let had_counter = self.counters.reset(&key);
        let had_lockout = self.lockouts.remove(&key).is_some();

        if had_counter || had_lockout {
            info!(key = %key, "Administrative reset");
        } else {
            debug!(key = %key, "Reset for unknown key ignored");
        }
    }

    /// Fetch the violation records for an actor within `[from, to]`,
    /// ordered by ascending timestamp.
    pub async fn query_violations(
        &self,
        actor_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ViolationRecord>> {
        self.ledger.query(actor_id, from, to).await
    }

    /// Read the state machine position for a key without recording an
    /// attempt.
    pub fn status(&self, actor_id: &str, kind: ActionKind) -> GuardStatus {
        let now = self.clock.now();
        let key = ActorKey::new(actor_id, kind);

        if let Some(state) = self.lockouts.get(&key) {
            if state.is_locked(now) {
                return GuardStatus::Locked;
            }
        }

        let rule = self.config.rule(kind);
        match self.counters.peek(&key, now, rule.window()) {
            Some(count) if count > 0 => GuardStatus::Warned,
            _ => GuardStatus::Clear,
        }
    }

    /// Wait until every violation recorded so far has reached the ledger.
    ///
    /// Useful before shutdown and in tests; `check` itself never waits.
    pub async fn flush_ledger(&self) {
        self.writer.flush().await;
    }

    /// Get the number of keys with an active counter.
    pub fn key_count(&self) -> usize {
        self.counters.len()
    }

    /// Clear all counters and lockout state.
    ///
    /// This is primarily useful for testing.
    pub fn clear(&self) {
        self.counters.clear();
        self.lockouts.clear();
    }
}
