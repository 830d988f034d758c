//! Lockout policy evaluation.
//!
//! Pure decision logic: given the attempt count for the current window,
//! the key's lockout history, and the limit rule for the action kind,
//! produce a [`Decision`]. All time comes in as an argument, so the policy
//! has no hidden clock and unit tests need no real delays.

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::config::LimitRule;

/// Why an attempt was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// The key is inside an active lockout interval
    Locked,
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DenyReason::Locked => write!(f, "locked"),
        }
    }
}

/// Outcome of a rate limit check.
///
/// Derived fresh per call, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The attempt may proceed
    Allow,
    /// The attempt is denied
    Deny(DenyReason),
    /// The threshold was breached; a new lockout of the given duration starts
    Escalate(Duration),
}

impl Decision {
    /// Whether the caller may proceed with the action.
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Lockout history for a single actor key.
#[derive(Debug, Clone, Default)]
pub struct LockoutState {
    /// Consecutive lockouts served without an administrative reset
    pub escalation_level: u32,
    /// End of the active lockout, if any
    pub locked_until: Option<DateTime<Utc>>,
}

impl LockoutState {
    /// Create a clear state with no history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the key is inside an active lockout interval.
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        match self.locked_until {
            Some(until) => now < until,
            None => false,
        }
    }
}

/// Evaluate the policy for one attempt.
///
/// Rules, in order: an active lockout denies unconditionally; a count at
/// or under the threshold allows; anything above the threshold escalates,
/// bumping the escalation level and starting a lockout of
/// `base * 2^(level - 1)`, capped at the rule's maximum. The escalation
/// level persists after the lockout expires, so repeat offenders lock out
/// for longer each time.
pub fn evaluate(
    count: u64,
    state: &mut LockoutState,
    rule: &LimitRule,
    now: DateTime<Utc>,
) -> Decision {
    if state.is_locked(now) {
        return Decision::Deny(DenyReason::Locked);
    }

    if count <= rule.threshold {
        return Decision::Allow;
    }

    state.escalation_level += 1;
    let lockout = lockout_duration(rule, state.escalation_level);
    state.locked_until = Some(now + chrono::Duration::seconds(lockout.as_secs() as i64));
    Decision::Escalate(lockout)
}

/// Lockout duration for a given escalation level: exponential doubling
/// from the base, capped at the rule's maximum.
pub fn lockout_duration(rule: &LimitRule, escalation_level: u32) -> Duration {
    let exp = escalation_level.saturating_sub(1).min(62);
    let secs = rule
        .base_lockout_secs
        .saturating_mul(1u64 << exp)
        .min(rule.max_lockout_secs);
    Duration::from_secs(secs)
}
