//! Actor key generation and handling.

use serde::{Deserialize, Serialize};

/// Category of sensitive administrative operation being rate-limited.
///
/// This is a closed set: every kind has a limit rule in
/// [`LimitsConfig`](crate::config::LimitsConfig), so an unknown action
/// kind cannot reach the guard at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Authentication attempts
    Login,
    /// Grants or revocations of privileges
    PrivilegeChange,
    /// Bulk data exports
    BulkExport,
}

impl ActionKind {
    /// All action kinds, for exhaustive iteration.
    pub const ALL: [ActionKind; 3] = [
        ActionKind::Login,
        ActionKind::PrivilegeChange,
        ActionKind::BulkExport,
    ];

    /// Stable lowercase name, matching the configuration file keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Login => "login",
            ActionKind::PrivilegeChange => "privilege_change",
            ActionKind::BulkExport => "bulk_export",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A key that uniquely identifies one rate-limited resource.
///
/// The key is the pair of an actor identity and the kind of action the
/// actor is attempting. Counters and lockout state are tracked per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActorKey {
    /// Opaque actor identifier, pre-authenticated upstream
    pub actor_id: String,
    /// The kind of action being attempted
    pub kind: ActionKind,
}

impl ActorKey {
    /// Create a new actor key.
    pub fn new(actor_id: &str, kind: ActionKind) -> Self {
        Self {
            actor_id: actor_id.to_string(),
            kind,
        }
    }
}

impl std::fmt::Display for ActorKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.actor_id, self.kind)
    }
}
