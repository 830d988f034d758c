//! Limit configuration for Actionguard.
//!
//! Each [`ActionKind`] carries its own threshold and lockout tuning. The
//! mapping is a struct with one field per kind rather than a keyed lookup,
//! so an unconfigured action kind cannot exist at runtime.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::error::{GuardError, Result};
use crate::guard::ActionKind;

/// Tuning for a single action kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitRule {
    /// Attempts allowed per window before escalation
    pub threshold: u64,

    /// Length of the counting window in seconds
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Lockout duration for the first escalation, in seconds
    #[serde(default = "default_base_lockout_secs")]
    pub base_lockout_secs: u64,

    /// Upper bound on any lockout duration, in seconds
    #[serde(default = "default_max_lockout_secs")]
    pub max_lockout_secs: u64,
}

impl LimitRule {
    /// Length of the counting window.
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    /// Lockout duration for the first escalation.
    pub fn base_lockout(&self) -> Duration {
        Duration::from_secs(self.base_lockout_secs)
    }

    /// Upper bound on any lockout duration.
    pub fn max_lockout(&self) -> Duration {
        Duration::from_secs(self.max_lockout_secs)
    }
}

fn default_window_secs() -> u64 {
    60
}

fn default_base_lockout_secs() -> u64 {
    300
}

fn default_max_lockout_secs() -> u64 {
    86400
}

/// Per-action-kind limit configuration.
///
/// One [`LimitRule`] per kind, exhaustively. Missing fields in a config
/// file fall back to the built-in defaults for that kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Login attempt limits
    #[serde(default = "default_login_rule")]
    pub login: LimitRule,

    /// Privilege change limits
    #[serde(default = "default_privilege_change_rule")]
    pub privilege_change: LimitRule,

    /// Bulk export limits
    #[serde(default = "default_bulk_export_rule")]
    pub bulk_export: LimitRule,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            login: default_login_rule(),
            privilege_change: default_privilege_change_rule(),
            bulk_export: default_bulk_export_rule(),
        }
    }
}

fn default_login_rule() -> LimitRule {
    LimitRule {
        threshold: 5,
        window_secs: 60,
        base_lockout_secs: 300,
        max_lockout_secs: default_max_lockout_secs(),
    }
}

fn default_privilege_change_rule() -> LimitRule {
    LimitRule {
        threshold: 3,
        window_secs: 60,
        base_lockout_secs: 600,
        max_lockout_secs: default_max_lockout_secs(),
    }
}

fn default_bulk_export_rule() -> LimitRule {
    LimitRule {
        threshold: 10,
        window_secs: 3600,
        base_lockout_secs: 1800,
        max_lockout_secs: default_max_lockout_secs(),
    }
}

impl LimitsConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading limit configuration");

        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: LimitsConfig = serde_yaml::from_str(yaml)
            .map_err(|e| GuardError::Config(format!("Failed to parse limit config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Get the rule for an action kind.
    pub fn rule(&self, kind: ActionKind) -> &LimitRule {
        match kind {
            ActionKind::Login => &self.login,
            ActionKind::PrivilegeChange => &self.privilege_change,
            ActionKind::BulkExport => &self.bulk_export,
        }
    }

    /// Validate the configuration.
    ///
    /// Rejects zero thresholds, zero windows, and a base lockout longer
    /// than the maximum. Called at load time so bad tuning fails fast
    /// instead of surfacing mid-decision.
    pub fn validate(&self) -> Result<()> {
        for kind in ActionKind::ALL {
            let rule = self.rule(kind);
            if rule.threshold == 0 {
                return Err(GuardError::Config(format!(
                    "{}: threshold must be at least 1",
                    kind
                )));
            }
            if rule.window_secs == 0 {
                return Err(GuardError::Config(format!(
                    "{}: window_secs must be at least 1",
                    kind
                )));
            }
            if rule.base_lockout_secs > rule.max_lockout_secs {
                return Err(GuardError::Config(format!(
                    "{}: base_lockout_secs {} exceeds max_lockout_secs {}",
                    kind, rule.base_lockout_secs, rule.max_lockout_secs
                )));
            }
        }
        Ok(())
    }
}
