//! Access rule types.
//!
//! Rules are evaluated in declaration order and the first match wins. If no
//! rule matches, the engine denies by default.

use serde::{Deserialize, Serialize};

/// The decision a rule produces when it matches.
///
/// Written in TOML as `verdict = "allow"` or `verdict = "deny"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleVerdict {
    Allow,
    Deny,
}

/// A single access rule loaded from TOML.
///
/// `role`, `action` and `table` each accept the wildcard `"*"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessRule {
    /// Stable identifier used in log lines and denial reasons.
    pub id: String,

    #[serde(default)]
    pub description: String,

    /// Role pattern, e.g. `"reception"`.
    pub role: String,

    /// Action pattern: `read`, `insert`, `update`, `delete` or `"*"`.
    pub action: String,

    /// Table pattern, e.g. `"patients"`.
    pub table: String,

    pub verdict: RuleVerdict,

    /// Reported when `verdict = "deny"`. Defaults to a message naming the rule.
    pub deny_reason: Option<String>,
}

impl AccessRule {
    /// Exact, case-sensitive match on each field unless the rule has `"*"`.
    pub fn matches(&self, role: &str, action: &str, table: &str) -> bool {
        let hit = |pattern: &str, value: &str| pattern == "*" || pattern == value;
        hit(&self.role, role) && hit(&self.action, action) && hit(&self.table, table)
    }
}
