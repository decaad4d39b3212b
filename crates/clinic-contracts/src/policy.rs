//! Access verdict and evaluation context types.
//!
//! An access policy consumes an `AccessContext` and produces an
//! `AccessVerdict`. Stores without a policy skip the check entirely.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of operation a terminal query call performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessAction {
    Read,
    Insert,
    Update,
    Delete,
}

impl AccessAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessAction::Read => "read",
            AccessAction::Insert => "insert",
            AccessAction::Update => "update",
            AccessAction::Delete => "delete",
        }
    }
}

impl fmt::Display for AccessAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The decision an access policy returns for one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessVerdict {
    Allow,
    Deny { reason: String },
}

/// Everything an access policy needs to decide.
///
/// All fields are plain strings so rules can be written with wildcards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessContext {
    /// Role of the caller (e.g. "admin", "reception"), or "anonymous".
    pub role: String,
    /// Operation kind (`AccessAction::as_str`).
    pub action: String,
    /// Target table name.
    pub table: String,
}
