//! Settings shared between crates.
//!
//! These are plain data; `clinic-policy` reads them from TOML as part of
//! `ClinicConfig`. Every field has a default so an empty file is valid.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// How `insert` synthesizes ids for payloads that carry none.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdStrategy {
    /// Decimal strings from a per-table counter that only moves forward.
    #[default]
    Sequential,
    /// Random v4 UUIDs.
    Uuid,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub id_strategy: IdStrategy,
}

/// Session simulation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Simulated network delay of `sign_out`.
    pub sign_out_latency_ms: u64,
    /// Simulated network delay of `update_password`.
    pub update_password_latency_ms: u64,
    /// Lifetime reported on issued sessions.
    pub token_ttl_secs: u64,
    /// JSON file holding self-registered users. In-memory when absent.
    pub pending_users_path: Option<PathBuf>,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            sign_out_latency_ms: 200,
            update_password_latency_ms: 300,
            token_ttl_secs: 3600,
            pending_users_path: None,
        }
    }
}

impl AuthSettings {
    /// Settings with every simulated delay disabled.
    pub fn immediate() -> Self {
        Self {
            sign_out_latency_ms: 0,
            update_password_latency_ms: 0,
            ..Self::default()
        }
    }
}
