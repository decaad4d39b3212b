//! The top-level TOML configuration.
//!
//! Every section is optional:
//!
//! ```toml
//! [store]
//! id_strategy = "sequential"   # or "uuid"
//!
//! [auth]
//! sign_out_latency_ms = 200
//! update_password_latency_ms = 300
//! token_ttl_secs = 3600
//! pending_users_path = "pending_users.json"
//!
//! [[rules]]
//! id = "reception-no-delete"
//! role = "reception"
//! action = "delete"
//! table = "*"
//! verdict = "deny"
//! ```

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use clinic_contracts::{
    config::{AuthSettings, StoreSettings},
    error::{ClinicError, ClinicResult},
};
use clinic_core::Store;

use crate::{engine::TomlAccessPolicy, rule::AccessRule};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClinicConfig {
    pub store: StoreSettings,
    pub auth: AuthSettings,
    /// Ordered access rules. First match wins.
    pub rules: Vec<AccessRule>,
}

impl ClinicConfig {
    /// Returns `ClinicError::ConfigError` if `s` is not valid TOML or does not
    /// fit the schema.
    pub fn from_toml_str(s: &str) -> ClinicResult<Self> {
        toml::from_str(s).map_err(|e| ClinicError::ConfigError {
            reason: format!("failed to parse config TOML: {}", e),
        })
    }

    pub fn from_file(path: &Path) -> ClinicResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ClinicError::ConfigError {
            reason: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// The access policy, or `None` when no rules are configured.
    pub fn access_policy(&self) -> Option<TomlAccessPolicy> {
        if self.rules.is_empty() {
            None
        } else {
            Some(TomlAccessPolicy::new(self.rules.clone()))
        }
    }

    /// An empty store using the configured id strategy and access rules.
    pub fn build_store(&self) -> Store {
        let store = Store::with_strategy(self.store.id_strategy);
        match self.access_policy() {
            Some(policy) => store.with_policy(Arc::new(policy)),
            None => store,
        }
    }
}
