//! # clinic-policy
//!
//! TOML configuration for the clinic data layer, and a deny-by-default role
//! access policy built from the same file.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use clinic_policy::ClinicConfig;
//!
//! let config = ClinicConfig::from_file(Path::new("clinic.toml"))?;
//! let store = config.build_store();
//! let reception = store.acting_as("reception");
//! ```
//!
//! ## Rule matching
//!
//! Each rule names a `role`, an `action` and a `table`; each accepts the
//! wildcard `"*"`. Rules apply in declaration order and the first match wins.
//! A configuration with no rules attaches no policy at all.

pub mod config;
pub mod engine;
pub mod rule;

pub use config::ClinicConfig;
pub use engine::TomlAccessPolicy;
pub use rule::{AccessRule, RuleVerdict};

// ── Tests ─────────────────────────────────────────────────────────────────────
